use std::sync::Arc;

use anyhow::anyhow;
use as_ping::error::{ProbeExecutionError, ScanAbortedError};
use as_ping::sample::SeededSampler;
use clap::{Args, ValueEnum};
use ipnet::Ipv4Net;
use log::{debug, info, warn};
use scan_models::{ProbeFailure, ProbeOutcome, ProbeResult};
use strum::Display;
use tokio::select;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::probe::{self, ProbeTools};

#[derive(Args, Clone, Debug)]
#[group(id = "scheduler")]
pub struct Params {
    /// How many prefixes to probe at the same time at most
    #[arg(
        short = 'p',
        long,
        default_value = "20",
        env = "MAX_PARALLEL",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_parallel: usize,

    /// What to do if a prefix cannot be probed
    #[arg(long, value_enum, default_value_t = FailurePolicy::ToleratePartial, env = "FAILURE_POLICY")]
    pub failure_policy: FailurePolicy,
}

#[derive(ValueEnum, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole scan on the first failed probe, reporting nothing
    FailFast,
    /// Record the failure for that prefix and carry on with the others
    ToleratePartial,
}

enum TaskOutcome {
    Done(Result<ProbeResult, ProbeExecutionError>),
    Cancelled,
}

/// Probes all `prefixes` with at most [Params::max_parallel] probes in flight.
///
/// The outcomes are in the same order as `prefixes`. Under [FailurePolicy::FailFast], the
/// first failure cancels everything that is still waiting or running, and the scan is
/// aborted with the failure of the lowest index. Cancelling `stop` interrupts the scan
/// under either policy.
pub async fn probe_all(
    tools: Arc<dyn ProbeTools>,
    prefixes: &[Ipv4Net],
    sampler: SeededSampler,
    params: &Params,
    stop: &CancellationToken,
) -> Result<Vec<ProbeOutcome>, ScanAbortedError> {
    let permits = Arc::new(Semaphore::new(params.max_parallel));
    let abort = stop.child_token();
    debug!(
        "Probing {} prefixes, {} at a time, {}",
        prefixes.len(),
        params.max_parallel,
        params.failure_policy
    );

    let handles: Vec<_> = prefixes
        .iter()
        .map(|net| {
            tokio::spawn(run_one(
                Arc::clone(&tools),
                *net,
                sampler,
                Arc::clone(&permits),
                abort.clone(),
                params.failure_policy,
            ))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (handle, net) in handles.into_iter().zip(prefixes) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                warn!("Probe task for {} did not finish: {}", net, join_err);
                if params.failure_policy == FailurePolicy::FailFast {
                    abort.cancel();
                }
                TaskOutcome::Done(Err(ProbeExecutionError::new(*net, anyhow!(join_err))))
            }
        };
        outcomes.push(outcome);
    }

    if stop.is_cancelled() {
        info!("Stop requested, discarding {} probe outcomes", outcomes.len());
        return Err(ScanAbortedError::Interrupted);
    }
    match params.failure_policy {
        FailurePolicy::FailFast => fail_fast(outcomes),
        FailurePolicy::ToleratePartial => Ok(tolerate_partial(outcomes, prefixes)),
    }
}

async fn run_one(
    tools: Arc<dyn ProbeTools>,
    net: Ipv4Net,
    sampler: SeededSampler,
    permits: Arc<Semaphore>,
    abort: CancellationToken,
    policy: FailurePolicy,
) -> TaskOutcome {
    let _permit = select! {
        biased;
        _ = abort.cancelled() => return TaskOutcome::Cancelled,
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return TaskOutcome::Cancelled, // closed
        },
    };

    let result = select! {
        biased;
        _ = abort.cancelled() => return TaskOutcome::Cancelled,
        result = probe::probe_prefix(tools.as_ref(), net, sampler) => result,
    };
    if let Err(e) = &result {
        warn!("{}: {:#}", e, e.source);
        if policy == FailurePolicy::FailFast {
            // while still holding the permit, so nobody waiting gets to start
            abort.cancel();
        }
    }
    TaskOutcome::Done(result)
}

fn fail_fast(outcomes: Vec<TaskOutcome>) -> Result<Vec<ProbeOutcome>, ScanAbortedError> {
    let mut completed = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Done(Ok(result)) => completed.push(ProbeOutcome::Completed(result)),
            TaskOutcome::Done(Err(e)) => return Err(ScanAbortedError::ProbeFailed(e)),
            TaskOutcome::Cancelled => {}
        }
    }
    Ok(completed)
}

fn tolerate_partial(outcomes: Vec<TaskOutcome>, prefixes: &[Ipv4Net]) -> Vec<ProbeOutcome> {
    outcomes
        .into_iter()
        .zip(prefixes)
        .map(|(outcome, net)| match outcome {
            TaskOutcome::Done(Ok(result)) => ProbeOutcome::Completed(result),
            TaskOutcome::Done(Err(e)) => ProbeOutcome::Failed(ProbeFailure {
                prefix: e.prefix,
                message: format!("{:#}", e.source),
            }),
            TaskOutcome::Cancelled => ProbeOutcome::Failed(ProbeFailure {
                prefix: *net,
                message: "probe was cancelled".to_string(),
            }),
        })
        .collect()
}
