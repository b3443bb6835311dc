use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use as_ping::error::ProbeExecutionError;
use as_ping::sample::SeededSampler;
use async_trait::async_trait;
use ipnet::Ipv4Net;
use log::{debug, trace};
use scan_models::{AsPath, ProbeResult};

use crate::fping_call::{self, SweepSummary};
use crate::mtr_call::{self, Hop};

#[cfg(test)]
pub mod fake;

/// The external tools a prefix probe needs. Implemented by [SystemTools] for real runs.
#[async_trait]
pub trait ProbeTools: Send + Sync {
    /// Liveness sweep over every address of `net`.
    async fn sweep(&self, net: Ipv4Net) -> Result<SweepSummary>;

    /// Hop-by-hop trace towards `addr`.
    async fn trace(&self, addr: Ipv4Addr) -> Result<Vec<Hop>>;
}

/// Calls the locally installed fping and mtr binaries.
#[derive(Debug, Clone)]
pub struct SystemTools {
    fping: fping_call::Caller,
    mtr: mtr_call::Caller,
}

impl SystemTools {
    pub fn new(fping: &fping_call::Params, mtr: &mtr_call::Params) -> Self {
        let tools = Self {
            fping: fping.to_caller(),
            mtr: mtr.to_caller(),
        };
        debug!("Using probe tools: {:?}", tools);
        tools
    }
}

#[async_trait]
impl ProbeTools for SystemTools {
    async fn sweep(&self, net: Ipv4Net) -> Result<SweepSummary> {
        self.fping.sweep(&net).await
    }

    async fn trace(&self, addr: Ipv4Addr) -> Result<Vec<Hop>> {
        self.mtr.trace(addr).await
    }
}

/// Sweeps `net` and, if anything answered, traces one alive address picked by `sampler`.
pub async fn probe_prefix(
    tools: &dyn ProbeTools,
    net: Ipv4Net,
    sampler: SeededSampler,
) -> Result<ProbeResult, ProbeExecutionError> {
    do_probe(tools, net, sampler)
        .await
        .map_err(|e| ProbeExecutionError::new(net, e))
}

async fn do_probe(tools: &dyn ProbeTools, net: Ipv4Net, sampler: SeededSampler) -> Result<ProbeResult> {
    let sweep = tools.sweep(net).await.context("liveness sweep failed")?;
    trace!(
        "Sweep of {}: {} alive, {} unreachable",
        net,
        sweep.alive_count,
        sweep.unreachable_count
    );

    let (sampled_addr, as_path, last_hop_rtt) = if sweep.is_alive() {
        let target = sampler.pick_one(&sweep.alive_addrs)?;
        let hops = tools
            .trace(target)
            .await
            .with_context(|| format!("path trace to {} failed", target))?;
        (Some(target), mtr_call::as_path_of(&hops), mtr_call::last_hop_rtt(&hops))
    } else {
        (None, AsPath::empty(), 0.0)
    };

    Ok(ProbeResult {
        prefix: net,
        alive_addr_count: sweep.alive_count,
        dead_addr_count: sweep.unreachable_count,
        min_rtt: sweep.min_rtt,
        avg_rtt: sweep.avg_rtt,
        max_rtt: sweep.max_rtt,
        alive_addrs: sweep.alive_addrs,
        dead_addrs: sweep.dead_addrs,
        sampled_addr,
        as_path,
        last_hop_rtt,
    })
}
