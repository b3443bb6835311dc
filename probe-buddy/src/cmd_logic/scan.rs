use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use as_ping::aggregate::{self, AggregateError};
use as_ping::error::ScanError;
use as_ping::helpers::stop;
use as_ping::prefix_reduce;
use as_ping::sample::SeededSampler;
use chrono::Utc;
use clap::Args;
use futures::executor;
use log::{info, warn};
use scan_models::{AsReport, ProbeResult, ScanSession};
use tokio_util::sync::CancellationToken;

use crate::probe::{ProbeTools, SystemTools};
use crate::registry::{self, Registry};
use crate::schedule;
use crate::{fping_call, mtr_call};

#[derive(Args)]
pub struct Params {
    /// AS number to scan, may be given multiple times
    #[arg(
        short = 'a',
        long = "asn",
        required_unless_present = "country",
        conflicts_with = "country"
    )]
    asns: Vec<u32>,

    /// Scan the ASes with the largest user population in this country (ISO code) instead
    #[arg(short = 'c', long)]
    country: Option<String>,

    /// How many ASes to scan in country mode
    #[arg(long, default_value = "10", env = "TOP_ASN_COUNT")]
    top_asn_count: usize,

    /// How many of the announced /24 prefixes to probe per AS
    #[arg(short = 's', long = "sample", default_value = "50", env = "SAMPLE_COUNT")]
    sample_count: usize,

    /// How many addresses to report per AS, spread over the AS paths
    #[arg(short = 'o', long = "output-sample", default_value = "10", env = "OUTPUT_SAMPLE_COUNT")]
    output_sample_count: usize,

    /// Include every probed prefix and the RTTs of each path group in the report
    #[arg(short = 'd', long)]
    detail: bool,

    /// Seed for all random selections, defaults to the current unix time
    #[arg(long, env = "RANDOM_SEED")]
    random_seed: Option<u64>,

    #[clap(flatten)]
    scheduler: schedule::Params,

    #[clap(flatten)]
    fping: fping_call::Params,

    #[clap(flatten)]
    mtr: mtr_call::Params,

    #[clap(flatten)]
    registry: registry::Params,
}

pub fn seed_from_clock() -> u64 {
    Utc::now().timestamp().unsigned_abs()
}

pub fn handle(params: Params) -> Result<()> {
    let sig_handler = stop::new();
    let stop_rx = sig_handler.subscribe_stop();
    tokio::spawn(sig_handler.wait_for_signal());

    let orchestrator = Orchestrator {
        registry: Arc::new(params.registry.to_client()?),
        tools: Arc::new(SystemTools::new(&params.fping, &params.mtr)),
        settings: Settings {
            sample_count: params.sample_count,
            output_sample_count: params.output_sample_count,
            detail: params.detail,
            sampler: SeededSampler::new(params.random_seed.unwrap_or_else(seed_from_clock)),
            scheduler: params.scheduler,
        },
        stop: stop_rx,
    };
    let asns = params.asns;
    let country = params.country;
    let top_asn_count = params.top_asn_count;

    let handle = tokio::spawn(async move {
        let asns = orchestrator
            .resolve_asns(asns, country.as_deref(), top_asn_count)
            .await?;
        Ok::<_, anyhow::Error>(orchestrator.run(asns).await?)
    });
    let session = executor::block_on(stop::flatten(handle))?;

    let json = serde_json::to_string_pretty(&session).context("Unable to render scan report")?;
    println!("{}", json);
    Ok(())
}

pub struct Settings {
    pub sample_count: usize,
    pub output_sample_count: usize,
    pub detail: bool,
    pub sampler: SeededSampler,
    pub scheduler: schedule::Params,
}

/// Scans ASes one after another: fetch, reduce, sample, probe, aggregate, name.
pub struct Orchestrator {
    pub registry: Arc<dyn Registry>,
    pub tools: Arc<dyn ProbeTools>,
    pub settings: Settings,
    pub stop: CancellationToken,
}

impl Orchestrator {
    /// The given ASNs, or the top ASNs of `country` if there is one.
    pub async fn resolve_asns(
        &self,
        asns: Vec<u32>,
        country: Option<&str>,
        top_asn_count: usize,
    ) -> Result<Vec<u32>, ScanError> {
        let country = match country {
            Some(it) => it,
            None => return Ok(asns),
        };
        let top = self
            .registry
            .top_asns(country, top_asn_count)
            .await
            .map_err(|source| ScanError::CountryLookup {
                country: country.to_string(),
                source,
            })?;
        if top.is_empty() {
            return Err(ScanError::CountryLookup {
                country: country.to_string(),
                source: anyhow!("no ASes are ranked for this country"),
            });
        }
        info!("Top {} ASes of {}: {:?}", top.len(), country, top);
        Ok(top)
    }

    /// Scans all `asns` in order. The first AS that cannot be scanned ends the session.
    pub async fn run(&self, asns: Vec<u32>) -> Result<ScanSession, ScanError> {
        let mut session = ScanSession {
            asns: asns.clone(),
            sample_count: self.settings.sample_count,
            max_parallel: self.settings.scheduler.max_parallel,
            output_sample_count: self.settings.output_sample_count,
            detail: self.settings.detail,
            failure_policy: self.settings.scheduler.failure_policy.to_string(),
            random_seed: self.settings.sampler.seed(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::with_capacity(asns.len()),
        };
        for asn in asns {
            session.push(self.scan_as(asn).await?);
        }
        Ok(session.finish())
    }

    async fn scan_as(&self, asn: u32) -> Result<AsReport, ScanError> {
        let settings = &self.settings;
        let raw = self
            .registry
            .announced_prefixes(asn)
            .await
            .map_err(|source| ScanError::RegistryFetch { asn, source })?;
        let reduced = prefix_reduce::reduce(&prefix_reduce::parse_announced(&raw));
        let sample_count = settings.sample_count.min(reduced.len());
        // clamped, so this can't run into an empty population
        let sampled = settings
            .sampler
            .pick(&reduced, sample_count)
            .unwrap_or_default();
        info!(
            "AS{}: {} announced, {} after reduction, probing {}",
            asn,
            raw.len(),
            reduced.len(),
            sampled.len()
        );

        let outcomes = schedule::probe_all(
            Arc::clone(&self.tools),
            &sampled,
            settings.sampler,
            &settings.scheduler,
            &self.stop,
        )
        .await
        .map_err(|source| ScanError::Aborted { asn, source })?;
        let completed: Vec<&ProbeResult> = outcomes.iter().filter_map(|it| it.completed()).collect();
        let failed_prefix_count = outcomes.len() - completed.len();

        let mut summary = aggregate::aggregate(completed, settings.output_sample_count, settings.sampler)
            .map_err(|AggregateError::NoAliveResults { probed }| {
                warn!("AS{}: nothing alive among {} probed prefixes", asn, probed);
                ScanError::NoAliveResults { asn }
            })?;
        if !settings.detail {
            summary.groups.iter_mut().for_each(|it| it.member_rtts.clear());
        }

        let as_name = self.registry.as_name(asn).await.unwrap_or_else(|e| {
            warn!("Unable to look up the name of AS{}, leaving it empty: {:#}", asn, e);
            String::new()
        });

        Ok(AsReport {
            asn,
            as_name,
            announced_prefix_count: reduced.len(),
            sampled_prefix_count: sampled.len(),
            alive_prefix_count: summary.alive_prefix_count,
            dead_prefix_count: summary.dead_prefix_count,
            failed_prefix_count,
            rtt: summary.rtt,
            as_path_groups: summary.groups,
            prefix_results: settings.detail.then_some(outcomes),
        })
    }
}
