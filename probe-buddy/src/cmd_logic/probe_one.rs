use anyhow::{bail, Context, Result};
use as_ping::helpers::stop;
use as_ping::prefix_reduce;
use as_ping::sample::SeededSampler;
use clap::Args;
use futures::executor;
use ipnet::IpNet;
use log::info;

use crate::probe::{self, SystemTools};
use crate::{fping_call, mtr_call};

#[derive(Args)]
pub struct Params {
    #[clap(flatten)]
    fping: fping_call::Params,

    #[clap(flatten)]
    mtr: mtr_call::Params,

    /// Seed for picking the address to trace, defaults to the current unix time
    #[arg(long, env = "RANDOM_SEED")]
    random_seed: Option<u64>,

    /// IPv4 prefix to probe, e.g. 192.0.2.0/24
    prefix: String,
}

pub fn handle(params: Params) -> Result<()> {
    let net = match prefix_reduce::parse_prefix(&params.prefix)? {
        IpNet::V4(net) => net,
        IpNet::V6(net) => bail!("Only IPv4 prefixes can be probed, got {}", net),
    };
    let tools = SystemTools::new(&params.fping, &params.mtr);
    let sampler = SeededSampler::new(params.random_seed.unwrap_or_else(super::scan::seed_from_clock));
    info!("Probing {} with seed {}", net, sampler.seed());

    let handle = tokio::spawn(async move {
        probe::probe_prefix(&tools, net, sampler)
            .await
            .map_err(anyhow::Error::from)
    });
    let result = executor::block_on(stop::flatten(handle))?;

    let json = serde_json::to_string_pretty(&result).context("Unable to render probe result")?;
    println!("{}", json);
    Ok(())
}
