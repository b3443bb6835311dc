use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use log::trace;
use regex::Regex;

/// What an `fping -s -q -c<n>` sweep over a prefix had to say.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    pub alive_addrs: Vec<Ipv4Addr>,
    pub dead_addrs: Vec<Ipv4Addr>,
    pub alive_count: u32,
    pub unreachable_count: u32,
    pub min_rtt: f64,
    pub avg_rtt: f64,
    pub max_rtt: f64,
}

impl SweepSummary {
    pub fn is_alive(&self) -> bool {
        !self.alive_addrs.is_empty()
    }
}

/// Parses the stderr report of fping in quiet statistics mode.
///
/// Per-address lines look like `192.0.2.1 : xmt/rcv/%loss = 5/5/0%, min/avg/max = 1.0/1.2/1.5`.
/// An address only counts as alive if its line carries the latency statistics.
/// The alive and unreachable counts must be present in the trailing statistics,
/// while missing round trip times are taken to be zero.
pub fn parse_sweep_report(raw: &str) -> Result<SweepSummary> {
    let addr_line = Regex::new(r"^(\S+)\s*:\s*xmt/rcv")?;
    let count_line = Regex::new(r"^\s*(\d+)\s+(alive|unreachable)\s*$")?;
    let rtt_line = Regex::new(r"^\s*([\d.]+)\s+ms\s+\((min|avg|max) round trip time\)")?;

    let mut summary = SweepSummary::default();
    let mut alive_count = None;
    let mut unreachable_count = None;

    for line in raw.lines() {
        if let Some(caps) = addr_line.captures(line) {
            let addr: Ipv4Addr = match caps[1].parse() {
                Ok(addr) => addr,
                Err(_) => {
                    trace!("Ignoring fping line for non-IPv4 target: {}", line);
                    continue;
                }
            };
            if line.contains("min/avg/max") {
                summary.alive_addrs.push(addr);
            } else {
                summary.dead_addrs.push(addr);
            }
        } else if let Some(caps) = count_line.captures(line) {
            let count: u32 = caps[1]
                .parse()
                .with_context(|| format!("count out of range: {}", line))?;
            match &caps[2] {
                "alive" => alive_count = Some(count),
                _ => unreachable_count = Some(count),
            }
        } else if let Some(caps) = rtt_line.captures(line) {
            let rtt: f64 = caps[1]
                .parse()
                .with_context(|| format!("malformed round trip time: {}", line))?;
            match &caps[2] {
                "min" => summary.min_rtt = rtt,
                "avg" => summary.avg_rtt = rtt,
                _ => summary.max_rtt = rtt,
            }
        }
    }

    summary.alive_count = alive_count.context("fping statistics lack the alive count")?;
    summary.unreachable_count =
        unreachable_count.context("fping statistics lack the unreachable count")?;
    Ok(summary)
}
