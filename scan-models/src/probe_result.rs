use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::AsPath;

/// Everything learned about a single sampled prefix: the liveness sweep and,
/// if anything answered, the trace towards one of the alive addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub prefix: Ipv4Net,
    pub alive_addr_count: u32,
    pub dead_addr_count: u32,
    pub min_rtt: f64,
    pub avg_rtt: f64,
    pub max_rtt: f64,
    pub alive_addrs: Vec<Ipv4Addr>,
    pub dead_addrs: Vec<Ipv4Addr>,
    /// Alive address that the trace was run against, if any was alive.
    pub sampled_addr: Option<Ipv4Addr>,
    pub as_path: AsPath,
    /// Average RTT of the last hop that reported a non-zero value.
    pub last_hop_rtt: f64,
}

impl ProbeResult {
    pub fn is_alive(&self) -> bool {
        self.alive_addr_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub prefix: Ipv4Net,
    pub message: String,
}

/// Outcome of probing one prefix. Kept in the same order as the prefixes that
/// were submitted, so that failures stay attributable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Completed(ProbeResult),
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn prefix(&self) -> Ipv4Net {
        match self {
            Self::Completed(result) => result.prefix,
            Self::Failed(failure) => failure.prefix,
        }
    }

    pub fn completed(&self) -> Option<&ProbeResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
