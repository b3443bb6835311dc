use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use scan_models::{AsPath, ProbeResult};

pub fn v4net(input: &str) -> Ipv4Net {
    input.parse().expect(input)
}

pub fn v4addr(input: &str) -> Ipv4Addr {
    input.parse().expect(input)
}

/// A prefix where `alive` answered with the given average RTT and was traced over `path`.
pub fn alive_result(prefix: &str, avg_rtt: f64, path: &[u32], alive: &[&str]) -> ProbeResult {
    let alive_addrs: Vec<Ipv4Addr> = alive.iter().map(|it| v4addr(it)).collect();
    ProbeResult {
        prefix: v4net(prefix),
        alive_addr_count: alive_addrs.len() as u32,
        dead_addr_count: 256 - alive_addrs.len() as u32,
        min_rtt: avg_rtt,
        avg_rtt,
        max_rtt: avg_rtt,
        sampled_addr: alive_addrs.first().copied(),
        alive_addrs,
        dead_addrs: vec![],
        as_path: AsPath::collapsed_from(path.iter().copied()),
        last_hop_rtt: avg_rtt,
    }
}

/// A prefix where nothing answered the sweep.
pub fn dead_result(prefix: &str) -> ProbeResult {
    ProbeResult {
        prefix: v4net(prefix),
        alive_addr_count: 0,
        dead_addr_count: 256,
        min_rtt: 0.0,
        avg_rtt: 0.0,
        max_rtt: 0.0,
        alive_addrs: vec![],
        dead_addrs: vec![],
        sampled_addr: None,
        as_path: AsPath::empty(),
        last_hop_rtt: 0.0,
    }
}
