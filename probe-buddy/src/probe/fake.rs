use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use ipnet::Ipv4Net;

use crate::fping_call::SweepSummary;
use crate::mtr_call::Hop;

use super::ProbeTools;

/// Answers sweeps and traces without running anything. Every prefix has its first
/// host alive, with the third octet as average RTT, unless configured otherwise.
#[derive(Default)]
pub struct FakeTools {
    failing: HashSet<Ipv4Net>,
    dead: HashSet<Ipv4Net>,
    failing_trace: bool,
    path: Vec<u32>,
    delay: Duration,
    slow: HashMap<Ipv4Net, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
    traced: Mutex<Vec<Ipv4Addr>>,
}

impl FakeTools {
    pub const HOP_RTT: f64 = 7.5;

    pub fn new() -> Self {
        Self {
            path: vec![64500],
            ..Default::default()
        }
    }

    pub fn failing(mut self, net: Ipv4Net) -> Self {
        self.failing.insert(net);
        self
    }

    pub fn dead(mut self, net: Ipv4Net) -> Self {
        self.dead.insert(net);
        self
    }

    pub fn failing_trace(mut self) -> Self {
        self.failing_trace = true;
        self
    }

    pub fn with_path(mut self, path: Vec<u32>) -> Self {
        self.path = path;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sweeps of `net` take `delay` instead of the common one.
    pub fn slow(mut self, net: Ipv4Net, delay: Duration) -> Self {
        self.slow.insert(net, delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Sweeps that ran to the end, as opposed to being dropped halfway.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn traced(&self) -> Vec<Ipv4Addr> {
        self.traced.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl ProbeTools for FakeTools {
    async fn sweep(&self, net: Ipv4Net) -> Result<SweepSummary> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.slow.get(&net).copied().unwrap_or(self.delay);
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&net) {
            bail!("fping exited with status 2");
        }
        let first_host = Ipv4Addr::from(u32::from(net.network()) + 1);
        if self.dead.contains(&net) {
            return Ok(SweepSummary {
                dead_addrs: vec![first_host],
                unreachable_count: 256,
                ..Default::default()
            });
        }
        let rtt = net.network().octets()[2] as f64;
        Ok(SweepSummary {
            alive_addrs: vec![first_host],
            alive_count: 1,
            unreachable_count: 255,
            min_rtt: rtt,
            avg_rtt: rtt,
            max_rtt: rtt,
            ..Default::default()
        })
    }

    async fn trace(&self, addr: Ipv4Addr) -> Result<Vec<Hop>> {
        if self.failing_trace {
            bail!("mtr exited with status 1");
        }
        self.traced.lock().expect("poisoned").push(addr);
        let mut hops: Vec<Hop> = self
            .path
            .iter()
            .map(|asn| Hop {
                asn: Some(*asn),
                avg_rtt: Self::HOP_RTT,
            })
            .collect();
        hops.push(Hop { asn: None, avg_rtt: 0.0 });
        Ok(hops)
    }
}
