use anyhow::{Context, Result};
use scan_models::AsPath;
use serde::Deserialize;

/// One line of the trace. `asn` is [None] if mtr couldn't tell (`AS???`).
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub asn: Option<u32>,
    pub avg_rtt: f64,
}

#[derive(Deserialize)]
struct RawTrace {
    report: RawReport,
}

#[derive(Deserialize)]
struct RawReport {
    #[serde(default)]
    hubs: Vec<RawHub>,
}

#[derive(Deserialize)]
struct RawHub {
    #[serde(rename = "ASN", default)]
    asn: Option<String>,
    #[serde(rename = "Avg", default)]
    avg: f64,
}

/// Parses the output of `mtr --json -z`.
pub fn parse_trace_report(raw: &str) -> Result<Vec<Hop>> {
    let parsed: RawTrace = serde_json::from_str(raw).context("mtr output is not a JSON report")?;
    Ok(parsed
        .report
        .hubs
        .into_iter()
        .map(|hub| Hop {
            asn: hub.asn.as_deref().and_then(parse_asn),
            avg_rtt: hub.avg,
        })
        .collect())
}

fn parse_asn(raw: &str) -> Option<u32> {
    raw.trim().strip_prefix("AS")?.parse().ok()
}

/// ASNs of the hops in order, without unknown hops and consecutive repeats.
pub fn as_path_of(hops: &[Hop]) -> AsPath {
    AsPath::collapsed_from(hops.iter().filter_map(|it| it.asn))
}

/// Average RTT of the last hop that reported a non-zero average, zero if none did.
pub fn last_hop_rtt(hops: &[Hop]) -> f64 {
    hops.iter()
        .rev()
        .map(|it| it.avg_rtt)
        .find(|rtt| *rtt != 0.0)
        .unwrap_or(0.0)
}
