use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProbeOutcome;

/// Alive prefixes that were reached over the same AS path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGroup {
    pub as_path: String,
    pub prefix_count: usize,
    /// Share of the alive prefixes with a known AS path, in percent (two decimals).
    pub proportion: f64,
    pub avg_rtt: f64,
    pub rtt_sd: f64,
    pub p10_rtt: f64,
    pub p90_rtt: f64,
    /// Average RTTs of the member prefixes, in the order they were probed.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub member_rtts: Vec<f64>,
    /// Addresses picked for the report, proportional to the group's share.
    pub sampled_addrs: Vec<Ipv4Addr>,
}

/// Latency distribution over the average RTTs of all alive prefixes of an AS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RttSummary {
    pub avg_rtt: f64,
    pub rtt_sd: f64,
    pub p50_rtt: f64,
    pub p75_rtt: f64,
    pub p90_rtt: f64,
    pub p95_rtt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsReport {
    pub asn: u32,
    pub as_name: String,
    pub announced_prefix_count: usize,
    pub sampled_prefix_count: usize,
    pub alive_prefix_count: usize,
    pub dead_prefix_count: usize,
    pub failed_prefix_count: usize,
    #[serde(flatten)]
    pub rtt: RttSummary,
    pub as_path_groups: Vec<PathGroup>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefix_results: Option<Vec<ProbeOutcome>>,
}

/// One invocation, possibly covering multiple ASNs that are scanned one after another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSession {
    pub asns: Vec<u32>,
    pub sample_count: usize,
    pub max_parallel: usize,
    pub output_sample_count: usize,
    pub detail: bool,
    pub failure_policy: String,
    pub random_seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<AsReport>,
}

impl ScanSession {
    pub fn push(&mut self, report: AsReport) {
        self.results.push(report);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

/// Printed instead of a report when the session cannot complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub status: String,
    pub message: String,
}

impl FailureReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;
    use serde_json::Value;

    use super::*;

    fn report(prefix_results: Option<Vec<ProbeOutcome>>) -> AsReport {
        AsReport {
            asn: 64500,
            as_name: "EXAMPLE-AS".to_string(),
            announced_prefix_count: 4,
            sampled_prefix_count: 2,
            alive_prefix_count: 1,
            dead_prefix_count: 1,
            failed_prefix_count: 0,
            rtt: RttSummary {
                avg_rtt: 12.5,
                ..Default::default()
            },
            as_path_groups: vec![],
            prefix_results,
        }
    }

    #[test]
    fn rtt_summary_is_flattened() {
        // given
        let report = report(None);

        // when
        let json = serde_json::to_value(&report).unwrap();

        // then
        assert_eq!(json["avg_rtt"], Value::from(12.5));
        assert_that!(json.get("rtt")).is_none();
        assert_that!(json.get("prefix_results")).is_none();
    }

    #[test]
    fn prefix_results_only_in_detail() {
        // given
        let report = report(Some(vec![]));

        // when
        let json = serde_json::to_value(&report).unwrap();

        // then
        assert_eq!(json["prefix_results"], serde_json::json!([]));
    }

    #[test]
    fn session_finish_sets_end() {
        // given
        let session = ScanSession {
            asns: vec![64500],
            sample_count: 50,
            max_parallel: 20,
            output_sample_count: 10,
            detail: false,
            failure_policy: "tolerate-partial".to_string(),
            random_seed: 42,
            started_at: Utc::now(),
            finished_at: None,
            results: vec![],
        };

        // when
        let finished = session.finish();

        // then
        assert_that!(finished.finished_at).is_some();
        assert!(finished.finished_at.unwrap() >= finished.started_at);
    }

    #[test]
    fn failure_report_shape() {
        let json = serde_json::to_value(FailureReport::new("Scan task fail")).unwrap();

        assert_eq!(json, serde_json::json!({"status": "fail", "message": "Scan task fail"}));
    }
}
