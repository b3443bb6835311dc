use std::collections::HashMap;
use std::net::Ipv4Addr;

use itertools::Itertools;
use log::debug;
use scan_models::{PathGroup, ProbeResult, RttSummary};
use thiserror::Error;

use crate::sample::SeededSampler;

pub mod stats;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("none of the {probed} probed prefixes had an alive address")]
    NoAliveResults { probed: usize },
}

/// Everything the report needs to know about the completed probes of one AS.
#[derive(Debug, Clone, PartialEq)]
pub struct AsSummary {
    pub alive_prefix_count: usize,
    pub dead_prefix_count: usize,
    pub rtt: RttSummary,
    /// Ordered by descending proportion, ties in the order they were first seen.
    pub groups: Vec<PathGroup>,
}

/// Groups the alive results by AS path and computes latency statistics.
///
/// Alive results whose trace resolved no AS count towards the AS-wide figures but join
/// no group. Proportions are shares of the grouped prefixes, so they add up to 100.
/// Each group reports a number of addresses proportional to its share of
/// `output_sample_count`.
pub fn aggregate<'a, I>(
    results: I,
    output_sample_count: usize,
    sampler: SeededSampler,
) -> Result<AsSummary, AggregateError>
where
    I: IntoIterator<Item = &'a ProbeResult>,
{
    let results: Vec<&ProbeResult> = results.into_iter().collect();
    let (alive, dead): (Vec<&ProbeResult>, Vec<&ProbeResult>) =
        results.iter().partition(|it| it.is_alive());
    if alive.is_empty() {
        return Err(AggregateError::NoAliveResults {
            probed: results.len(),
        });
    }

    let alive_rtts: Vec<f64> = alive.iter().map(|it| it.avg_rtt).collect();
    let by_path = group_by_path(&alive);
    let grouped: usize = by_path.iter().map(Vec::len).sum();
    let mut groups: Vec<PathGroup> = by_path
        .into_iter()
        .map(|members| summarise_group(members, grouped, output_sample_count, sampler))
        .collect();
    // stable, so equal proportions keep first-seen order
    groups.sort_by(|a, b| b.proportion.total_cmp(&a.proportion));
    debug!(
        "Aggregated {} alive ({} with a path) and {} dead prefixes into {} AS path groups",
        alive.len(),
        grouped,
        dead.len(),
        groups.len()
    );

    Ok(AsSummary {
        alive_prefix_count: alive.len(),
        dead_prefix_count: dead.len(),
        rtt: summarise_rtts(&alive_rtts),
        groups,
    })
}

/// Partitions by path key, keeping groups in first-seen order. Empty paths are left out.
fn group_by_path<'a>(alive: &[&'a ProbeResult]) -> Vec<Vec<&'a ProbeResult>> {
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<&ProbeResult>> = vec![];
    for &result in alive.iter().filter(|it| !it.as_path.is_empty()) {
        let idx = *index_by_key
            .entry(result.as_path.key())
            .or_insert_with(|| {
                groups.push(vec![]);
                groups.len() - 1
            });
        groups[idx].push(result);
    }
    groups
}

fn summarise_group(
    members: Vec<&ProbeResult>,
    total_grouped: usize,
    output_sample_count: usize,
    sampler: SeededSampler,
) -> PathGroup {
    let rtts: Vec<f64> = members.iter().map(|it| it.avg_rtt).collect();
    let sorted = stats::sorted(&rtts);
    let proportion = stats::round2(members.len() as f64 / total_grouped as f64 * 100.0);

    let addrs: Vec<Ipv4Addr> = members
        .iter()
        .flat_map(|it| it.alive_addrs.iter().copied())
        .unique()
        .collect();
    // halves go to even, so four quarters of 10 ask for 8 rather than 12
    let wanted = (output_sample_count as f64 * proportion / 100.0).round_ties_even() as usize;
    // clamped, so this can't run into an empty population
    let sampled_addrs = sampler
        .pick(&addrs, wanted.min(addrs.len()))
        .unwrap_or_default();

    PathGroup {
        as_path: members[0].as_path.key(),
        prefix_count: members.len(),
        proportion,
        avg_rtt: stats::round2(stats::mean(&rtts)),
        rtt_sd: stats::round2(stats::std_dev(&rtts)),
        p10_rtt: stats::percentile(&sorted, 0.1),
        p90_rtt: stats::percentile(&sorted, 0.9),
        member_rtts: rtts,
        sampled_addrs,
    }
}

fn summarise_rtts(rtts: &[f64]) -> RttSummary {
    let sorted = stats::sorted(rtts);
    RttSummary {
        avg_rtt: stats::round2(stats::mean(rtts)),
        rtt_sd: stats::round2(stats::std_dev(rtts)),
        p50_rtt: stats::percentile(&sorted, 0.5),
        p75_rtt: stats::percentile(&sorted, 0.75),
        p90_rtt: stats::percentile(&sorted, 0.9),
        p95_rtt: stats::percentile(&sorted, 0.95),
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;

    use super::*;
    use crate::test_utils::{alive_result, dead_result, v4addr};

    fn sampler() -> SeededSampler {
        SeededSampler::new(1680000000)
    }

    fn mixed_results() -> Vec<ProbeResult> {
        vec![
            alive_result("192.0.2.0/24", 10.0, &[64500, 64501], &["192.0.2.1", "192.0.2.2"]),
            alive_result("198.51.100.0/24", 30.0, &[64500, 64502], &["198.51.100.7"]),
            alive_result("203.0.113.0/24", 20.0, &[64500, 64501], &["203.0.113.9"]),
            dead_result("10.0.0.0/24"),
            alive_result("10.0.1.0/24", 40.0, &[64500, 64501], &["10.0.1.1"]),
        ]
    }

    #[test]
    fn groups_by_path_and_orders_by_proportion() -> Result<(), AggregateError> {
        // given
        let results = mixed_results();

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        assert_eq!(summary.alive_prefix_count, 4);
        assert_eq!(summary.dead_prefix_count, 1);
        assert_that!(summary.groups).has_length(2);
        let first = &summary.groups[0];
        assert_eq!(first.as_path, "64500 64501");
        assert_eq!(first.prefix_count, 3);
        assert_eq!(first.proportion, 75.0);
        assert_eq!(first.avg_rtt, 23.33);
        assert_eq!(first.p10_rtt, 10.0);
        assert_eq!(first.p90_rtt, 40.0);
        assert_eq!(first.member_rtts, vec![10.0, 20.0, 40.0]);
        assert_eq!(summary.groups[1].as_path, "64500 64502");
        assert_eq!(summary.groups[1].proportion, 25.0);
        Ok(())
    }

    #[test]
    fn proportions_sum_to_hundred() -> Result<(), AggregateError> {
        // given
        let results = vec![
            alive_result("192.0.2.0/24", 1.0, &[1, 2], &["192.0.2.1"]),
            alive_result("192.0.3.0/24", 1.0, &[1, 3], &["192.0.3.1"]),
            alive_result("192.0.4.0/24", 1.0, &[1, 4], &["192.0.4.1"]),
        ];

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        let sum: f64 = summary.groups.iter().map(|it| it.proportion).sum();
        assert!((sum - 100.0).abs() <= 0.01 * summary.groups.len() as f64, "sum was {}", sum);
        Ok(())
    }

    #[test]
    fn equal_proportions_keep_first_seen_order() -> Result<(), AggregateError> {
        // given
        let results = vec![
            alive_result("192.0.2.0/24", 1.0, &[3], &["192.0.2.1"]),
            alive_result("192.0.3.0/24", 1.0, &[1], &["192.0.3.1"]),
            alive_result("192.0.4.0/24", 1.0, &[2], &["192.0.4.1"]),
        ];

        // when
        let summary = aggregate(&results, 0, sampler())?;

        // then
        let order: Vec<&str> = summary.groups.iter().map(|it| it.as_path.as_str()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);
        Ok(())
    }

    #[test]
    fn pathless_alive_counts_but_proportions_stay_whole() -> Result<(), AggregateError> {
        // given
        let results = vec![
            alive_result("192.0.2.0/24", 10.0, &[1], &["192.0.2.1"]),
            alive_result("192.0.3.0/24", 30.0, &[], &["192.0.3.1"]),
            alive_result("192.0.4.0/24", 50.0, &[2], &["192.0.4.1"]),
            alive_result("192.0.5.0/24", 70.0, &[1], &["192.0.5.1"]),
        ];

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        assert_eq!(summary.alive_prefix_count, 4);
        assert_eq!(summary.rtt.avg_rtt, 40.0);
        assert_that!(summary.groups).has_length(2);
        assert_eq!(summary.groups[0].as_path, "1");
        assert_eq!(summary.groups[0].proportion, 66.67);
        assert_eq!(summary.groups[1].as_path, "2");
        assert_eq!(summary.groups[1].proportion, 33.33);
        let sum: f64 = summary.groups.iter().map(|it| it.proportion).sum();
        assert!((sum - 100.0).abs() <= 0.02, "sum was {}", sum);
        Ok(())
    }

    #[test]
    fn only_pathless_alive_gives_no_groups() -> Result<(), AggregateError> {
        // given
        let results = vec![
            alive_result("192.0.2.0/24", 10.0, &[], &["192.0.2.1"]),
            dead_result("192.0.3.0/24"),
        ];

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        assert_eq!(summary.alive_prefix_count, 1);
        assert_eq!(summary.rtt.avg_rtt, 10.0);
        assert_that!(summary.groups).is_empty();
        Ok(())
    }

    #[test]
    fn sampled_addrs_proportional_and_clamped() -> Result<(), AggregateError> {
        // given
        let results = mixed_results();

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        // 75% of 10 rounds to 8, but the group only has 4 distinct addresses
        let first = &summary.groups[0];
        assert_that!(first.sampled_addrs).contains_exactly(vec![
            v4addr("192.0.2.1"),
            v4addr("192.0.2.2"),
            v4addr("203.0.113.9"),
            v4addr("10.0.1.1"),
        ]);
        // 25% of 10 rounds to 2, clamped to the single address
        assert_eq!(summary.groups[1].sampled_addrs, vec![v4addr("198.51.100.7")]);
        Ok(())
    }

    #[test]
    fn quarter_shares_round_half_to_even() -> Result<(), AggregateError> {
        // given
        let results: Vec<ProbeResult> = (0..4)
            .map(|idx| {
                let prefix = format!("10.0.{}.0/24", idx);
                let addrs: Vec<String> = (1..=5).map(|host| format!("10.0.{}.{}", idx, host)).collect();
                let addr_refs: Vec<&str> = addrs.iter().map(String::as_str).collect();
                alive_result(&prefix, 5.0, &[64500 + idx], &addr_refs)
            })
            .collect();

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        assert_that!(summary.groups).has_length(4);
        for group in &summary.groups {
            assert_eq!(group.proportion, 25.0);
            assert_that!(group.sampled_addrs).has_length(2);
        }
        let total: usize = summary.groups.iter().map(|it| it.sampled_addrs.len()).sum();
        assert_eq!(total, 8);
        Ok(())
    }

    #[test]
    fn sampled_addrs_reproducible() -> Result<(), AggregateError> {
        // given
        let results: Vec<ProbeResult> = (0..4)
            .map(|idx| {
                let prefix = format!("10.0.{}.0/24", idx);
                let addrs: Vec<String> = (1..=20).map(|host| format!("10.0.{}.{}", idx, host)).collect();
                let addr_refs: Vec<&str> = addrs.iter().map(String::as_str).collect();
                alive_result(&prefix, 5.0, &[64500], &addr_refs)
            })
            .collect();

        // when
        let first = aggregate(&results, 10, sampler())?;
        let second = aggregate(&results, 10, sampler())?;

        // then
        assert_that!(first.groups[0].sampled_addrs).has_length(10);
        assert_eq!(first.groups[0].sampled_addrs, second.groups[0].sampled_addrs);
        Ok(())
    }

    #[test]
    fn overall_percentiles() -> Result<(), AggregateError> {
        // given
        let results = mixed_results();

        // when
        let summary = aggregate(&results, 10, sampler())?;

        // then
        assert_eq!(summary.rtt.avg_rtt, 25.0);
        assert_eq!(summary.rtt.p50_rtt, 20.0);
        assert_eq!(summary.rtt.p75_rtt, 30.0);
        assert_eq!(summary.rtt.p90_rtt, 40.0);
        assert_eq!(summary.rtt.p95_rtt, 40.0);
        Ok(())
    }

    #[test]
    fn no_alive_results() {
        // given
        let results = vec![dead_result("192.0.2.0/24"), dead_result("192.0.3.0/24")];

        // when
        let summary = aggregate(&results, 10, sampler());

        // then
        assert_eq!(summary, Err(AggregateError::NoAliveResults { probed: 2 }));
    }

    #[test]
    fn nothing_probed() {
        let results: Vec<ProbeResult> = vec![];

        let summary = aggregate(&results, 10, sampler());

        assert_eq!(summary, Err(AggregateError::NoAliveResults { probed: 0 }));
    }
}
