use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Ranking {
    Plain(Vec<Entry>),
    Wrapped {
        #[serde(alias = "data")]
        #[serde(rename = "Data")]
        entries: Vec<Entry>,
    },
}

#[derive(Deserialize, Debug)]
struct Entry {
    #[serde(rename = "Rank")]
    rank: u32,
    #[serde(rename = "AS")]
    asn: u32,
}

/// Parses an APNIC labs AS population ranking and takes the `count` best ranked ASNs.
pub fn top_asns(body: &str, count: usize) -> Result<Vec<u32>> {
    let ranking: Ranking = serde_json::from_str(body).context("unexpected AS population ranking")?;
    let entries = match ranking {
        Ranking::Plain(entries) => entries,
        Ranking::Wrapped { entries } => entries,
    };
    Ok(entries
        .into_iter()
        .sorted_by_key(|it| it.rank)
        .map(|it| it.asn)
        .unique()
        .take(count)
        .collect())
}
