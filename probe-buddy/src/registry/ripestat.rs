use std::str::FromStr;

use anyhow::{bail, Result};
use log::trace;
use serde::Deserialize;

use super::authority::Authority;

/// `announced-prefixes` answer, reduced to what we need.
#[derive(Deserialize, Debug)]
pub struct AnnouncedPrefixes {
    data: AnnouncedData,
}

#[derive(Deserialize, Debug)]
struct AnnouncedData {
    #[serde(default)]
    prefixes: Vec<AnnouncedPrefix>,
}

#[derive(Deserialize, Debug)]
struct AnnouncedPrefix {
    prefix: String,
}

impl AnnouncedPrefixes {
    pub fn into_prefixes(self) -> Vec<String> {
        self.data.prefixes.into_iter().map(|it| it.prefix).collect()
    }
}

/// `whois` answer: the registries that know the resource, and their records.
#[derive(Deserialize, Debug)]
pub struct Whois {
    data: WhoisData,
}

#[derive(Deserialize, Debug)]
struct WhoisData {
    #[serde(default)]
    authorities: Vec<String>,
    #[serde(default)]
    records: Vec<Vec<WhoisEntry>>,
}

#[derive(Deserialize, Debug)]
struct WhoisEntry {
    key: String,
    value: String,
}

impl Whois {
    /// Value of the name key of the first listed authority that has one.
    pub fn as_name(&self) -> Result<String> {
        for raw in &self.data.authorities {
            let authority = match Authority::from_str(raw) {
                Ok(it) => it,
                Err(_) => {
                    trace!("No AS name convention known for authority {}", raw);
                    continue;
                }
            };
            let key = authority.name_key();
            let found = self
                .data
                .records
                .iter()
                .flatten()
                .find(|entry| entry.key == key);
            if let Some(entry) = found {
                return Ok(entry.value.clone());
            }
        }
        bail!(
            "no AS name in whois records for authorities {:?}",
            self.data.authorities
        )
    }
}
