use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Sequence of AS numbers that a trace passed through, in hop order.
/// Consecutive hops in the same AS are represented by a single entry.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AsPath(Vec<u32>);

impl AsPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collapses runs of the same ASN, e.g. `100 100 200 100` becomes `100 200 100`.
    pub fn collapsed_from<I: IntoIterator<Item = u32>>(asns: I) -> Self {
        Self(asns.into_iter().dedup().collect())
    }

    pub fn asns(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Grouping key, the ASNs joined by a single space. Empty for an empty path.
    pub fn key(&self) -> String {
        self.0.iter().join(" ")
    }
}

impl fmt::Display for AsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<Vec<u32>> for AsPath {
    fn from(value: Vec<u32>) -> Self {
        Self::collapsed_from(value)
    }
}
