use ipnet::Ipv4Net;
use thiserror::Error;

/// A single prefix could not be probed. Depending on the failure policy, this either
/// aborts the whole scan or is recorded for that prefix only.
#[derive(Error, Debug)]
#[error("probing prefix {prefix} failed")]
pub struct ProbeExecutionError {
    pub prefix: Ipv4Net,
    #[source]
    pub source: anyhow::Error,
}

impl ProbeExecutionError {
    pub fn new(prefix: Ipv4Net, source: anyhow::Error) -> Self {
        Self { prefix, source }
    }
}

#[derive(Error, Debug)]
pub enum ScanAbortedError {
    #[error("scan aborted because prefix {} could not be probed", .0.prefix)]
    ProbeFailed(#[source] ProbeExecutionError),

    #[error("scan interrupted by stop signal")]
    Interrupted,
}

/// Conditions that end the whole session without a report.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to get prefix list for AS{asn}")]
    RegistryFetch {
        asn: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to get top ASNs for country {country}")]
    CountryLookup {
        country: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("scan task failed for AS{asn}")]
    Aborted {
        asn: u32,
        #[source]
        source: ScanAbortedError,
    },

    #[error("no alive prefixes found for AS{asn}")]
    NoAliveResults { asn: u32 },
}
