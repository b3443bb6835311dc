use ipnet::{IpNet, Ipv4Net};
use log::{debug, warn};
use thiserror::Error;

/// Announced IPv4 prefixes shorter than this are split into subnets of this size,
/// so that every sampled prefix covers a comparable amount of address space.
pub const TARGET_PREFIX_LEN: u8 = 24;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedPrefixError {
    #[error("not a CIDR prefix: `{0}`")]
    Syntax(String),

    #[error("prefix `{given}` has host bits set, did you mean {network}?")]
    HostBitsSet { given: String, network: IpNet },
}

/// Parses a single announced prefix. Host bits must be zero, like a registry would publish it.
pub fn parse_prefix(raw: &str) -> Result<IpNet, MalformedPrefixError> {
    let net: IpNet = raw
        .trim()
        .parse()
        .map_err(|_| MalformedPrefixError::Syntax(raw.to_string()))?;
    if net.trunc() != net {
        return Err(MalformedPrefixError::HostBitsSet {
            given: raw.to_string(),
            network: net.trunc(),
        });
    }
    Ok(net)
}

/// Parses announced prefixes, dropping (and logging) any that are malformed.
pub fn parse_announced<S: AsRef<str>>(raw: &[S]) -> Vec<IpNet> {
    raw.iter()
        .filter_map(|it| match parse_prefix(it.as_ref()) {
            Ok(net) => Some(net),
            Err(e) => {
                warn!("Dropping announced prefix: {}", e);
                None
            }
        })
        .collect()
}

/**
Normalises prefixes to at least [TARGET_PREFIX_LEN]-sized subnets (see [reduce_to]).
 */
pub fn reduce(prefixes: &[IpNet]) -> Vec<Ipv4Net> {
    reduce_to(prefixes, TARGET_PREFIX_LEN)
}

/**
Drops all non-IPv4 prefixes, passes through prefixes that are at least as long as
`target_len`, and splits shorter ones into all of their `/target_len` subnets in
address order. A `target_len` beyond 32 is treated as 32.
 */
pub fn reduce_to(prefixes: &[IpNet], target_len: u8) -> Vec<Ipv4Net> {
    let target_len = target_len.min(32);
    let mut reduced = vec![];
    let mut skipped_v6 = 0usize;
    for prefix in prefixes {
        match prefix {
            IpNet::V4(net) if net.prefix_len() >= target_len => reduced.push(*net),
            IpNet::V4(net) => match net.subnets(target_len) {
                Ok(subnets) => reduced.extend(subnets),
                Err(_) => warn!("Cannot split {} into /{} subnets, skipping", net, target_len),
            },
            IpNet::V6(_) => skipped_v6 += 1,
        }
    }
    debug!(
        "Reduced {} prefixes to {} IPv4 /{}+ prefixes, skipped {} IPv6",
        prefixes.len(),
        reduced.len(),
        target_len,
        skipped_v6
    );
    reduced
}
