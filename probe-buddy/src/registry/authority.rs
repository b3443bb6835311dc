use strum::{Display, EnumString};

/// Regional registries whose whois records we know how to read the AS name from.
#[derive(EnumString, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Authority {
    Ripe,
    Arin,
    Apnic,
    Lacnic,
}

/// Whois record key that holds the AS name, per registry.
const NAME_KEYS: &[(Authority, &str)] = &[
    (Authority::Ripe, "as-name"),
    (Authority::Arin, "ASName"),
    (Authority::Apnic, "descr"),
    (Authority::Lacnic, "owner"),
];

impl Authority {
    pub fn name_key(self) -> &'static str {
        NAME_KEYS
            .iter()
            .find(|(authority, _)| *authority == self)
            .map(|(_, key)| *key)
            .unwrap_or_default()
    }
}
