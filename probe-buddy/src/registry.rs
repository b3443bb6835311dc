use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use log::debug;

mod aspop;
mod authority;
mod ripestat;

#[derive(Args, Clone, Debug)]
#[group(id = "registry")]
pub struct Params {
    /// Base URL of the RIPEstat data API
    #[arg(long, default_value = "https://stat.ripe.net/data", env = "RIPESTAT_URL")]
    ripestat_url: String,

    /// APNIC labs AS population endpoint, the country code is appended
    #[arg(
        long,
        default_value = "https://stats.labs.apnic.net/cgi-bin/aspop?f=j&c=",
        env = "ASPOP_URL"
    )]
    aspop_url: String,

    /// Timeout for each registry request
    #[arg(long, default_value = "30", env = "HTTP_TIMEOUT_SECS")]
    http_timeout_secs: u64,
}

impl Params {
    pub fn to_client(&self) -> Result<RegistryClient> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let client = RegistryClient {
            http,
            ripestat_url: self.ripestat_url.trim_end_matches('/').to_string(),
            aspop_url: self.aspop_url.clone(),
        };
        debug!("Using registry client: {:?}", client);
        Ok(client)
    }
}

/// Where announced prefixes and AS metadata come from.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Prefixes currently announced by `asn`, as the registry spells them.
    async fn announced_prefixes(&self, asn: u32) -> Result<Vec<String>>;

    /// Registered name of `asn`.
    async fn as_name(&self, asn: u32) -> Result<String>;

    /// The `count` ASNs serving the largest user population in `country`, largest first.
    async fn top_asns(&self, country: &str, count: usize) -> Result<Vec<u32>>;
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    ripestat_url: String,
    aspop_url: String,
}

#[async_trait]
impl Registry for RegistryClient {
    async fn announced_prefixes(&self, asn: u32) -> Result<Vec<String>> {
        let url = format!(
            "{}/announced-prefixes/data.json?resource=AS{}",
            self.ripestat_url, asn
        );
        let response: ripestat::AnnouncedPrefixes = self.get_json(&url).await?;
        Ok(response.into_prefixes())
    }

    async fn as_name(&self, asn: u32) -> Result<String> {
        let url = format!("{}/whois/data.json?resource=AS{}", self.ripestat_url, asn);
        let response: ripestat::Whois = self.get_json(&url).await?;
        response.as_name()
    }

    async fn top_asns(&self, country: &str, count: usize) -> Result<Vec<u32>> {
        let url = format!("{}{}", self.aspop_url, country.to_uppercase());
        let body = self.get_text(&url).await?;
        aspop::top_asns(&body, count)
    }
}

impl RegistryClient {
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        self.http
            .get(url)
            .send()
            .await
            .and_then(|it| it.error_for_status())
            .with_context(|| format!("request to {} failed", url))?
            .json()
            .await
            .with_context(|| format!("unexpected response from {}", url))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        self.http
            .get(url)
            .send()
            .await
            .and_then(|it| it.error_for_status())
            .with_context(|| format!("request to {} failed", url))?
            .text()
            .await
            .with_context(|| format!("unreadable response from {}", url))
    }
}
