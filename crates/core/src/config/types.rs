use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::cache::CacheOptions;
use crate::fetcher::{FetchOptions, SweepPolicy};

/// Root configuration. Every section has sensible defaults, so an absent
/// or empty config file yields a working service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    10000
}

/// Cache capacities and TTLs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Max cached search result sets.
    #[serde(default = "default_image_capacity")]
    pub image_capacity: usize,
    #[serde(default = "default_image_ttl_secs")]
    pub image_ttl_secs: u64,
    /// Max cached tag resolutions.
    #[serde(default = "default_tag_capacity")]
    pub tag_capacity: usize,
    #[serde(default = "default_tag_ttl_secs")]
    pub tag_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            image_capacity: default_image_capacity(),
            image_ttl_secs: default_image_ttl_secs(),
            tag_capacity: default_tag_capacity(),
            tag_ttl_secs: default_tag_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn to_options(&self) -> CacheOptions {
        CacheOptions {
            image_capacity: self.image_capacity,
            image_ttl: Duration::from_secs(self.image_ttl_secs),
            tag_capacity: self.tag_capacity,
            tag_ttl: Duration::from_secs(self.tag_ttl_secs),
        }
    }
}

fn default_image_capacity() -> usize {
    500
}

fn default_image_ttl_secs() -> u64 {
    2 * 60 * 60
}

fn default_tag_capacity() -> usize {
    1000
}

fn default_tag_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Fetch scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Images requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Hard upper bound on pages per source.
    #[serde(default = "default_global_page_cap")]
    pub global_page_cap: u32,
    /// Per-page request timeout in seconds.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
    /// Page traversal strategy.
    #[serde(default)]
    pub sweep: SweepPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            global_page_cap: default_global_page_cap(),
            page_timeout_secs: default_page_timeout_secs(),
            sweep: SweepPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn to_options(&self) -> FetchOptions {
        FetchOptions {
            policy: self.sweep,
            page_size: self.page_size,
            global_page_cap: self.global_page_cap,
            page_timeout: Duration::from_secs(self.page_timeout_secs),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_global_page_cap() -> u32 {
    200
}

fn default_page_timeout_secs() -> u64 {
    5
}

/// Tag resolver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Per-probe request timeout in seconds. Probes are cheaper and more
    /// numerous than page fetches, so they get a shorter budget.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_probe_timeout_secs() -> u64 {
    3
}
