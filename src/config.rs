//! Configuration types for cutout-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Sector;

/// Fetch behavior configuration (output location, cutout size, deadlines)
///
/// Groups settings related to how cutouts are fetched and stored.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Output directory for cutout artifacts (default: "./cutouts")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Cutout side length in pixels (default: 50)
    #[serde(default = "default_cutout_size")]
    pub cutout_size: u32,

    /// Observing sector to fetch from (default: sector 55)
    #[serde(default = "default_sector")]
    pub sector: Sector,

    /// Per-item fetch deadline (default: 120s)
    ///
    /// A remote fetch that exceeds this deadline fails that item with a
    /// timeout error instead of blocking its worker indefinitely.
    #[serde(default = "default_item_timeout")]
    pub item_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cutout_size: default_cutout_size(),
            sector: default_sector(),
            item_timeout: default_item_timeout(),
        }
    }
}

/// Remote endpoint configuration
///
/// All endpoints are overridable so tests can point the library at a local
/// mock server instead of the real archive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the sector lookup service (default: MAST TESScut sector endpoint)
    #[serde(default = "default_lookup_base_url")]
    pub lookup_base_url: String,

    /// Base URL of the conventional cutout web API (default: MAST TESScut astrocut endpoint)
    #[serde(default = "default_cutout_api_base_url")]
    pub cutout_api_base_url: String,

    /// Base URL of the cloud store holding pre-built cutout cubes
    /// (default: the public mission bucket over HTTPS)
    #[serde(default = "default_cube_store_base_url")]
    pub cube_store_base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            lookup_base_url: default_lookup_base_url(),
            cutout_api_base_url: default_cutout_api_base_url(),
            cube_store_base_url: default_cube_store_base_url(),
        }
    }
}

/// Retry behavior for transient fetch failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts after the initial try (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 500ms)
    #[serde(default = "default_initial_delay")]
    pub initial_delay: Duration,

    /// Upper bound on any single retry delay (default: 30s)
    #[serde(default = "default_max_delay")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays to prevent thundering herd (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for the cutout fetcher
///
/// Fields are organized into logical sub-configs:
/// - [`fetch`](FetchConfig) — output directory, cutout size, sector, deadlines
/// - [`endpoints`](EndpointConfig) — remote service base URLs
/// - [`retry`](RetryConfig) — transient failure handling
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch behavior settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Remote endpoint settings
    #[serde(flatten)]
    pub endpoints: EndpointConfig,

    /// Retry settings for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Worker count for parallel dispatch (default: detected parallelism)
    ///
    /// `None` defers to [`Config::effective_workers`], which reads available
    /// parallelism from the execution environment. Set an explicit value to
    /// make dispatch deterministic across machines.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Config {
    /// Worker count to dispatch with
    ///
    /// Detection happens only here, at the outermost entry point; everything
    /// below the config takes an explicit count.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.fetch.cutout_size == 0 {
            return Err(Error::Config {
                message: "cutout size must be at least 1 pixel".to_string(),
                key: Some("cutout_size".to_string()),
            });
        }
        if self.workers == Some(0) {
            return Err(Error::Config {
                message: "worker count must be at least 1".to_string(),
                key: Some("workers".to_string()),
            });
        }
        if self.fetch.item_timeout.is_zero() {
            return Err(Error::Config {
                message: "per-item timeout must be non-zero".to_string(),
                key: Some("item_timeout".to_string()),
            });
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./cutouts")
}

fn default_cutout_size() -> u32 {
    50
}

fn default_sector() -> Sector {
    Sector::new(55)
}

fn default_item_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_lookup_base_url() -> String {
    "https://mast.stsci.edu/tesscut/api/v0.1".to_string()
}

fn default_cutout_api_base_url() -> String {
    "https://mast.stsci.edu/tesscut/api/v0.1".to_string()
}

fn default_cube_store_base_url() -> String {
    "https://stpubdata.s3.amazonaws.com".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}
