//! Conventional cutout web API client
//!
//! The archive's cutout service takes a coordinate, a pixel size, and a
//! sector, and returns the cutout as an in-memory blob. The service does not
//! write files itself; [`ApiCutoutFetcher::fetch`] hands back the bytes and
//! [`CutoutFetcher::fetch_and_save`] persists them for callers that want the
//! artifact on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{CutoutFetcher, write_artifact};
use crate::config::Config;
use crate::error::Result;
use crate::types::{Sector, SkyCoord, Target};

/// Fetcher backed by the remote cutout web API
#[derive(Clone, Debug)]
pub struct ApiCutoutFetcher {
    client: reqwest::Client,
    base_url: String,
    sector: Sector,
    size: u32,
}

impl ApiCutoutFetcher {
    /// Create a fetcher against an explicit base URL
    pub fn new(base_url: impl Into<String>, sector: Sector, size: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            sector,
            size,
        }
    }

    /// Create a fetcher from the library configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.endpoints.cutout_api_base_url.clone(),
            config.fetch.sector,
            config.fetch.cutout_size,
        )
    }

    /// Fetch the cutout for a coordinate, returning the raw response bytes
    ///
    /// File writing is the caller's responsibility in this path.
    pub async fn fetch(&self, coord: SkyCoord) -> Result<Vec<u8>> {
        let url = format!("{}/astrocut", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ra", coord.ra_deg.to_string()),
                ("dec", coord.dec_deg.to_string()),
                ("y", self.size.to_string()),
                ("x", self.size.to_string()),
                ("units", "px".to_string()),
                ("sector", self.sector.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        tracing::debug!(coord = %coord, bytes = bytes.len(), "Cutout API returned");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl CutoutFetcher for ApiCutoutFetcher {
    async fn fetch_and_save(&self, target: &Target, out_dir: &Path) -> Result<PathBuf> {
        let bytes = self.fetch(target.coord).await?;
        let path = out_dir.join(format!("{}.zip", target.id));
        write_artifact(&path, &bytes).await?;
        tracing::info!(target = %target.id, path = %path.display(), "Saved API cutout");
        Ok(path)
    }
}
