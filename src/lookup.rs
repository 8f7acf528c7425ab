//! Sector lookup client
//!
//! Asks the archive's lookup service which observations cover a sky
//! coordinate, then narrows the answer to the requested sector to derive the
//! channel label (camera and CCD) for that target. One lookup per catalog row
//! builds the read-only [`TargetIndex`] every worker shares.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRow;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ChannelLabel, Sector, SkyCoord, Target, TargetId, TargetIndex};

/// One observation record returned by the lookup service
///
/// The wire format carries everything as strings (the sector zero-padded);
/// parsing happens during channel resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Sector in zero-padded form, e.g. "0055"
    pub sector: String,
    /// Camera group that observed the coordinate
    pub camera: String,
    /// CCD sub-unit within the camera
    pub ccd: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<ObservationRecord>,
}

/// HTTP client for the sector lookup service
#[derive(Clone, Debug)]
pub struct SectorLookupClient {
    client: reqwest::Client,
    base_url: String,
}

impl SectorLookupClient {
    /// Create a client against an explicit base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client from the library configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.endpoints.lookup_base_url.clone())
    }

    /// List every observation covering a sky coordinate
    pub async fn locate(&self, coord: SkyCoord) -> Result<Vec<ObservationRecord>> {
        let url = format!("{}/sector", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ra", coord.ra_deg), ("dec", coord.dec_deg)])
            .send()
            .await?
            .error_for_status()?;
        let body: LookupResponse = response.json().await?;
        tracing::debug!(
            coord = %coord,
            records = body.results.len(),
            "Sector lookup returned"
        );
        Ok(body.results)
    }

    /// Derive the channel label for one target in one sector
    pub async fn resolve_channel(
        &self,
        target: TargetId,
        coord: SkyCoord,
        sector: Sector,
    ) -> Result<ChannelLabel> {
        let records = self.locate(coord).await?;
        select_channel(&records, target, sector)
    }

    /// Resolve every catalog row into a [`Target`] and build the shared index
    ///
    /// One lookup per row; the first failing row fails the build. Rows are
    /// expected to be deduplicated upstream, but a repeated identifier keeps
    /// its first resolution.
    pub async fn build_target_index(
        &self,
        rows: &[CatalogRow],
        sector: Sector,
    ) -> Result<TargetIndex> {
        let mut targets = Vec::with_capacity(rows.len());
        for row in rows {
            let channel = self.resolve_channel(row.id, row.coord(), sector).await?;
            targets.push(Target {
                id: row.id,
                coord: row.coord(),
                channel,
            });
        }
        tracing::info!(
            targets = targets.len(),
            sector = %sector,
            "Built target index"
        );
        Ok(TargetIndex::build(targets))
    }
}

/// Select the single record matching `sector` and extract its channel label
///
/// Exactly one record must match: zero matches is a lookup miss, more than
/// one is ambiguous and rejected rather than silently resolved by iteration
/// order.
pub fn select_channel(
    records: &[ObservationRecord],
    target: TargetId,
    sector: Sector,
) -> Result<ChannelLabel> {
    let matches: Vec<&ObservationRecord> = records
        .iter()
        .filter(|r| r.sector.parse::<Sector>().is_ok_and(|s| s == sector))
        .collect();

    let record = match matches.as_slice() {
        [] => {
            return Err(Error::LookupMiss {
                target: target.get(),
                sector: sector.get(),
            });
        }
        [record] => record,
        _ => {
            return Err(Error::AmbiguousSector {
                target: target.get(),
                sector: sector.get(),
                count: matches.len(),
            });
        }
    };

    let camera = record.camera.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "lookup record for sector {sector} has bad camera '{}'",
            record.camera
        ))
    })?;
    let ccd = record.ccd.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "lookup record for sector {sector} has bad ccd '{}'",
            record.ccd
        ))
    })?;
    Ok(ChannelLabel::new(camera, ccd))
}
