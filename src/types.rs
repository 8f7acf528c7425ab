//! Core types for cutout-dl

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Error;

/// Unique identifier for a catalog target
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TargetId(pub u64);

impl TargetId {
    /// Create a new TargetId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TargetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TargetId> for u64 {
    fn from(id: TargetId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Observing-campaign number
///
/// Displays as a plain integer; storage paths and lookup responses use the
/// zero-padded four-digit form (`55` → `"0055"`), available via
/// [`Sector::zero_padded`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sector(pub u16);

impl Sector {
    /// Create a new Sector
    pub fn new(sector: u16) -> Self {
        Self(sector)
    }

    /// Get the inner u16 value
    pub fn get(&self) -> u16 {
        self.0
    }

    /// Zero-padded four-digit form used in cube object keys and lookup records
    pub fn zero_padded(&self) -> String {
        format!("{:04}", self.0)
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Sector {
    type Err = std::num::ParseIntError;

    /// Parses both the plain (`"55"`) and the zero-padded (`"0055"`) form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Sky coordinate in degrees (ICRS right ascension and declination)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    /// Right ascension in degrees
    pub ra_deg: f64,
    /// Declination in degrees
    pub dec_deg: f64,
}

impl SkyCoord {
    /// Create a coordinate from RA/Dec in degrees
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg, dec_deg }
    }
}

impl std::fmt::Display for SkyCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.ra_deg, self.dec_deg)
    }
}

/// Composite identifier of the physical sensor region that observed a target
///
/// Combines the camera group and the CCD sub-unit, displayed as `"3-2"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelLabel {
    /// Camera group (1-4)
    pub camera: u8,
    /// CCD sub-unit within the camera (1-4)
    pub ccd: u8,
}

impl ChannelLabel {
    /// Create a new channel label
    pub fn new(camera: u8, ccd: u8) -> Self {
        Self { camera, ccd }
    }
}

impl std::fmt::Display for ChannelLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.camera, self.ccd)
    }
}

impl FromStr for ChannelLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (camera, ccd) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidInput(format!("channel label '{s}' is not CAMERA-CCD")))?;
        let camera = camera
            .parse()
            .map_err(|_| Error::InvalidInput(format!("channel label '{s}' has a bad camera")))?;
        let ccd = ccd
            .parse()
            .map_err(|_| Error::InvalidInput(format!("channel label '{s}' has a bad ccd")))?;
        Ok(Self { camera, ccd })
    }
}

/// A work item: a catalog target with its derived pointing
///
/// Created once per run from the input table plus one sector lookup;
/// immutable thereafter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// External catalog identifier
    pub id: TargetId,
    /// Sky coordinate derived from the catalog row
    pub coord: SkyCoord,
    /// Sensor region that observed this target in the requested sector
    pub channel: ChannelLabel,
}

/// Read-only map from target identifier to its derived pointing
///
/// Shared by every worker during a dispatch. The interface deliberately has
/// no insertion or removal after construction, so "no shared mutable state"
/// holds by type rather than by convention.
#[derive(Clone, Debug, Default)]
pub struct TargetIndex {
    map: HashMap<TargetId, Target>,
}

impl TargetIndex {
    /// Build an index from resolved targets
    ///
    /// A target appearing twice keeps its first occurrence, matching the
    /// catalog's duplicate-removal step upstream.
    pub fn build(targets: impl IntoIterator<Item = Target>) -> Self {
        let mut map = HashMap::new();
        for target in targets {
            map.entry(target.id).or_insert(target);
        }
        Self { map }
    }

    /// Look up a target by identifier
    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.map.get(&id)
    }

    /// Number of targets in the index
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all target identifiers (arbitrary order)
    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.map.keys().copied()
    }
}
