//! Cutout fetch-and-save collaborators
//!
//! Two sources produce the same sub-image data: the conventional cutout web
//! API ([`api::ApiCutoutFetcher`]) and direct ranged reads from pre-built
//! cutout cubes in cloud storage ([`cube::CubeCutoutFetcher`]). The
//! [`CutoutFetcher`] trait is the seam the parallel dispatcher works
//! against, so tests can substitute either with a mock.

pub mod api;
pub mod cube;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Target;

pub use api::ApiCutoutFetcher;
pub use cube::{CubeCutoutFetcher, CubeGeometry, cube_key};

/// A source of cutout data that persists one artifact per target
///
/// Implementations own their transport and their per-item error handling;
/// the dispatcher only records the outcome. Output artifacts must be named
/// after the target identifier so concurrent workers never contend on a
/// file.
#[async_trait]
pub trait CutoutFetcher: Send + Sync {
    /// Fetch the cutout for one target and write it under `out_dir`
    ///
    /// Returns the path of the written artifact.
    async fn fetch_and_save(&self, target: &Target, out_dir: &Path) -> Result<PathBuf>;
}

/// Write artifact bytes to `path`, creating the parent directory if needed
///
/// Failures surface as [`Error::Persist`] with the offending path.
pub(crate) async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| Error::Persist {
                path: path.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| Error::Persist {
            path: path.to_path_buf(),
            source,
        })
}
