//! # cutout-dl
//!
//! Library for fetching astronomical image cutouts for a list of catalog
//! targets, in parallel, from cloud-hosted mission data.
//!
//! ## Design Philosophy
//!
//! cutout-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Explicitly parallel** - A worker count is passed in, not sniffed from
//!   the environment deep inside the library
//! - **Share-nothing** - Workers own their partitions; the one shared
//!   structure is immutable by interface
//! - **Bounded** - Every remote fetch carries a deadline and a cooperative
//!   cancellation point
//!
//! ## Fetch paths
//!
//! The same cutout data is reachable two ways, behind one trait:
//! - [`cutout::ApiCutoutFetcher`] calls the archive's conventional cutout
//!   web API per target.
//! - [`cutout::CubeCutoutFetcher`] reads byte ranges straight out of the
//!   pre-built per-channel cutout cubes in cloud storage.
//!
//! Either can be handed to the [`Dispatcher`], which partitions targets
//! round-robin across workers, fans out, and joins.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cutout_dl::catalog::{dedup_by_id, filter_by_depth, load_catalog_file};
//! use cutout_dl::cutout::ApiCutoutFetcher;
//! use cutout_dl::{Config, Dispatcher, SectorLookupClient};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     // Input table -> deep-transit candidates with unique IDs
//!     let rows = load_catalog_file(Path::new("targets.csv"))?;
//!     let rows = dedup_by_id(filter_by_depth(rows, 5000.0));
//!
//!     // One sector lookup per target builds the shared read-only index
//!     let lookup = SectorLookupClient::from_config(&config);
//!     let index = Arc::new(lookup.build_target_index(&rows, config.fetch.sector).await?);
//!
//!     // Partition, fan out, join
//!     let dispatcher = Dispatcher::new(&config);
//!     let report = dispatcher
//!         .run_targets(
//!             index.ids().collect(),
//!             config.effective_workers(),
//!             Arc::clone(&index),
//!             Arc::new(ApiCutoutFetcher::from_config(&config)),
//!             config.fetch.output_dir.clone(),
//!         )
//!         .await?;
//!
//!     println!(
//!         "fetched {} cutouts in {:.2}s",
//!         report.completed(),
//!         report.elapsed.as_secs_f64()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog table loading (CSV input, depth filter, duplicate removal)
pub mod catalog;
/// Configuration types
pub mod config;
/// Cutout fetch-and-save collaborators (web API and cloud cube readers)
pub mod cutout;
/// Parallel dispatcher (fan-out, join, completion reporting)
pub mod dispatch;
/// Error types
pub mod error;
/// Sector lookup client (coordinate to channel label resolution)
pub mod lookup;
/// Workload partitioner (round-robin assignment)
pub mod partition;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, EndpointConfig, FetchConfig, RetryConfig};
pub use cutout::CutoutFetcher;
pub use dispatch::{DispatchReport, Dispatcher, WorkerOutcome};
pub use error::{Error, Result};
pub use lookup::SectorLookupClient;
pub use partition::round_robin;
pub use types::{ChannelLabel, Sector, SkyCoord, Target, TargetId, TargetIndex};
