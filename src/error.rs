//! Error types for cutout-dl
//!
//! This module provides the error taxonomy for the library:
//! - Input errors (malformed catalog rows, invalid partition counts)
//! - Lookup errors (no observation for the requested sector, ambiguous matches)
//! - Transient fetch failures (network, per-item deadline expiry)
//! - Persist failures (writing a cutout artifact to disk)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cutout-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cutout-dl
///
/// Each variant carries enough context to tell which target or file was
/// involved when a worker reports its failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input (malformed catalog row, zero partition count, bad label)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "cutout_size")
        key: Option<String>,
    },

    /// The lookup service returned no observation for the requested sector
    #[error("no observation of target {target} in sector {sector}")]
    LookupMiss {
        /// The target whose lookup came up empty
        target: u64,
        /// The sector that was requested
        sector: u16,
    },

    /// The lookup service returned more than one observation for the requested sector
    #[error("{count} observations of target {target} match sector {sector}, expected exactly one")]
    AmbiguousSector {
        /// The target with conflicting lookup results
        target: u64,
        /// The sector that was requested
        sector: u16,
        /// How many records matched
        count: usize,
    },

    /// Network error from the lookup service, cutout API, or cube store
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Per-item deadline expired while fetching one target
    #[error("fetch of target {target} exceeded deadline of {deadline_secs}s")]
    Timeout {
        /// The target whose fetch timed out
        target: u64,
        /// The configured per-item deadline in seconds
        deadline_secs: u64,
    },

    /// Failed to write a cutout artifact to disk
    #[error("failed to persist cutout at {path}: {source}")]
    Persist {
        /// Path of the artifact that could not be written
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed catalog table
    #[error("catalog error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The coordinator requested cancellation before this item was fetched
    #[error("cancelled before target {target} was fetched")]
    Cancelled {
        /// The target that was skipped
        target: u64,
    },
}
