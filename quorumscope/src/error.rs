//! Error types for quorumscope.

use std::path::PathBuf;

use quorumscope_core::CoreError;
use thiserror::Error;

/// Errors that abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The component set is structurally invalid (cycle, duplicate, ...).
    #[error("invalid component set: {0}")]
    Core(#[from] CoreError),

    /// The analysis configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input file is not valid JSON for the expected shape.
    #[error("failed to parse input: {0}")]
    Json(#[from] serde_json::Error),

    /// A quorum needs at least one member.
    #[error("quorum size must be at least 1")]
    ZeroQuorum,

    /// A numeric setting is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NonFinite {
        /// Setting name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A numeric setting is outside its allowed range.
    #[error("{field} out of range: {value} ({expected})")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },
}
