//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Error Type for Augur
//! ═══════════════════════════════════════════════════════════════════════════════
//! Centralized error handling. No scattered .unwrap() or .expect() calls.
//!
//! Taxonomy:
//! - Validation: malformed report fields, bad scenario weights, bad request params
//! - InsufficientData: no reports survive the confidence floor
//! - Numerical: the simulation discard rate makes the result meaningless
//! - Io/Json: passthrough for callers that persist or marshal results
//! ═══════════════════════════════════════════════════════════════════════════════

use thiserror::Error;

/// The unified error type for the augur crate
#[derive(Debug, Error)]
pub enum AugurError {
    /// Malformed input: out-of-range report fields, invalid scenario sets,
    /// or invalid prediction request parameters
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// Not enough usable reports to fuse
    #[error("insufficient data: {available} report(s) available, {required} required")]
    InsufficientData { available: usize, required: usize },

    /// Too many simulation trials diverged for the result to be meaningful
    #[error("numerical failure: {discarded} of {total} trials diverged")]
    Numerical { discarded: usize, total: usize },

    /// I/O error (file operations by hosting code)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AugurError {
    /// Shorthand for a validation failure with a formatted reason
    pub fn validation(reason: impl Into<String>) -> Self {
        AugurError::Validation {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AugurError>;
