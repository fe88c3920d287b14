//! ═══════════════════════════════════════════════════════════════════════════════
//! AUGUR — Intelligence Fusion and Predictive Analytics Core
//! ═══════════════════════════════════════════════════════════════════════════════
//! Fuses heterogeneous, imperfectly-reliable intelligence reports into a
//! single weighted assessment, then projects it forward with Monte Carlo
//! simulation: probabilistic forecasts, confidence intervals, risk metrics,
//! and uncertainty bounds.
//!
//! Pipeline: reports → validate → correlate → fuse → scenarios → simulate →
//! aggregate → recommend.
//!
//! Two entry points:
//! - [`FusionEngine::fuse`] — reports in, [`FusedIntelligence`] out
//! - [`PredictionEngine::predict`] — fused assessment + request in,
//!   [`PredictiveIntelligence`] out
//!
//! No storage, transport, or rendering dependency; inputs and outputs are
//! plain serde-serializable records.
//! ═══════════════════════════════════════════════════════════════════════════════

#![allow(clippy::needless_range_loop)] // Indexed pair loops are clearer for matrix math

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION — errors, config, data model, numeric primitives
// ═══════════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod report;
pub mod stats;

// ═══════════════════════════════════════════════════════════════════════════════
// FUSION PIPELINE — validate, correlate, fuse
// ═══════════════════════════════════════════════════════════════════════════════

pub mod correlate;
pub mod fusion;
pub mod validate;

// ═══════════════════════════════════════════════════════════════════════════════
// PREDICTIVE PIPELINE — scenarios, simulation, aggregation, guidance
// ═══════════════════════════════════════════════════════════════════════════════

pub mod aggregate;
pub mod predict;
pub mod recommend;
pub mod scenario;
pub mod simulate;

// Re-export the surface most callers need
pub use aggregate::{ConfidenceIntervals, RiskAssessment, UncertaintyMetrics};
pub use config::{DrawdownPolicy, FusionConfig, PredictionConfig};
pub use error::{AugurError, Result};
pub use fusion::{FusedIntelligence, FusionEngine, GapType, IntelligenceGap, Severity};
pub use predict::{
    PredictionEngine, PredictionRequest, PredictionWarning, PredictiveIntelligence,
    SimulationMetadata, TimeUnit, Timeframe,
};
pub use report::{ExpectedRegion, GeoPoint, IntelligenceReport, SourceType};
pub use scenario::{Scenario, ScenarioGenerator};
pub use simulate::{MonteCarloSimulator, NoiseModel};
