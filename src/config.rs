//! ═══════════════════════════════════════════════════════════════════════════════
//! CONFIG — Immutable Configuration Records
//! ═══════════════════════════════════════════════════════════════════════════════
//! Every tunable of the pipeline lives here, enumerated explicitly. The
//! records are constructed once per call site and passed by reference; there
//! are no hidden globals and no environment lookups.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::report::ExpectedRegion;
use crate::simulate::NoiseModel;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// FUSION CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for validation, correlation, and fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Reports below this confidence are discarded (not an error)
    pub min_confidence: f64,
    /// Temporal correlation window; score decays linearly to 0 at the window edge
    pub temporal_window_hours: f64,
    /// Spatial cluster radius; score decays linearly to 0 at the radius
    pub spatial_cluster_km: f64,
    /// Weight of the temporal view in the combined correlation score
    pub temporal_weight: f64,
    /// Weight of the spatial view in the combined correlation score
    pub spatial_weight: f64,
    /// Weight of the semantic view in the combined correlation score
    pub semantic_weight: f64,
    /// Semantic similarity at or above this marks corroboration between
    /// different source types
    pub semantic_similarity_threshold: f64,
    /// Semantic similarity above this between same-type reports marks a
    /// near-duplicate
    pub near_duplicate_threshold: f64,
    /// Weight multiplier applied to the later-arriving near-duplicate
    pub duplicate_discount: f64,
    /// Relative confidence increment per corroborating pair
    pub corroboration_bonus_per_pair: f64,
    /// Cap on the total relative corroboration bonus
    pub corroboration_bonus_cap: f64,
    /// Confidence multiplier when only a single report survives validation
    pub uncorroborated_penalty: f64,
    /// Maximum characters of each report quoted in the fused summary
    pub summary_snippet_len: usize,
    /// Regions where coverage is expected; empty disables spatial gap detection
    pub expected_regions: Vec<ExpectedRegion>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            temporal_window_hours: 48.0,
            spatial_cluster_km: 50.0,
            temporal_weight: 1.0 / 3.0,
            spatial_weight: 1.0 / 3.0,
            semantic_weight: 1.0 / 3.0,
            semantic_similarity_threshold: 0.7,
            near_duplicate_threshold: 0.9,
            duplicate_discount: 0.5,
            corroboration_bonus_per_pair: 0.05,
            corroboration_bonus_cap: 0.10,
            uncorroborated_penalty: 0.9,
            summary_snippet_len: 120,
            expected_regions: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PREDICTION CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// How max drawdown is reported across the trial ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawdownPolicy {
    /// Largest peak-to-trough decline observed in any single path
    WorstCase,
    /// Mean of the per-path maximum drawdowns
    Average,
}

/// Configuration for scenario generation, simulation, and aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Trial count when the request does not specify one
    pub default_num_simulations: usize,
    /// Confidence level for the per-period interval (0.95 → 2.5th/97.5th pct)
    pub confidence_level: f64,
    /// Trials per worker batch
    pub batch_size: usize,
    /// Worker threads; 0 means available parallelism
    pub worker_threads: usize,
    /// Maximum paths retained for percentile estimation (stride-sampled)
    pub reservoir_capacity: usize,
    /// Noise distribution driving the stochastic recurrence
    pub noise: NoiseModel,
    /// Drawdown reporting policy
    pub drawdown_policy: DrawdownPolicy,
    /// Tail-risk severity: final value at or below base × (1 − fraction)
    pub severity_loss_fraction: f64,
    /// Additive scenario-weight perturbation used for model uncertainty
    pub weight_perturbation: f64,
    /// Floor on initial uncertainty, avoids degenerate growth ratios
    pub min_initial_uncertainty: f64,
    /// Discard rate above this attaches a convergence warning
    pub discard_warn_fraction: f64,
    /// Discard rate above this fails the whole prediction
    pub discard_fail_fraction: f64,
    /// Per-period baseline drift = drift_scale × (confidence − 0.5)
    pub drift_scale: f64,
    /// Drift offset between the baseline and the optimistic/pessimistic scenarios
    pub drift_spread: f64,
    /// Per-period volatility = volatility_scale × (1 − confidence) + floor
    pub volatility_scale: f64,
    /// Volatility never derived below this
    pub volatility_floor: f64,
    /// Volatility multiplier for the optimistic scenario
    pub optimistic_volatility_factor: f64,
    /// Volatility multiplier for the pessimistic scenario
    pub pessimistic_volatility_factor: f64,
    /// Probability weights for [optimistic, baseline, pessimistic]
    pub default_scenario_weights: [f64; 3],
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            default_num_simulations: 10_000,
            confidence_level: 0.95,
            batch_size: 256,
            worker_threads: 0,
            reservoir_capacity: 16_384,
            noise: NoiseModel::StandardNormal,
            drawdown_policy: DrawdownPolicy::WorstCase,
            severity_loss_fraction: 0.3,
            weight_perturbation: 0.1,
            min_initial_uncertainty: 0.05,
            discard_warn_fraction: 0.05,
            discard_fail_fraction: 0.5,
            drift_scale: 0.02,
            drift_spread: 0.01,
            volatility_scale: 0.25,
            volatility_floor: 0.02,
            optimistic_volatility_factor: 0.8,
            pessimistic_volatility_factor: 1.2,
            default_scenario_weights: [0.25, 0.5, 0.25],
        }
    }
}

impl PredictionConfig {
    /// Resolved worker count (0 → available parallelism, at least 1)
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
