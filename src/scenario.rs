//! ═══════════════════════════════════════════════════════════════════════════════
//! SCENARIO — Simulation Scenario Derivation
//! ═══════════════════════════════════════════════════════════════════════════════
//! Derives optimistic/baseline/pessimistic scenario parameters from the fused
//! assessment: higher fused confidence → lower volatility and a mildly
//! positive drift. Caller-supplied scenario sets bypass derivation but are
//! validated (weights sum to 1, non-negative, finite).
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::PredictionConfig;
use crate::error::{AugurError, Result};
use crate::fusion::FusedIntelligence;
use serde::{Deserialize, Serialize};

/// Tolerance for the scenario probability-weight sum
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One simulation scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// optimistic | baseline | pessimistic, or user-defined
    pub name: String,
    /// Per-period deterministic trend
    pub drift: f64,
    /// Per-period noise amplitude, ≥ 0
    pub volatility: f64,
    /// Share of trials allocated to this scenario; a set sums to 1
    pub probability_weight: f64,
}

impl Scenario {
    pub fn new(name: &str, drift: f64, volatility: f64, probability_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            drift,
            volatility,
            probability_weight,
        }
    }
}

/// Derives or validates scenario sets
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    config: PredictionConfig,
}

impl ScenarioGenerator {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Default 3-scenario set from the fused assessment.
    ///
    /// baseline drift   = drift_scale × (confidence − 0.5)
    /// baseline vol     = volatility_scale × (1 − confidence) + volatility_floor
    /// optimistic       = baseline drift + spread, vol × optimistic factor
    /// pessimistic      = baseline drift − spread, vol × pessimistic factor
    pub fn generate(&self, fused: &FusedIntelligence) -> Vec<Scenario> {
        let confidence = fused.overall_confidence.clamp(0.0, 1.0);
        let drift = self.config.drift_scale * (confidence - 0.5);
        let volatility =
            self.config.volatility_scale * (1.0 - confidence) + self.config.volatility_floor;
        let [w_opt, w_base, w_pess] = self.config.default_scenario_weights;

        vec![
            Scenario::new(
                "optimistic",
                drift + self.config.drift_spread,
                volatility * self.config.optimistic_volatility_factor,
                w_opt,
            ),
            Scenario::new("baseline", drift, volatility, w_base),
            Scenario::new(
                "pessimistic",
                drift - self.config.drift_spread,
                volatility * self.config.pessimistic_volatility_factor,
                w_pess,
            ),
        ]
    }

    /// Validate a caller-supplied scenario set
    pub fn validate(&self, scenarios: &[Scenario]) -> Result<()> {
        if scenarios.is_empty() {
            return Err(AugurError::validation("scenario set is empty"));
        }
        for s in scenarios {
            if !s.drift.is_finite() {
                return Err(AugurError::validation(format!(
                    "scenario '{}': drift is not finite",
                    s.name
                )));
            }
            if !s.volatility.is_finite() || s.volatility < 0.0 {
                return Err(AugurError::validation(format!(
                    "scenario '{}': volatility {} must be finite and ≥ 0",
                    s.name, s.volatility
                )));
            }
            if !s.probability_weight.is_finite() || s.probability_weight < 0.0 {
                return Err(AugurError::validation(format!(
                    "scenario '{}': probability_weight {} must be finite and ≥ 0",
                    s.name, s.probability_weight
                )));
            }
        }
        let sum: f64 = scenarios.iter().map(|s| s.probability_weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AugurError::validation(format!(
                "scenario probability weights sum to {}, expected 1",
                sum
            )));
        }
        Ok(())
    }
}
