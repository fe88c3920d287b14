//! ═══════════════════════════════════════════════════════════════════════════════
//! AGGREGATE — Ensemble Reduction to Forecast, Risk, and Uncertainty
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Reduces the trial ensemble into:
//! - Per-period point estimates plus percentile confidence bounds
//! - Risk metrics over the final-period outcome distribution (volatility,
//!   VaR, expected shortfall, drawdown, tail risk, upside)
//! - Uncertainty metrics: input spread → outcome spread growth, plus model
//!   sensitivity to scenario-weight perturbation
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::{DrawdownPolicy, PredictionConfig};
use crate::error::{AugurError, Result};
use crate::scenario::Scenario;
use crate::simulate::SimulationEnsemble;
use crate::stats::{mean, percentile};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-period forecast band, aligned index-for-index with the predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    pub confidence_level: f64,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
}

/// Risk metrics over the final-period outcome distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Standard deviation of final outcomes
    pub volatility: f64,
    /// 5th percentile of the final outcome distribution (loss-side quantile)
    pub var_95: f64,
    /// Mean of final outcomes at or below var_95
    pub expected_shortfall: f64,
    /// Peak-to-trough decline across paths, per the configured policy
    pub max_drawdown: f64,
    /// Probability mass at or below the severity floor
    pub tail_risk: f64,
    /// 95th percentile gain relative to the base value
    pub upside_potential: f64,
}

/// How uncertainty evolves from inputs to the prediction horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyMetrics {
    /// Spread of input report confidences (floored)
    pub initial_uncertainty: f64,
    /// Relative spread of the final outcome distribution
    pub final_uncertainty: f64,
    /// final / initial
    pub uncertainty_growth: f64,
    /// Sensitivity of the final estimate to scenario-weight perturbation
    pub model_uncertainty: f64,
}

/// Full aggregation output
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    pub predictions: Vec<f64>,
    pub intervals: ConfidenceIntervals,
    pub risk: RiskAssessment,
    pub uncertainty: UncertaintyMetrics,
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Statistical reduction of a simulation ensemble
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: PredictionConfig,
}

impl Aggregator {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Reduce the ensemble. `confidence_spread` comes from the fused
    /// assessment and seeds the initial uncertainty.
    pub fn aggregate(
        &self,
        ensemble: &SimulationEnsemble,
        scenarios: &[Scenario],
        confidence_spread: f64,
        confidence_level: f64,
    ) -> Result<AggregateOutput> {
        if ensemble.completed == 0 {
            return Err(AugurError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let predictions: Vec<f64> = ensemble
            .period_sums
            .iter()
            .map(|s| s / ensemble.completed as f64)
            .collect();
        let intervals = self.intervals(ensemble, &predictions, confidence_level);
        let risk = self.risk(ensemble);
        let uncertainty = self.uncertainty(ensemble, scenarios, confidence_spread);

        Ok(AggregateOutput {
            predictions,
            intervals,
            risk,
            uncertainty,
        })
    }

    /// Percentile band per period from the path reservoir, widened where
    /// needed so the point estimate always sits inside it
    fn intervals(
        &self,
        ensemble: &SimulationEnsemble,
        predictions: &[f64],
        confidence_level: f64,
    ) -> ConfidenceIntervals {
        let alpha = (1.0 - confidence_level) / 2.0;
        let mut lower_bound = Vec::with_capacity(ensemble.num_periods);
        let mut upper_bound = Vec::with_capacity(ensemble.num_periods);

        for (t, &prediction) in predictions.iter().enumerate() {
            let mut column: Vec<f64> = ensemble
                .reservoir
                .iter()
                .map(|r| r.path[t])
                .collect();
            if column.is_empty() {
                lower_bound.push(prediction);
                upper_bound.push(prediction);
                continue;
            }
            column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            lower_bound.push(percentile(&column, alpha).min(prediction));
            upper_bound.push(percentile(&column, 1.0 - alpha).max(prediction));
        }

        ConfidenceIntervals {
            confidence_level,
            lower_bound,
            upper_bound,
        }
    }

    fn risk(&self, ensemble: &SimulationEnsemble) -> RiskAssessment {
        let mut finals: Vec<f64> = ensemble
            .reservoir
            .iter()
            .filter_map(|r| r.path.last().copied())
            .collect();
        finals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let var_95 = if finals.is_empty() {
            ensemble.final_moments.mean()
        } else {
            percentile(&finals, 0.05)
        };
        let shortfall_samples: Vec<f64> =
            finals.iter().copied().filter(|&v| v <= var_95).collect();
        let expected_shortfall = if shortfall_samples.is_empty() {
            var_95
        } else {
            mean(&shortfall_samples)
        };

        let max_drawdown = match self.config.drawdown_policy {
            DrawdownPolicy::WorstCase => ensemble.drawdown_worst,
            DrawdownPolicy::Average => ensemble.drawdown_sum / ensemble.completed as f64,
        };

        let p95 = if finals.is_empty() {
            ensemble.final_moments.max()
        } else {
            percentile(&finals, 0.95)
        };
        let upside_potential = (p95 - ensemble.base_value) / ensemble.base_value;

        RiskAssessment {
            volatility: ensemble.final_moments.std_dev(),
            var_95,
            expected_shortfall,
            max_drawdown,
            tail_risk: ensemble.tail_count as f64 / ensemble.completed as f64,
            upside_potential,
        }
    }

    fn uncertainty(
        &self,
        ensemble: &SimulationEnsemble,
        scenarios: &[Scenario],
        confidence_spread: f64,
    ) -> UncertaintyMetrics {
        let initial_uncertainty = confidence_spread.max(self.config.min_initial_uncertainty);

        let final_mean = ensemble.final_moments.mean();
        let final_std = ensemble.final_moments.std_dev();
        let final_uncertainty = if final_mean.abs() > 1e-9 {
            final_std / final_mean.abs()
        } else {
            final_std
        };

        UncertaintyMetrics {
            initial_uncertainty,
            final_uncertainty,
            uncertainty_growth: final_uncertainty / initial_uncertainty,
            model_uncertainty: self.model_uncertainty(ensemble, scenarios),
        }
    }

    /// Re-estimate the final mean under perturbed scenario weights and take
    /// the worst relative delta. Scenarios that completed no trials are
    /// excluded from both the baseline and the perturbed estimates.
    fn model_uncertainty(&self, ensemble: &SimulationEnsemble, scenarios: &[Scenario]) -> f64 {
        let active: Vec<(f64, f64)> = scenarios
            .iter()
            .zip(&ensemble.scenario_moments)
            .filter(|(_, m)| m.count() > 0)
            .map(|(s, m)| (s.probability_weight, m.mean()))
            .collect();
        if active.len() < 2 {
            return 0.0;
        }

        let weighted_mean = |weights: &[f64]| -> f64 {
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                return 0.0;
            }
            active
                .iter()
                .zip(weights)
                .map(|((_, m), w)| w * m)
                .sum::<f64>()
                / total
        };

        let base_weights: Vec<f64> = active.iter().map(|(w, _)| *w).collect();
        let baseline = weighted_mean(&base_weights);
        if baseline.abs() < 1e-9 {
            return 0.0;
        }

        let mut worst = 0.0;
        for i in 0..active.len() {
            let mut perturbed = base_weights.clone();
            perturbed[i] += self.config.weight_perturbation;
            let delta = (weighted_mean(&perturbed) - baseline).abs() / baseline.abs();
            if delta > worst {
                worst = delta;
            }
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::ReservoirPath;
    use crate::stats::{approx_eq, Moments};

    /// Hand-built 4-trial, 2-period ensemble over one scenario
    fn make_ensemble() -> SimulationEnsemble {
        let paths = [
            vec![90.0, 80.0],
            vec![100.0, 100.0],
            vec![110.0, 120.0],
            vec![105.0, 140.0],
        ];
        let mut final_moments = Moments::new();
        let mut period_sums = vec![0.0; 2];
        let mut reservoir = Vec::new();
        for (k, path) in paths.iter().enumerate() {
            for (t, v) in path.iter().enumerate() {
                period_sums[t] += v;
            }
            final_moments.push(path[1]);
            reservoir.push(ReservoirPath {
                trial_index: k as u64,
                path: path.clone(),
            });
        }
        SimulationEnsemble {
            base_value: 100.0,
            num_periods: 2,
            requested: 4,
            dispatched: 4,
            completed: 4,
            discarded: 0,
            period_sums,
            final_moments,
            scenario_moments: vec![final_moments],
            tail_count: 1,
            drawdown_sum: 0.45,
            drawdown_worst: 0.2,
            reservoir,
            severity_floor: 70.0,
            deadline_expired: false,
            base_seed: 0,
            elapsed_ms: 1,
        }
    }

    fn one_scenario() -> Vec<Scenario> {
        vec![Scenario::new("baseline", 0.0, 0.1, 1.0)]
    }

    #[test]
    fn test_predictions_are_period_means() {
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.1, 0.95)
            .unwrap();
        assert!(approx_eq(out.predictions[0], 101.25, 1e-12));
        assert!(approx_eq(out.predictions[1], 110.0, 1e-12));
    }

    #[test]
    fn test_bounds_bracket_predictions() {
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.1, 0.95)
            .unwrap();
        for t in 0..out.predictions.len() {
            assert!(out.intervals.lower_bound[t] <= out.predictions[t]);
            assert!(out.predictions[t] <= out.intervals.upper_bound[t]);
        }
    }

    #[test]
    fn test_risk_metrics_hand_checked() {
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.1, 0.95)
            .unwrap();

        // Finals are [80, 100, 120, 140]; 5th pct = 80 + 0.15 × 20 = 83
        assert!(approx_eq(out.risk.var_95, 83.0, 1e-9));
        // Only the 80 outcome sits at or below VaR
        assert!(approx_eq(out.risk.expected_shortfall, 80.0, 1e-9));
        // tail_count 1 of 4
        assert!(approx_eq(out.risk.tail_risk, 0.25, 1e-12));
        // Worst-case policy reports the worst path drawdown
        assert!(approx_eq(out.risk.max_drawdown, 0.2, 1e-12));
        // 95th pct = 120 + 0.85 × 20 = 137 → 37% above base
        assert!(approx_eq(out.risk.upside_potential, 0.37, 1e-9));
    }

    #[test]
    fn test_average_drawdown_policy() {
        let config = PredictionConfig {
            drawdown_policy: DrawdownPolicy::Average,
            ..Default::default()
        };
        let aggregator = Aggregator::new(config);
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.1, 0.95)
            .unwrap();
        assert!(approx_eq(out.risk.max_drawdown, 0.45 / 4.0, 1e-12));
    }

    #[test]
    fn test_uncertainty_growth() {
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.02, 0.95)
            .unwrap();
        // Spread below the floor → floored initial uncertainty
        assert!(approx_eq(out.uncertainty.initial_uncertainty, 0.05, 1e-12));
        assert!(out.uncertainty.final_uncertainty > 0.0);
        assert!(approx_eq(
            out.uncertainty.uncertainty_growth,
            out.uncertainty.final_uncertainty / 0.05,
            1e-12
        ));
    }

    #[test]
    fn test_model_uncertainty_zero_for_single_scenario() {
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&make_ensemble(), &one_scenario(), 0.1, 0.95)
            .unwrap();
        assert_eq!(out.uncertainty.model_uncertainty, 0.0);
    }

    #[test]
    fn test_model_uncertainty_positive_for_divergent_scenarios() {
        let mut ensemble = make_ensemble();
        let mut high = Moments::new();
        high.push(150.0);
        high.push(160.0);
        let mut low = Moments::new();
        low.push(60.0);
        low.push(70.0);
        ensemble.scenario_moments = vec![high, low];

        let scenarios = vec![
            Scenario::new("up", 0.01, 0.1, 0.5),
            Scenario::new("down", -0.01, 0.1, 0.5),
        ];
        let aggregator = Aggregator::new(PredictionConfig::default());
        let out = aggregator
            .aggregate(&ensemble, &scenarios, 0.1, 0.95)
            .unwrap();
        assert!(out.uncertainty.model_uncertainty > 0.0);
    }

    #[test]
    fn test_empty_ensemble_is_insufficient() {
        let mut ensemble = make_ensemble();
        ensemble.completed = 0;
        let aggregator = Aggregator::new(PredictionConfig::default());
        let err = aggregator
            .aggregate(&ensemble, &one_scenario(), 0.1, 0.95)
            .unwrap_err();
        assert!(matches!(err, AugurError::InsufficientData { .. }));
    }
}
