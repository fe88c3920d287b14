//! ═══════════════════════════════════════════════════════════════════════════════
//! PREDICT — Prediction Orchestrator
//! ═══════════════════════════════════════════════════════════════════════════════
//! Drives scenario generation → simulation → aggregation → recommendation and
//! assembles the final `PredictiveIntelligence` record, including the
//! trustworthiness metadata (actual trial counts, discards, warnings) the
//! caller needs to judge the result without re-deriving it.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::aggregate::{Aggregator, ConfidenceIntervals, RiskAssessment, UncertaintyMetrics};
use crate::config::PredictionConfig;
use crate::error::{AugurError, Result};
use crate::fusion::FusedIntelligence;
use crate::recommend::{Recommendation, RecommendationContext, RecommendationSynthesizer, RuleTable};
use crate::scenario::{Scenario, ScenarioGenerator, WEIGHT_TOLERANCE};
use crate::simulate::MonteCarloSimulator;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// TIMEFRAME AND REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Period granularity of the forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
        }
    }
}

/// Forecast horizon: number of periods at a granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub periods: usize,
    pub unit: TimeUnit,
}

impl Timeframe {
    pub fn hours(periods: usize) -> Self {
        Self {
            periods,
            unit: TimeUnit::Hours,
        }
    }

    pub fn days(periods: usize) -> Self {
        Self {
            periods,
            unit: TimeUnit::Days,
        }
    }

    pub fn weeks(periods: usize) -> Self {
        Self {
            periods,
            unit: TimeUnit::Weeks,
        }
    }

    /// Compact label such as "30d"
    pub fn label(&self) -> String {
        format!("{}{}", self.periods, self.unit.suffix())
    }
}

/// Everything a caller may specify for one prediction. Unset options fall
/// back to the engine's `PredictionConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub timeframe: Timeframe,
    /// Custom scenario set; None derives the default 3-scenario set
    pub scenarios: Option<Vec<Scenario>>,
    pub confidence_level: Option<f64>,
    pub num_simulations: Option<usize>,
    /// Fixed base seed for reproducible output
    pub seed: Option<u64>,
    /// Soft deadline; expiry truncates rather than fails
    pub deadline: Option<Duration>,
    /// Starting value; None derives overall_confidence × 100
    pub base_value: Option<f64>,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::days(30),
            scenarios: None,
            confidence_level: None,
            num_simulations: None,
            seed: None,
            deadline: None,
            base_value: None,
        }
    }
}

impl PredictionRequest {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            ..Default::default()
        }
    }

    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = Some(scenarios);
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = Some(level);
        self
    }

    pub fn with_simulations(mut self, count: usize) -> Self {
        self.num_simulations = Some(count);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_base_value(mut self, base_value: f64) -> Self {
        self.base_value = Some(base_value);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-fatal conditions the caller should weigh before trusting the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredictionWarning {
    /// Discard rate above the warn threshold (but below the fail threshold)
    HighDiscardRate { discarded: usize, dispatched: usize },
    /// Deadline expired before all requested trials ran
    PartialCompletion { completed: usize, requested: usize },
    /// Custom weights summed to ≈1 within tolerance and were renormalized
    WeightsRenormalized { original_sum: f64 },
}

/// How the simulation actually ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    pub requested_simulations: usize,
    pub actual_simulations_run: usize,
    pub discarded_trials: usize,
    pub base_seed: u64,
    pub elapsed_ms: u64,
}

/// The probabilistic forecast produced from one fused assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveIntelligence {
    pub prediction_id: Uuid,
    pub timeframe: Timeframe,
    /// Names of the simulated scenarios, joined with '+'
    pub scenario_label: String,
    /// Per-period point estimates
    pub predictions: Vec<f64>,
    pub confidence_intervals: ConfidenceIntervals,
    pub risk_assessment: RiskAssessment,
    pub uncertainty_metrics: UncertaintyMetrics,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<PredictionWarning>,
    pub metadata: SimulationMetadata,
}

impl PredictiveIntelligence {
    /// Whether the result converged poorly: elevated discards, or completion
    /// below half the request
    pub fn has_convergence_warning(&self) -> bool {
        self.warnings.iter().any(|w| match w {
            PredictionWarning::HighDiscardRate { .. } => true,
            PredictionWarning::PartialCompletion {
                completed,
                requested,
            } => *completed < requested / 2,
            PredictionWarning::WeightsRenormalized { .. } => false,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Orchestrates the predictive half of the pipeline
pub struct PredictionEngine {
    config: PredictionConfig,
    generator: ScenarioGenerator,
    simulator: MonteCarloSimulator,
    aggregator: Aggregator,
    synthesizer: RecommendationSynthesizer,
}

impl PredictionEngine {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            generator: ScenarioGenerator::new(config.clone()),
            simulator: MonteCarloSimulator::new(config.clone()),
            aggregator: Aggregator::new(config.clone()),
            synthesizer: RecommendationSynthesizer::default(),
            config,
        }
    }

    /// Replace the recommendation rule table
    pub fn with_rule_table(mut self, table: RuleTable) -> Self {
        self.synthesizer = RecommendationSynthesizer::new(table);
        self
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Project the fused assessment forward in time
    pub fn predict(
        &self,
        fused: &FusedIntelligence,
        request: &PredictionRequest,
    ) -> Result<PredictiveIntelligence> {
        let confidence_level = request
            .confidence_level
            .unwrap_or(self.config.confidence_level);
        if !(0.0..1.0).contains(&confidence_level) || confidence_level <= 0.0 {
            return Err(AugurError::validation(format!(
                "confidence_level {} must be in (0, 1)",
                confidence_level
            )));
        }
        if request.timeframe.periods == 0 {
            return Err(AugurError::validation("timeframe must cover at least 1 period"));
        }
        let num_simulations = request
            .num_simulations
            .unwrap_or(self.config.default_num_simulations);

        let mut warnings = Vec::new();
        let scenarios = match &request.scenarios {
            Some(custom) => {
                self.generator.validate(custom)?;
                let sum: f64 = custom.iter().map(|s| s.probability_weight).sum();
                if (sum - 1.0).abs() > f64::EPSILON && (sum - 1.0).abs() <= WEIGHT_TOLERANCE {
                    warnings.push(PredictionWarning::WeightsRenormalized { original_sum: sum });
                    custom
                        .iter()
                        .map(|s| Scenario {
                            probability_weight: s.probability_weight / sum,
                            ..s.clone()
                        })
                        .collect()
                } else {
                    custom.clone()
                }
            }
            None => self.generator.generate(fused),
        };

        // Assessment index on a 0–100 scale unless the caller overrides
        let base_value = request
            .base_value
            .unwrap_or(fused.overall_confidence * 100.0);
        let base_seed = request.seed.unwrap_or_else(rand::random);

        let ensemble = self.simulator.run(
            base_value,
            &scenarios,
            request.timeframe.periods,
            num_simulations,
            base_seed,
            request.deadline,
        )?;

        if ensemble.discard_rate() > self.config.discard_warn_fraction {
            warnings.push(PredictionWarning::HighDiscardRate {
                discarded: ensemble.discarded,
                dispatched: ensemble.dispatched,
            });
        }
        if ensemble.completed < ensemble.requested {
            warnings.push(PredictionWarning::PartialCompletion {
                completed: ensemble.completed,
                requested: ensemble.requested,
            });
        }

        let aggregated = self.aggregator.aggregate(
            &ensemble,
            &scenarios,
            fused.confidence_spread,
            confidence_level,
        )?;

        let ctx = RecommendationContext {
            overall_confidence: fused.overall_confidence,
            base_value,
            risk: &aggregated.risk,
            uncertainty: &aggregated.uncertainty,
            gaps: &fused.intelligence_gaps,
        };
        let recommendations = self.synthesizer.synthesize(&ctx);

        let scenario_label = scenarios
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("+");

        info!(
            timeframe = %request.timeframe.label(),
            scenarios = %scenario_label,
            requested = ensemble.requested,
            completed = ensemble.completed,
            discarded = ensemble.discarded,
            warnings = warnings.len(),
            "prediction complete"
        );

        Ok(PredictiveIntelligence {
            prediction_id: Uuid::new_v4(),
            timeframe: request.timeframe,
            scenario_label,
            predictions: aggregated.predictions,
            confidence_intervals: aggregated.intervals,
            risk_assessment: aggregated.risk,
            uncertainty_metrics: aggregated.uncertainty,
            recommendations,
            warnings,
            metadata: SimulationMetadata {
                requested_simulations: ensemble.requested,
                actual_simulations_run: ensemble.completed,
                discarded_trials: ensemble.discarded,
                base_seed,
                elapsed_ms: ensemble.elapsed_ms,
            },
        })
    }
}
