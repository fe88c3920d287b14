//! ═══════════════════════════════════════════════════════════════════════════════
//! RECOMMEND — Data-Driven Guidance Synthesis
//! ═══════════════════════════════════════════════════════════════════════════════
//! Maps aggregated risk/uncertainty onto prioritized guidance strings. The
//! rules live in a threshold table (metric selector, comparison, threshold,
//! priority, message), so deployments extend them without touching the
//! simulation core. Coverage gaps feed in through a severity → priority map.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::aggregate::{RiskAssessment, UncertaintyMetrics};
use crate::fusion::{IntelligenceGap, Severity};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// RULE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which aggregated metric a rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// var_95 / base_value
    VarRatio,
    /// expected_shortfall / base_value
    ShortfallRatio,
    TailRisk,
    MaxDrawdown,
    UncertaintyGrowth,
    ModelUncertainty,
    OverallConfidence,
    UpsidePotential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Below,
    AtOrAbove,
}

/// One threshold rule. The message may contain `{value}`, replaced with the
/// observed metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub metric: MetricKind,
    pub comparison: Comparison,
    pub threshold: f64,
    /// 1 is most urgent
    pub priority: u8,
    pub message: String,
}

impl Rule {
    pub fn new(
        metric: MetricKind,
        comparison: Comparison,
        threshold: f64,
        priority: u8,
        message: &str,
    ) -> Self {
        Self {
            metric,
            comparison,
            threshold,
            priority,
            message: message.to_string(),
        }
    }

    fn fires(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Below => value < self.threshold,
            Comparison::AtOrAbove => value >= self.threshold,
        }
    }
}

/// The full rule set plus the gap severity → priority map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<Rule>,
    /// Gaps at or above this severity produce a collection recommendation
    pub gap_severity_floor: Severity,
    /// Priority assigned to gap-driven recommendations
    pub gap_priority: u8,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            rules: vec![
                Rule::new(
                    MetricKind::VarRatio,
                    Comparison::Below,
                    0.8,
                    1,
                    "Value-at-risk {value} of base: downside exceeds tolerance; escalate collection priority and re-task high-reliability sources",
                ),
                Rule::new(
                    MetricKind::TailRisk,
                    Comparison::AtOrAbove,
                    0.15,
                    1,
                    "Severe-loss probability {value}: prepare contingency posture for the pessimistic branch",
                ),
                Rule::new(
                    MetricKind::MaxDrawdown,
                    Comparison::AtOrAbove,
                    0.3,
                    2,
                    "Peak-to-trough exposure {value}: stage mitigations before committing resources",
                ),
                Rule::new(
                    MetricKind::UncertaintyGrowth,
                    Comparison::AtOrAbove,
                    3.0,
                    2,
                    "Uncertainty grows {value}x over the horizon: shorten the decision cycle or re-run with fresh reporting",
                ),
                Rule::new(
                    MetricKind::ModelUncertainty,
                    Comparison::AtOrAbove,
                    0.15,
                    3,
                    "Scenario weighting dominates the estimate ({value}): validate scenario assumptions before acting",
                ),
                Rule::new(
                    MetricKind::OverallConfidence,
                    Comparison::Below,
                    0.5,
                    1,
                    "Fused confidence {value} is weak: treat the forecast as indicative only and seek corroboration",
                ),
                Rule::new(
                    MetricKind::UpsidePotential,
                    Comparison::AtOrAbove,
                    0.2,
                    4,
                    "Upside potential {value}: favorable branch is material; position to exploit it",
                ),
            ],
            gap_severity_floor: Severity::Moderate,
            gap_priority: 2,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHESIZER
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the rules may read
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub overall_confidence: f64,
    pub base_value: f64,
    pub risk: &'a RiskAssessment,
    pub uncertainty: &'a UncertaintyMetrics,
    pub gaps: &'a [IntelligenceGap],
}

/// One piece of prioritized guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1 is most urgent
    pub priority: u8,
    pub message: String,
}

/// Pure function from context to ordered guidance
#[derive(Debug, Clone, Default)]
pub struct RecommendationSynthesizer {
    table: RuleTable,
}

impl RecommendationSynthesizer {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn synthesize(&self, ctx: &RecommendationContext<'_>) -> Vec<Recommendation> {
        let mut out = Vec::new();

        for rule in &self.table.rules {
            let value = read_metric(rule.metric, ctx);
            if rule.fires(value) {
                out.push(Recommendation {
                    priority: rule.priority,
                    message: rule.message.replace("{value}", &format!("{:.2}", value)),
                });
            }
        }

        for gap in ctx.gaps {
            if gap.severity >= self.table.gap_severity_floor {
                out.push(Recommendation {
                    priority: self.table.gap_priority,
                    message: format!(
                        "Coverage gap ({}): {}; task collection to close it",
                        gap.severity.name(),
                        gap.description
                    ),
                });
            }
        }

        out.sort_by_key(|r| r.priority);
        out
    }
}

fn read_metric(metric: MetricKind, ctx: &RecommendationContext<'_>) -> f64 {
    match metric {
        MetricKind::VarRatio => ctx.risk.var_95 / ctx.base_value,
        MetricKind::ShortfallRatio => ctx.risk.expected_shortfall / ctx.base_value,
        MetricKind::TailRisk => ctx.risk.tail_risk,
        MetricKind::MaxDrawdown => ctx.risk.max_drawdown,
        MetricKind::UncertaintyGrowth => ctx.uncertainty.uncertainty_growth,
        MetricKind::ModelUncertainty => ctx.uncertainty.model_uncertainty,
        MetricKind::OverallConfidence => ctx.overall_confidence,
        MetricKind::UpsidePotential => ctx.risk.upside_potential,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::GapType;

    fn calm_risk() -> RiskAssessment {
        RiskAssessment {
            volatility: 5.0,
            var_95: 90.0,
            expected_shortfall: 88.0,
            max_drawdown: 0.1,
            tail_risk: 0.02,
            upside_potential: 0.1,
        }
    }

    fn calm_uncertainty() -> UncertaintyMetrics {
        UncertaintyMetrics {
            initial_uncertainty: 0.05,
            final_uncertainty: 0.08,
            uncertainty_growth: 1.6,
            model_uncertainty: 0.03,
        }
    }

    #[test]
    fn test_calm_profile_fires_nothing() {
        let synthesizer = RecommendationSynthesizer::default();
        let risk = calm_risk();
        let uncertainty = calm_uncertainty();
        let ctx = RecommendationContext {
            overall_confidence: 0.8,
            base_value: 100.0,
            risk: &risk,
            uncertainty: &uncertainty,
            gaps: &[],
        };
        assert!(synthesizer.synthesize(&ctx).is_empty());
    }

    #[test]
    fn test_high_risk_fires_prioritized_guidance() {
        let synthesizer = RecommendationSynthesizer::default();
        let risk = RiskAssessment {
            volatility: 40.0,
            var_95: 60.0,
            expected_shortfall: 50.0,
            max_drawdown: 0.5,
            tail_risk: 0.3,
            upside_potential: 0.4,
        };
        let uncertainty = UncertaintyMetrics {
            initial_uncertainty: 0.05,
            final_uncertainty: 0.4,
            uncertainty_growth: 8.0,
            model_uncertainty: 0.2,
        };
        let ctx = RecommendationContext {
            overall_confidence: 0.45,
            base_value: 100.0,
            risk: &risk,
            uncertainty: &uncertainty,
            gaps: &[],
        };
        let recs = synthesizer.synthesize(&ctx);
        assert!(recs.len() >= 5);
        // Sorted: most urgent first
        for pair in recs.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        assert_eq!(recs[0].priority, 1);
    }

    #[test]
    fn test_metric_value_interpolated_into_message() {
        let synthesizer = RecommendationSynthesizer::default();
        let risk = RiskAssessment {
            tail_risk: 0.25,
            ..calm_risk()
        };
        let uncertainty = calm_uncertainty();
        let ctx = RecommendationContext {
            overall_confidence: 0.8,
            base_value: 100.0,
            risk: &risk,
            uncertainty: &uncertainty,
            gaps: &[],
        };
        let recs = synthesizer.synthesize(&ctx);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.contains("0.25"));
    }

    #[test]
    fn test_gap_guidance_respects_severity_floor() {
        let synthesizer = RecommendationSynthesizer::default();
        let risk = calm_risk();
        let uncertainty = calm_uncertainty();
        let gaps = vec![
            IntelligenceGap {
                gap_type: GapType::SourceType,
                description: "no IMINT coverage".to_string(),
                severity: Severity::High,
            },
            IntelligenceGap {
                gap_type: GapType::SourceType,
                description: "no OSINT coverage".to_string(),
                severity: Severity::Low,
            },
        ];
        let ctx = RecommendationContext {
            overall_confidence: 0.8,
            base_value: 100.0,
            risk: &risk,
            uncertainty: &uncertainty,
            gaps: &gaps,
        };
        let recs = synthesizer.synthesize(&ctx);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.contains("IMINT"));
    }

    #[test]
    fn test_custom_rule_extends_table() {
        let mut table = RuleTable::default();
        table.rules.push(Rule::new(
            MetricKind::ShortfallRatio,
            Comparison::Below,
            0.95,
            1,
            "Expected shortfall {value} of base",
        ));
        let synthesizer = RecommendationSynthesizer::new(table);
        let risk = calm_risk();
        let uncertainty = calm_uncertainty();
        let ctx = RecommendationContext {
            overall_confidence: 0.8,
            base_value: 100.0,
            risk: &risk,
            uncertainty: &uncertainty,
            gaps: &[],
        };
        let recs = synthesizer.synthesize(&ctx);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].message.contains("shortfall"));
    }
}
