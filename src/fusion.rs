//! ═══════════════════════════════════════════════════════════════════════════════
//! FUSION — Weighted Multi-Source Assessment
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Combines validated, correlated reports into one assessment:
//! - Per-report weight = reliability × confidence, near-duplicates from the
//!   same discipline discounted, then normalized to sum to 1
//! - Overall confidence = weighted confidence sum, boosted (bounded) when
//!   independent disciplines corroborate each other
//! - A single surviving report is penalized and flagged as uncorroborated
//! - Gap analysis: missing disciplines, uncovered time windows, uncovered
//!   expected regions
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::FusionConfig;
use crate::correlate::{CorrelationAnalyzer, CorrelationMatrix};
use crate::error::{AugurError, Result};
use crate::report::{IntelligenceReport, SourceType};
use crate::stats::population_std;
use crate::validate::ReportValidator;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// GAPS
// ═══════════════════════════════════════════════════════════════════════════════

/// How serious a coverage gap is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Kind of coverage gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapType {
    /// An entire discipline contributed no retained reports
    SourceType,
    /// A window of the analysis horizon has no coverage
    Temporal,
    /// An expected region has no located reports
    Spatial,
    /// Only one report survived; nothing corroborates it
    NoCorroboration,
}

/// One detected coverage gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceGap {
    pub gap_type: GapType,
    pub description: String,
    pub severity: Severity,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUSED INTELLIGENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// The fused assessment. Created once per fusion invocation, never mutated;
/// a new fusion produces a new object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedIntelligence {
    pub fused_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Source ids of the reports that survived validation, weight-ordered
    pub sources_used: Vec<String>,
    /// Weight-ordered combination of report contents (see SummaryPolicy)
    pub fused_content: String,
    /// Combined confidence in [0, 1]
    pub overall_confidence: f64,
    /// Population std of retained report confidences; seeds initial uncertainty
    pub confidence_spread: f64,
    pub source_correlations: CorrelationMatrix,
    pub intelligence_gaps: Vec<IntelligenceGap>,
    /// Reports dropped by validation
    pub discarded_reports: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUMMARY POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// A report paired with its normalized fusion weight
#[derive(Debug, Clone, Copy)]
pub struct RankedReport<'a> {
    pub report: &'a IntelligenceReport,
    pub weight: f64,
}

/// Pluggable strategy for combining report contents into `fused_content`.
/// Input is already sorted by descending weight.
pub trait SummaryPolicy: Send + Sync {
    fn summarize(&self, ranked: &[RankedReport<'_>]) -> String;
}

/// Default policy: one line per report, highest weight first, each prefixed
/// with discipline, source id, and weight
#[derive(Debug, Clone)]
pub struct WeightOrderedSummary {
    pub snippet_len: usize,
}

impl SummaryPolicy for WeightOrderedSummary {
    fn summarize(&self, ranked: &[RankedReport<'_>]) -> String {
        ranked
            .iter()
            .map(|r| {
                let snippet: String = r.report.content.chars().take(self.snippet_len).collect();
                format!(
                    "[{} {} w={:.3}] {}",
                    r.report.source_type.name(),
                    r.report.source_id,
                    r.weight,
                    snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUSION ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Orchestrates validate → correlate → weight → fuse → gap analysis
pub struct FusionEngine {
    config: FusionConfig,
    validator: ReportValidator,
    analyzer: CorrelationAnalyzer,
    summary: Box<dyn SummaryPolicy>,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        let summary = Box::new(WeightOrderedSummary {
            snippet_len: config.summary_snippet_len,
        });
        Self {
            validator: ReportValidator::new(config.clone()),
            analyzer: CorrelationAnalyzer::new(config.clone()),
            config,
            summary,
        }
    }

    /// Replace the content summarization policy
    pub fn with_summary_policy(mut self, policy: Box<dyn SummaryPolicy>) -> Self {
        self.summary = policy;
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse a batch of reports into a single weighted assessment
    pub fn fuse(&self, reports: &[IntelligenceReport]) -> Result<FusedIntelligence> {
        let validated = self.validator.validate(reports)?;
        let retained = validated.retained;
        if retained.is_empty() {
            return Err(AugurError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let matrix = self.analyzer.analyze(&retained);

        let weights = self.normalized_weights(&retained, &matrix);
        let (overall_confidence, corroborating_pairs) =
            self.overall_confidence(&retained, &weights, &matrix);

        // Weight-ordered view for content and sources_used
        let mut order: Vec<usize> = (0..retained.len()).collect();
        order.sort_by(|&a, &b| {
            weights[b]
                .partial_cmp(&weights[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| retained[a].source_id.cmp(&retained[b].source_id))
        });
        let ranked: Vec<RankedReport<'_>> = order
            .iter()
            .map(|&i| RankedReport {
                report: &retained[i],
                weight: weights[i],
            })
            .collect();
        let fused_content = self.summary.summarize(&ranked);
        let sources_used: Vec<String> = ranked
            .iter()
            .map(|r| r.report.source_id.clone())
            .collect();

        let intelligence_gaps = self.detect_gaps(&retained);

        let confidences: Vec<f64> = retained.iter().map(|r| r.confidence).collect();
        let confidence_spread = population_std(&confidences);

        info!(
            sources = retained.len(),
            discarded = validated.discarded.len(),
            corroborating_pairs,
            overall_confidence,
            gaps = intelligence_gaps.len(),
            "fusion complete"
        );

        Ok(FusedIntelligence {
            fused_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sources_used,
            fused_content,
            overall_confidence,
            confidence_spread,
            source_correlations: matrix,
            intelligence_gaps,
            discarded_reports: validated.discarded.len(),
        })
    }

    /// Per-report weights: reliability × confidence, near-duplicate discount,
    /// then normalized to sum to 1
    fn normalized_weights(
        &self,
        retained: &[IntelligenceReport],
        matrix: &CorrelationMatrix,
    ) -> Vec<f64> {
        let mut weights: Vec<f64> = retained.iter().map(|r| r.effective_weight()).collect();

        // Redundancy: same discipline, near-duplicate content → discount the
        // later-arriving report so the same evidence is not counted twice
        for i in 0..retained.len() {
            for j in (i + 1)..retained.len() {
                if retained[i].source_type != retained[j].source_type {
                    continue;
                }
                let semantic = matrix
                    .get(&retained[i].source_id, &retained[j].source_id)
                    .map(|p| p.semantic)
                    .unwrap_or(0.0);
                if semantic > self.config.near_duplicate_threshold {
                    let later = if retained[j].timestamp >= retained[i].timestamp {
                        j
                    } else {
                        i
                    };
                    weights[later] *= self.config.duplicate_discount;
                }
            }
        }

        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        }
        weights
    }

    /// Weighted confidence with corroboration bonus, or the single-survivor
    /// penalty product. Returns (confidence, corroborating pair count).
    fn overall_confidence(
        &self,
        retained: &[IntelligenceReport],
        weights: &[f64],
        matrix: &CorrelationMatrix,
    ) -> (f64, usize) {
        if retained.len() == 1 {
            let only = &retained[0];
            let confidence =
                only.confidence * only.reliability() * self.config.uncorroborated_penalty;
            return (confidence.clamp(0.0, 1.0), 0);
        }

        let base: f64 = retained
            .iter()
            .zip(weights)
            .map(|(r, w)| w * r.confidence)
            .sum();

        // Corroboration: independent disciplines agreeing on content
        let mut corroborating_pairs = 0;
        for i in 0..retained.len() {
            for j in (i + 1)..retained.len() {
                if retained[i].source_type == retained[j].source_type {
                    continue;
                }
                let semantic = matrix
                    .get(&retained[i].source_id, &retained[j].source_id)
                    .map(|p| p.semantic)
                    .unwrap_or(0.0);
                if semantic >= self.config.semantic_similarity_threshold {
                    corroborating_pairs += 1;
                }
            }
        }

        let bonus = (corroborating_pairs as f64 * self.config.corroboration_bonus_per_pair)
            .min(self.config.corroboration_bonus_cap);
        let confidence = (base * (1.0 + bonus)).clamp(0.0, 1.0);
        (confidence, corroborating_pairs)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // GAP ANALYSIS
    // ═══════════════════════════════════════════════════════════════════════

    fn detect_gaps(&self, retained: &[IntelligenceReport]) -> Vec<IntelligenceGap> {
        let mut gaps = Vec::new();
        self.source_type_gaps(retained, &mut gaps);
        self.temporal_gaps(retained, &mut gaps);
        self.spatial_gaps(retained, &mut gaps);

        if retained.len() == 1 {
            gaps.push(IntelligenceGap {
                gap_type: GapType::NoCorroboration,
                description: format!(
                    "single source '{}'; assessment rests on uncorroborated reporting",
                    retained[0].source_id
                ),
                severity: Severity::Moderate,
            });
        }
        gaps
    }

    /// A discipline with no retained reports. Severity scales with how much
    /// reliability the missing discipline would have contributed.
    fn source_type_gaps(&self, retained: &[IntelligenceReport], gaps: &mut Vec<IntelligenceGap>) {
        for &source_type in SourceType::all() {
            if retained.iter().any(|r| r.source_type == source_type) {
                continue;
            }
            let reliability = source_type.default_reliability();
            let severity = if reliability >= 0.9 {
                Severity::High
            } else if reliability >= 0.8 {
                Severity::Moderate
            } else {
                Severity::Low
            };
            gaps.push(IntelligenceGap {
                gap_type: GapType::SourceType,
                description: format!("no {} coverage", source_type.name()),
                severity,
            });
        }
    }

    /// Windows of the analysis horizon (earliest to latest retained report,
    /// split into temporal_window_hours slices) with zero coverage
    fn temporal_gaps(&self, retained: &[IntelligenceReport], gaps: &mut Vec<IntelligenceGap>) {
        let window_hours = self.config.temporal_window_hours;
        if retained.len() < 2 || window_hours <= 0.0 {
            return;
        }
        let start = match retained.iter().map(|r| r.timestamp).min() {
            Some(t) => t,
            None => return,
        };
        let end = match retained.iter().map(|r| r.timestamp).max() {
            Some(t) => t,
            None => return,
        };
        let span_hours = (end - start).num_seconds() as f64 / 3600.0;
        let window_count = (span_hours / window_hours).ceil() as usize;
        if window_count < 2 {
            return;
        }

        let mut empty_windows = Vec::new();
        for w in 0..window_count {
            let window_start = start + Duration::seconds((w as f64 * window_hours * 3600.0) as i64);
            let window_end =
                start + Duration::seconds(((w + 1) as f64 * window_hours * 3600.0) as i64);
            let covered = retained
                .iter()
                .any(|r| r.timestamp >= window_start && r.timestamp < window_end)
                || (w == window_count - 1 && retained.iter().any(|r| r.timestamp == end));
            if !covered {
                empty_windows.push((w, window_start, window_end));
            }
        }

        let missing_fraction = empty_windows.len() as f64 / window_count as f64;
        let severity = if missing_fraction >= 0.5 {
            Severity::High
        } else if missing_fraction >= 0.25 {
            Severity::Moderate
        } else {
            Severity::Low
        };
        for (w, window_start, window_end) in empty_windows {
            gaps.push(IntelligenceGap {
                gap_type: GapType::Temporal,
                description: format!(
                    "no coverage in window {} ({} to {})",
                    w,
                    window_start.format("%Y-%m-%d %H:%M"),
                    window_end.format("%Y-%m-%d %H:%M")
                ),
                severity,
            });
        }
    }

    /// Expected regions with no located report inside their radius
    fn spatial_gaps(&self, retained: &[IntelligenceReport], gaps: &mut Vec<IntelligenceGap>) {
        for region in &self.config.expected_regions {
            let covered = retained.iter().any(|r| {
                r.location
                    .map(|loc| loc.distance_km(&region.center) <= region.radius_km)
                    .unwrap_or(false)
            });
            if !covered {
                gaps.push(IntelligenceGap {
                    gap_type: GapType::Spatial,
                    description: format!(
                        "no located reporting within {} km of region '{}'",
                        region.radius_km, region.name
                    ),
                    severity: Severity::High,
                });
            }
        }
    }
}
