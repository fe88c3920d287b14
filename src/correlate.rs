//! ═══════════════════════════════════════════════════════════════════════════════
//! CORRELATE — Pairwise Report Correlation
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Three correlation views over the validated report set:
//! - Temporal: linear decay from 1 (same instant) to 0 at the window edge
//! - Spatial: linear haversine-distance decay within the cluster radius;
//!   pairs where either side lacks a location score 0
//! - Semantic: token-set Jaccard over normalized content
//!
//! Each pair carries the three component scores plus their weighted
//! combination. Downstream fusion reads the matrix to tell corroboration
//! (independent sources agreeing) from redundancy (near-duplicates).
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::FusionConfig;
use crate::report::IntelligenceReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ═══════════════════════════════════════════════════════════════════════════════
// CORRELATION MATRIX
// ═══════════════════════════════════════════════════════════════════════════════

/// Correlation scores for one unordered pair of reports, all in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCorrelation {
    pub source_a: String,
    pub source_b: String,
    pub temporal: f64,
    pub spatial: f64,
    pub semantic: f64,
    /// Weighted combination of the three views
    pub combined: f64,
}

/// Symmetric pairwise correlation matrix, stored as the upper triangle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pairs: Vec<SourceCorrelation>,
}

impl CorrelationMatrix {
    pub fn new(pairs: Vec<SourceCorrelation>) -> Self {
        Self { pairs }
    }

    /// Look up a pair in either order
    pub fn get(&self, a: &str, b: &str) -> Option<&SourceCorrelation> {
        self.pairs.iter().find(|p| {
            (p.source_a == a && p.source_b == b) || (p.source_a == b && p.source_b == a)
        })
    }

    pub fn pairs(&self) -> &[SourceCorrelation] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Mean combined score across all pairs (0 when there are none)
    pub fn mean_combined(&self) -> f64 {
        if self.pairs.is_empty() {
            return 0.0;
        }
        self.pairs.iter().map(|p| p.combined).sum::<f64>() / self.pairs.len() as f64
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYZER
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes the pairwise correlation matrix for a validated report set
#[derive(Debug, Clone)]
pub struct CorrelationAnalyzer {
    config: FusionConfig,
}

impl CorrelationAnalyzer {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Correlate every unordered pair of reports
    pub fn analyze(&self, reports: &[IntelligenceReport]) -> CorrelationMatrix {
        let tokens: Vec<BTreeSet<String>> =
            reports.iter().map(|r| tokenize(&r.content)).collect();

        let mut pairs = Vec::new();
        for i in 0..reports.len() {
            for j in (i + 1)..reports.len() {
                let temporal = self.temporal_score(&reports[i], &reports[j]);
                let spatial = self.spatial_score(&reports[i], &reports[j]);
                let semantic = jaccard(&tokens[i], &tokens[j]);
                let combined = self.combine(temporal, spatial, semantic);
                pairs.push(SourceCorrelation {
                    source_a: reports[i].source_id.clone(),
                    source_b: reports[j].source_id.clone(),
                    temporal,
                    spatial,
                    semantic,
                    combined,
                });
            }
        }
        CorrelationMatrix::new(pairs)
    }

    /// 1 at identical timestamps, linearly down to 0 at the window edge
    fn temporal_score(&self, a: &IntelligenceReport, b: &IntelligenceReport) -> f64 {
        let window = self.config.temporal_window_hours;
        if window <= 0.0 {
            return 0.0;
        }
        let dt_hours = (a.timestamp - b.timestamp).num_seconds().abs() as f64 / 3600.0;
        if dt_hours >= window {
            0.0
        } else {
            1.0 - dt_hours / window
        }
    }

    /// 1 at zero distance, linearly down to 0 at the cluster radius;
    /// 0 when either report lacks a location
    fn spatial_score(&self, a: &IntelligenceReport, b: &IntelligenceReport) -> f64 {
        let radius = self.config.spatial_cluster_km;
        match (&a.location, &b.location) {
            (Some(pa), Some(pb)) if radius > 0.0 => {
                let d = pa.distance_km(pb);
                if d >= radius {
                    0.0
                } else {
                    1.0 - d / radius
                }
            }
            _ => 0.0,
        }
    }

    fn combine(&self, temporal: f64, spatial: f64, semantic: f64) -> f64 {
        let wt = self.config.temporal_weight;
        let ws = self.config.spatial_weight;
        let wm = self.config.semantic_weight;
        let total = wt + ws + wm;
        if total <= 0.0 {
            return 0.0;
        }
        (wt * temporal + ws * spatial + wm * semantic) / total
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEMANTIC SIMILARITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Case-folded, punctuation-stripped token set
fn tokenize(content: &str) -> BTreeSet<String> {
    content
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard index of two token sets; empty-vs-empty scores 0
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
