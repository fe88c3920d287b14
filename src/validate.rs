//! ═══════════════════════════════════════════════════════════════════════════════
//! VALIDATE — Report Validation and Filtering
//! ═══════════════════════════════════════════════════════════════════════════════
//! First stage of the pipeline. Two distinct failure modes:
//! - Out-of-range numeric fields are a hard ValidationError (the submission
//!   is corrupt, not merely weak)
//! - Sub-threshold confidence or empty fields discard the single report,
//!   recorded with a reason so gap analysis can see what was dropped
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::FusionConfig;
use crate::error::{AugurError, Result};
use crate::report::IntelligenceReport;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ═══════════════════════════════════════════════════════════════════════════════
// DISCARD RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Why a report was dropped (as opposed to rejected with an error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReason {
    /// Confidence below the configured floor
    BelowConfidenceFloor,
    /// Empty source_id
    EmptySourceId,
    /// Empty content payload
    EmptyContent,
}

impl DiscardReason {
    pub fn describe(&self) -> &'static str {
        match self {
            DiscardReason::BelowConfidenceFloor => "confidence below floor",
            DiscardReason::EmptySourceId => "empty source id",
            DiscardReason::EmptyContent => "empty content",
        }
    }
}

/// One discarded report with its reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedReport {
    pub source_id: String,
    pub reason: DiscardReason,
}

/// Validation output: the retained subset plus discard records
#[derive(Debug, Clone)]
pub struct ValidatedReports {
    pub retained: Vec<IntelligenceReport>,
    pub discarded: Vec<DiscardedReport>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Filters and sanity-checks incoming reports
#[derive(Debug, Clone)]
pub struct ReportValidator {
    config: FusionConfig,
}

impl ReportValidator {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Validate a batch of reports.
    ///
    /// Fails with `ValidationError` on out-of-range numeric fields; drops
    /// (with a recorded reason) reports that are merely weak or empty.
    pub fn validate(&self, reports: &[IntelligenceReport]) -> Result<ValidatedReports> {
        let mut retained = Vec::with_capacity(reports.len());
        let mut discarded = Vec::new();

        for report in reports {
            check_numeric_fields(report)?;

            let reason = if report.source_id.trim().is_empty() {
                Some(DiscardReason::EmptySourceId)
            } else if report.content.trim().is_empty() {
                Some(DiscardReason::EmptyContent)
            } else if report.confidence < self.config.min_confidence {
                Some(DiscardReason::BelowConfidenceFloor)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!(
                        source_id = %report.source_id,
                        reason = reason.describe(),
                        confidence = report.confidence,
                        "report discarded"
                    );
                    discarded.push(DiscardedReport {
                        source_id: report.source_id.clone(),
                        reason,
                    });
                }
                None => retained.push(report.clone()),
            }
        }

        Ok(ValidatedReports {
            retained,
            discarded,
        })
    }
}

/// Hard checks: a report with corrupt numerics rejects the whole batch
fn check_numeric_fields(report: &IntelligenceReport) -> Result<()> {
    if !report.confidence.is_finite() || !(0.0..=1.0).contains(&report.confidence) {
        return Err(AugurError::validation(format!(
            "report '{}': confidence {} outside [0, 1]",
            report.source_id, report.confidence
        )));
    }
    if let Some(reliability) = report.reliability_score {
        if !reliability.is_finite() || !(0.0..=1.0).contains(&reliability) {
            return Err(AugurError::validation(format!(
                "report '{}': reliability_score {} outside [0, 1]",
                report.source_id, reliability
            )));
        }
    }
    if let Some(location) = &report.location {
        if !location.is_valid() {
            return Err(AugurError::validation(format!(
                "report '{}': location ({}, {}) out of range",
                report.source_id, location.lat, location.lon
            )));
        }
    }
    Ok(())
}
