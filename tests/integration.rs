//! Integration tests — end-to-end pipeline properties.
//!
//! Covers the cross-module guarantees: confidence bounds, interval ordering,
//! determinism, convergence, JSON round-trips, gap detection, and deadline
//! truncation.

use std::time::Duration;

use augur::{
    FusedIntelligence, FusionConfig, FusionEngine, GapType, IntelligenceReport, PredictionConfig,
    PredictionEngine, PredictionRequest, PredictiveIntelligence, Scenario, SourceType, Timeframe,
};
use chrono::{TimeZone, Utc};

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
}

fn make_report(
    id: &str,
    source_type: SourceType,
    content: &str,
    confidence: f64,
) -> IntelligenceReport {
    IntelligenceReport::new(id, source_type, content, base_time(), confidence)
}

/// Corroborating picture across four disciplines
fn standard_reports() -> Vec<IntelligenceReport> {
    vec![
        make_report(
            "humint-1",
            SourceType::Humint,
            "armored column moving north toward the river crossing",
            0.85,
        )
        .with_location(50.45, 30.52),
        make_report(
            "sigint-1",
            SourceType::Sigint,
            "armored column moving north toward the river crossing",
            0.8,
        )
        .with_location(50.5, 30.5),
        make_report(
            "imint-1",
            SourceType::Imint,
            "satellite imagery shows bridge traffic and staging",
            0.9,
        )
        .with_location(50.46, 30.54),
        make_report(
            "osint-1",
            SourceType::Osint,
            "social media reports of convoys on the northern road",
            0.7,
        ),
    ]
}

fn fuse_standard() -> FusedIntelligence {
    FusionEngine::new(FusionConfig::default())
        .fuse(&standard_reports())
        .unwrap()
}

fn fast_engine() -> PredictionEngine {
    PredictionEngine::new(PredictionConfig {
        worker_threads: 2,
        ..Default::default()
    })
}

/// P1: overall confidence stays in [0, 1] across input confidence sweeps
#[test]
fn pipeline_confidence_in_unit_interval() {
    let engine = FusionEngine::new(FusionConfig::default());
    for confidence in [0.6, 0.7, 0.85, 1.0] {
        let mut reports = standard_reports();
        for r in &mut reports {
            r.confidence = confidence;
        }
        let fused = engine.fuse(&reports).unwrap();
        assert!((0.0..=1.0).contains(&fused.overall_confidence));
    }
}

/// P2: corroborated independent sources beat the plain weighted average
#[test]
fn pipeline_corroboration_strictly_above_average() {
    let engine = FusionEngine::new(FusionConfig::default());
    let reports = vec![
        make_report("a", SourceType::Humint, "convoy at the northern bridge", 0.8),
        make_report("b", SourceType::Sigint, "convoy at the northern bridge", 0.8),
    ];
    let fused = engine.fuse(&reports).unwrap();
    assert!(fused.overall_confidence > 0.8);
}

/// P3: single-report scenario — penalty product and no-corroboration gap
#[test]
fn pipeline_single_report_scenario() {
    let engine = FusionEngine::new(FusionConfig::default());
    let report = make_report("lone", SourceType::Humint, "unverified sighting", 0.9)
        .with_reliability(0.85);
    let fused = engine.fuse(&[report]).unwrap();
    assert!((fused.overall_confidence - 0.6885).abs() < 1e-9);
    assert!(fused
        .intelligence_gaps
        .iter()
        .any(|g| g.gap_type == GapType::NoCorroboration));
}

/// P4: every report below the floor fails with insufficient data
#[test]
fn pipeline_all_below_floor_is_insufficient() {
    let engine = FusionEngine::new(FusionConfig::default());
    let reports = vec![
        make_report("a", SourceType::Osint, "rumor", 0.3),
        make_report("b", SourceType::Humint, "hearsay", 0.55),
    ];
    let err = engine.fuse(&reports).unwrap_err();
    assert!(matches!(err, augur::AugurError::InsufficientData { .. }));
}

/// P5: a report set missing a discipline yields a source-type gap for it
#[test]
fn pipeline_missing_discipline_gap() {
    let fused = fuse_standard();
    // GEOINT and MASINT are absent from the standard set
    let gap_text: Vec<&str> = fused
        .intelligence_gaps
        .iter()
        .filter(|g| g.gap_type == GapType::SourceType)
        .map(|g| g.description.as_str())
        .collect();
    assert!(gap_text.iter().any(|d| d.contains("GEOINT")));
    assert!(gap_text.iter().any(|d| d.contains("MASINT")));
}

/// P6: per-period bounds always bracket the point estimate
#[test]
fn pipeline_bounds_bracket_predictions() {
    let result = fast_engine()
        .predict(
            &fuse_standard(),
            &PredictionRequest::new(Timeframe::days(21))
                .with_simulations(3_000)
                .with_seed(17),
        )
        .unwrap();
    assert_eq!(result.predictions.len(), 21);
    for t in 0..21 {
        assert!(result.confidence_intervals.lower_bound[t] <= result.predictions[t]);
        assert!(result.predictions[t] <= result.confidence_intervals.upper_bound[t]);
    }
}

/// P7: scenario weights must sum to 1
#[test]
fn pipeline_bad_scenario_weights_rejected() {
    let bad = vec![
        Scenario::new("a", 0.0, 0.1, 0.6),
        Scenario::new("b", 0.0, 0.1, 0.6),
    ];
    let err = fast_engine()
        .predict(
            &fuse_standard(),
            &PredictionRequest::new(Timeframe::days(5)).with_scenarios(bad),
        )
        .unwrap_err();
    assert!(matches!(err, augur::AugurError::Validation { .. }));
}

/// P8: identical (reports, scenarios, seed) inputs produce byte-identical
/// forecast content. Identity fields (prediction_id) and wall-clock elapsed
/// time are excluded: they identify the invocation, not the result.
#[test]
fn pipeline_determinism_under_fixed_seed() {
    let fused = fuse_standard();
    let engine = fast_engine();
    let request = PredictionRequest::new(Timeframe::days(14))
        .with_simulations(4_000)
        .with_seed(2026);

    let a = engine.predict(&fused, &request).unwrap();
    let b = engine.predict(&fused, &request).unwrap();

    let forecast_json = |p: &PredictiveIntelligence| {
        serde_json::to_string(&(
            &p.predictions,
            &p.confidence_intervals,
            &p.risk_assessment,
            &p.uncertainty_metrics,
            &p.recommendations,
            &p.warnings,
            &p.scenario_label,
            p.metadata.actual_simulations_run,
            p.metadata.discarded_trials,
            p.metadata.base_seed,
        ))
        .unwrap()
    };
    assert_eq!(forecast_json(&a), forecast_json(&b));
}

/// P9: more simulations never widen the confidence interval (noise-bounded)
#[test]
fn pipeline_interval_width_converges() {
    let fused = fuse_standard();
    let engine = fast_engine();

    let mean_width = |n: usize| {
        let result = engine
            .predict(
                &fused,
                &PredictionRequest::new(Timeframe::days(10))
                    .with_simulations(n)
                    .with_seed(99),
            )
            .unwrap();
        let total: f64 = result
            .confidence_intervals
            .upper_bound
            .iter()
            .zip(&result.confidence_intervals.lower_bound)
            .map(|(u, l)| u - l)
            .sum();
        total / result.predictions.len() as f64
    };

    let w_1k = mean_width(1_000);
    let w_10k = mean_width(10_000);
    let w_100k = mean_width(100_000);
    // Allow a sampling-noise margin on the non-increasing width property
    assert!(w_10k <= w_1k * 1.15, "w_1k={} w_10k={}", w_1k, w_10k);
    assert!(w_100k <= w_10k * 1.15, "w_10k={} w_100k={}", w_10k, w_100k);
}

/// P10: both result records survive JSON round-trips exactly
#[test]
fn pipeline_json_round_trips() {
    let fused = fuse_standard();
    let json = serde_json::to_string(&fused).unwrap();
    let fused_back: FusedIntelligence = serde_json::from_str(&json).unwrap();
    assert_eq!(fused, fused_back);

    let result = fast_engine()
        .predict(
            &fused,
            &PredictionRequest::new(Timeframe::days(7))
                .with_simulations(1_000)
                .with_seed(5),
        )
        .unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let result_back: PredictiveIntelligence = serde_json::from_str(&json).unwrap();
    assert_eq!(result, result_back);
}

/// P11: a huge request under a short deadline returns a partial, annotated
/// result with a convergence warning
#[test]
fn pipeline_deadline_truncates_with_warning() {
    let result = fast_engine()
        .predict(
            &fuse_standard(),
            &PredictionRequest::new(Timeframe::days(100))
                .with_simulations(1_000_000)
                .with_seed(8)
                .with_deadline(Duration::from_millis(100)),
        )
        .unwrap();

    assert!(result.metadata.actual_simulations_run < 1_000_000);
    if result.metadata.actual_simulations_run < 500_000 {
        assert!(result.has_convergence_warning());
    }
}

/// P12: the full pipeline produces guidance when the picture is gapped
#[test]
fn pipeline_gapped_picture_yields_recommendations() {
    let engine = FusionEngine::new(FusionConfig::default());
    let fused = engine
        .fuse(&[make_report(
            "lone",
            SourceType::Osint,
            "single uncorroborated report",
            0.65,
        )])
        .unwrap();

    let result = fast_engine()
        .predict(
            &fused,
            &PredictionRequest::new(Timeframe::days(14))
                .with_simulations(2_000)
                .with_seed(3),
        )
        .unwrap();
    // Weak fused confidence plus coverage gaps must surface as guidance
    assert!(!result.recommendations.is_empty());
    for pair in result.recommendations.windows(2) {
        assert!(pair[0].priority <= pair[1].priority);
    }
}
