//! Runnable walkthrough of the fusion → prediction pipeline.
//!
//! Builds a six-report intelligence picture, fuses it, projects it 30 days
//! forward, and prints the assessment, risk profile, and guidance.
//!
//! Run with: cargo run --example fusion_demo

use augur::{
    FusionConfig, FusionEngine, IntelligenceReport, PredictionConfig, PredictionEngine,
    PredictionRequest, SourceType, Timeframe,
};
use chrono::{Duration, TimeZone, Utc};

fn banner(title: &str) {
    println!("\n═══════════════════════════════════════════════════════════════");
    println!("  {}", title);
    println!("═══════════════════════════════════════════════════════════════");
}

fn main() -> augur::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
    let reports = vec![
        IntelligenceReport::new(
            "humint-kyiv-04",
            SourceType::Humint,
            "Armored column observed moving north toward the river crossing, roughly battalion strength",
            t0,
            0.85,
        )
        .with_location(50.45, 30.52),
        IntelligenceReport::new(
            "sigint-int-112",
            SourceType::Sigint,
            "Intercepted traffic coordinating an armored column moving north to the river crossing",
            t0 + Duration::hours(3),
            0.82,
        )
        .with_location(50.50, 30.49),
        IntelligenceReport::new(
            "imint-sat-771",
            SourceType::Imint,
            "Satellite pass shows staging areas and bridge traffic at the northern crossing",
            t0 + Duration::hours(6),
            0.91,
        )
        .with_location(50.47, 30.55),
        IntelligenceReport::new(
            "osint-feed-23",
            SourceType::Osint,
            "Social media posts describe convoys on the northern road since early morning",
            t0 + Duration::hours(2),
            0.68,
        ),
        IntelligenceReport::new(
            "geoint-terr-9",
            SourceType::Geoint,
            "Terrain analysis: the crossing is the only viable axis for heavy vehicles this season",
            t0 + Duration::hours(12),
            0.88,
        )
        .with_location(50.48, 30.53),
        IntelligenceReport::new(
            "osint-feed-24",
            SourceType::Osint,
            "Low-quality rumor of activity in the south, unconfirmed",
            t0 + Duration::hours(20),
            0.45,
        ),
    ];

    banner("FUSION");
    let fusion = FusionEngine::new(FusionConfig::default());
    let fused = fusion.fuse(&reports)?;
    println!("fused id           : {}", fused.fused_id);
    println!("sources used       : {}", fused.sources_used.join(", "));
    println!("discarded reports  : {}", fused.discarded_reports);
    println!("overall confidence : {:.4}", fused.overall_confidence);
    println!("confidence spread  : {:.4}", fused.confidence_spread);
    println!("\n{}", fused.fused_content);

    banner("CORRELATION");
    for pair in fused.source_correlations.pairs() {
        println!(
            "{:<16} ↔ {:<16} temporal {:.2}  spatial {:.2}  semantic {:.2}  combined {:.2}",
            pair.source_a, pair.source_b, pair.temporal, pair.spatial, pair.semantic, pair.combined
        );
    }

    banner("INTELLIGENCE GAPS");
    if fused.intelligence_gaps.is_empty() {
        println!("none detected");
    }
    for gap in &fused.intelligence_gaps {
        println!("[{:<8}] {}", gap.severity.name(), gap.description);
    }

    banner("FORECAST (30 days, 10,000 trials)");
    let engine = PredictionEngine::new(PredictionConfig::default());
    let request = PredictionRequest::new(Timeframe::days(30)).with_seed(20260301);
    let result = engine.predict(&fused, &request)?;
    println!("scenarios : {}", result.scenario_label);
    println!("trials    : {} run, {} discarded, {} ms",
        result.metadata.actual_simulations_run,
        result.metadata.discarded_trials,
        result.metadata.elapsed_ms,
    );
    for t in [0, 6, 13, 20, 29] {
        println!(
            "day {:>2}  estimate {:>7.2}   [{:>7.2}, {:>7.2}]",
            t + 1,
            result.predictions[t],
            result.confidence_intervals.lower_bound[t],
            result.confidence_intervals.upper_bound[t],
        );
    }

    banner("RISK ASSESSMENT");
    let risk = &result.risk_assessment;
    println!("volatility         : {:.3}", risk.volatility);
    println!("VaR (95%)          : {:.3}", risk.var_95);
    println!("expected shortfall : {:.3}", risk.expected_shortfall);
    println!("max drawdown       : {:.1}%", risk.max_drawdown * 100.0);
    println!("tail risk          : {:.1}%", risk.tail_risk * 100.0);
    println!("upside potential   : {:.1}%", risk.upside_potential * 100.0);

    let unc = &result.uncertainty_metrics;
    println!("\nuncertainty: initial {:.3} → final {:.3} (growth {:.2}x, model {:.3})",
        unc.initial_uncertainty, unc.final_uncertainty, unc.uncertainty_growth, unc.model_uncertainty,
    );

    banner("RECOMMENDATIONS");
    if result.recommendations.is_empty() {
        println!("no guidance triggered; profile within tolerances");
    }
    for rec in &result.recommendations {
        println!("P{} — {}", rec.priority, rec.message);
    }

    for warning in &result.warnings {
        println!("\nwarning: {:?}", warning);
    }

    Ok(())
}
