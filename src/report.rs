//! ═══════════════════════════════════════════════════════════════════════════════
//! REPORT — Intelligence Report Data Model
//! ═══════════════════════════════════════════════════════════════════════════════
//! The input records of the pipeline:
//! - SourceType: closed enumeration of collection disciplines with a
//!   data-driven default reliability table (no inheritance, no dispatch)
//! - GeoPoint: latitude/longitude with haversine distance
//! - IntelligenceReport: one submission from a collector, immutable once built
//! ═══════════════════════════════════════════════════════════════════════════════

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection discipline of an intelligence report.
///
/// Each discipline carries a default reliability weight used when the
/// submitting collector does not assert one (see `default_reliability`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// Human intelligence (agents, informants)
    Humint,
    /// Signals intelligence (intercepted communications)
    Sigint,
    /// Open-source intelligence (public media, internet)
    Osint,
    /// Geospatial intelligence (mapping, terrain analysis)
    Geoint,
    /// Imagery intelligence (satellite, aerial photography)
    Imint,
    /// Measurement and signature intelligence (sensors, emissions)
    Masint,
}

impl SourceType {
    /// All disciplines, in canonical order
    pub fn all() -> &'static [SourceType] {
        &[
            SourceType::Humint,
            SourceType::Sigint,
            SourceType::Osint,
            SourceType::Geoint,
            SourceType::Imint,
            SourceType::Masint,
        ]
    }

    /// Default reliability weight for reports that omit `reliability_score`
    pub fn default_reliability(&self) -> f64 {
        match self {
            SourceType::Humint => 0.85,
            SourceType::Sigint => 0.90,
            SourceType::Osint => 0.70,
            SourceType::Geoint => 0.88,
            SourceType::Imint => 0.92,
            SourceType::Masint => 0.87,
        }
    }

    /// Canonical uppercase label
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Humint => "HUMINT",
            SourceType::Sigint => "SIGINT",
            SourceType::Osint => "OSINT",
            SourceType::Geoint => "GEOINT",
            SourceType::Imint => "IMINT",
            SourceType::Masint => "MASINT",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GEOPOINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Mean Earth radius in kilometers (IUGG)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point via the haversine formula
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_KM * c
    }

    /// Both coordinates finite and within geographic range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A named region where coverage is expected; supplied externally to drive
/// spatial gap detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRegion {
    /// Human-readable region name
    pub name: String,
    /// Region center
    pub center: GeoPoint,
    /// Coverage radius in kilometers
    pub radius_km: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTELLIGENCE REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// One intelligence report as submitted by a collector.
///
/// Immutable once built; the pipeline consumes it read-only. `confidence` is
/// the collector's own assertion; `reliability_score` is optional and falls
/// back to the source-type default table when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceReport {
    /// Unique per submission
    pub source_id: String,
    /// Collection discipline
    pub source_type: SourceType,
    /// Text payload
    pub content: String,
    /// Collection timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Optional collection location
    pub location: Option<GeoPoint>,
    /// Collector-asserted confidence in [0, 1]
    pub confidence: f64,
    /// Collector-asserted reliability in [0, 1]; defaulted per source type when absent
    pub reliability_score: Option<f64>,
    /// Classification label, opaque to this core
    pub classification: String,
}

impl IntelligenceReport {
    pub fn new(
        source_id: &str,
        source_type: SourceType,
        content: &str,
        timestamp: DateTime<Utc>,
        confidence: f64,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_type,
            content: content.to_string(),
            timestamp,
            location: None,
            confidence,
            reliability_score: None,
            classification: "UNCLASSIFIED".to_string(),
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(GeoPoint::new(lat, lon));
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability_score = Some(reliability);
        self
    }

    pub fn with_classification(mut self, classification: &str) -> Self {
        self.classification = classification.to_string();
        self
    }

    /// Asserted reliability, or the source-type default
    pub fn reliability(&self) -> f64 {
        self.reliability_score
            .unwrap_or_else(|| self.source_type.default_reliability())
    }

    /// Effective evidential weight before normalization: reliability × confidence
    pub fn effective_weight(&self) -> f64 {
        self.reliability() * self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reliability_table() {
        assert_eq!(SourceType::Humint.default_reliability(), 0.85);
        assert_eq!(SourceType::Sigint.default_reliability(), 0.90);
        assert_eq!(SourceType::Osint.default_reliability(), 0.70);
        assert_eq!(SourceType::Geoint.default_reliability(), 0.88);
        assert_eq!(SourceType::Imint.default_reliability(), 0.92);
        assert_eq!(SourceType::Masint.default_reliability(), 0.87);
        assert_eq!(SourceType::all().len(), 6);
    }

    #[test]
    fn test_reliability_fallback() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let report = IntelligenceReport::new("r1", SourceType::Osint, "convoy sighted", ts, 0.8);
        assert_eq!(report.reliability(), 0.70);

        let report = report.with_reliability(0.95);
        assert_eq!(report.reliability(), 0.95);
        assert!((report.effective_weight() - 0.76).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London is roughly 344 km
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let d = paris.distance_km(&london);
        assert!((d - 344.0).abs() < 5.0, "got {}", d);

        // Distance to self is zero
        assert!(paris.distance_km(&paris) < 1e-9);
    }

    #[test]
    fn test_geopoint_validity() {
        assert!(GeoPoint::new(45.0, 90.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_source_type_serde_uppercase() {
        let json = serde_json::to_string(&SourceType::Sigint).unwrap();
        assert_eq!(json, "\"SIGINT\"");
        let back: SourceType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SourceType::Sigint);
    }
}
