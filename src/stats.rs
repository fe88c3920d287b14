//! ═══════════════════════════════════════════════════════════════════════════════
//! STATS — Shared Numeric Primitives
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Building blocks for the simulator and aggregator:
//! - Moments: streaming mean/variance/min/max with order-stable merge (Welford)
//! - percentile: linear-interpolated quantile over a sorted slice
//! - SampleSummary: descriptive snapshot of a sample
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// MOMENTS — Streaming Mean / Variance (Welford)
// ═══════════════════════════════════════════════════════════════════════════════

/// Streaming first and second moments plus extrema.
///
/// `push` uses Welford's update; `merge` uses the parallel-variance
/// combination so worker partials reduce to the same result as a single
/// sequential pass (given a fixed merge order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self::new()
    }
}

impl Moments {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add one sample
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }

    /// Combine with another accumulator (parallel variance formula)
    pub fn merge(&mut self, other: &Moments) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n1 = self.count as f64;
        let n2 = other.count as f64;
        let n = n1 + n2;
        let delta = other.mean - self.mean;
        self.m2 += other.m2 + delta * delta * n1 * n2 / n;
        self.mean = (self.mean * n1 + other.mean * n2) / n;
        self.count += other.count;
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation (0 for fewer than 2 samples)
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUANTILES
// ═══════════════════════════════════════════════════════════════════════════════

/// Quantile of a sorted slice at fraction `q` in [0, 1], with linear
/// interpolation between order statistics. Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation (0 for fewer than 2 samples)
pub fn population_std(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let var = samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / samples.len() as f64;
    var.sqrt()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAMPLE SUMMARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Descriptive snapshot of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl SampleSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            count: samples.len(),
            mean: mean(samples),
            std_dev: population_std(samples),
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            p25: percentile(&sorted, 0.25),
            p50: percentile(&sorted, 0.50),
            p75: percentile(&sorted, 0.75),
            p95: percentile(&sorted, 0.95),
        }
    }
}

/// Approximate float equality, for tests
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments_push() {
        let mut m = Moments::new();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            m.push(x);
        }
        assert_eq!(m.count(), 8);
        assert!(approx_eq(m.mean(), 5.0, 1e-12));
        // Known population std of this set is 2
        assert!(approx_eq(m.std_dev(), 2.0, 1e-12));
        assert_eq!(m.min(), 2.0);
        assert_eq!(m.max(), 9.0);
    }

    #[test]
    fn test_moments_merge_matches_sequential() {
        let samples = [1.5, 2.5, 3.5, 10.0, -4.0, 0.25, 6.0];

        let mut sequential = Moments::new();
        for &x in &samples {
            sequential.push(x);
        }

        let mut left = Moments::new();
        let mut right = Moments::new();
        for &x in &samples[..3] {
            left.push(x);
        }
        for &x in &samples[3..] {
            right.push(x);
        }
        left.merge(&right);

        assert_eq!(left.count(), sequential.count());
        assert!(approx_eq(left.mean(), sequential.mean(), 1e-12));
        assert!(approx_eq(left.std_dev(), sequential.std_dev(), 1e-12));
        assert_eq!(left.min(), sequential.min());
        assert_eq!(left.max(), sequential.max());
    }

    #[test]
    fn test_moments_merge_empty() {
        let mut m = Moments::new();
        m.push(3.0);
        let before = m;
        m.merge(&Moments::new());
        assert_eq!(m, before);

        let mut empty = Moments::new();
        empty.merge(&before);
        assert_eq!(empty, before);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.0), 10.0);
        assert_eq!(percentile(&sorted, 1.0), 40.0);
        assert!(approx_eq(percentile(&sorted, 0.5), 25.0, 1e-12));
        // Between the 1st and 2nd order statistics
        assert!(approx_eq(percentile(&sorted, 1.0 / 3.0), 20.0, 1e-12));
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[7.0], 0.95), 7.0);
    }

    #[test]
    fn test_sample_summary() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        let summary = SampleSummary::from_samples(&samples);
        assert_eq!(summary.count, 5);
        assert!(approx_eq(summary.mean, 3.0, 1e-12));
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert!(approx_eq(summary.p50, 3.0, 1e-12));
        assert!(approx_eq(summary.p25, 2.0, 1e-12));
    }
}
