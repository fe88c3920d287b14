//! ═══════════════════════════════════════════════════════════════════════════════
//! SIMULATE — Monte Carlo Trial Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Runs independent stochastic trials of the multiplicative recurrence
//!
//! ```text
//! value[t] = value[t-1] × (1 + drift + volatility × Z_t)
//! ```
//!
//! across a fixed-size worker pool:
//! - Trials are allocated to scenarios proportionally to probability weight
//!   and split into batches planned up front (the only shared table, read-only)
//! - Workers pull batches from a bounded channel, accumulate local partials
//!   (period sums, Welford moments, drawdowns, reservoir paths), and send
//!   them back for reduction
//! - Partials are merged in batch-id order, so the aggregate is invariant to
//!   completion order and byte-reproducible under a fixed seed
//! - A deadline stops batch dispatch; in-flight batches finish whole
//! - Non-finite trials are discarded; the discard rate escalates per config
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::PredictionConfig;
use crate::error::{AugurError, Result};
use crate::scenario::Scenario;
use crate::stats::Moments;
use crossbeam_channel::{bounded, unbounded};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// NOISE MODELS
// ═══════════════════════════════════════════════════════════════════════════════

/// Noise distribution for the stochastic recurrence. All variants are
/// standardized to zero mean and unit variance so scenario volatility retains
/// the same meaning across models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseModel {
    /// Standard normal via the Box–Muller transform
    StandardNormal,
    /// Uniform on (−√3, √3)
    Uniform,
    /// Laplace with unit variance, for heavy-tailed stress runs
    Laplace,
}

impl NoiseModel {
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            NoiseModel::StandardNormal => {
                // u1 in (0, 1] keeps the log finite
                let u1: f64 = 1.0 - rng.gen::<f64>();
                let u2: f64 = rng.gen::<f64>();
                (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
            }
            NoiseModel::Uniform => {
                let u: f64 = rng.gen::<f64>();
                3.0_f64.sqrt() * (2.0 * u - 1.0)
            }
            NoiseModel::Laplace => {
                let u: f64 = rng.gen::<f64>() - 0.5;
                let b = std::f64::consts::FRAC_1_SQRT_2;
                let t = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
                -b * u.signum() * t.ln()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEED DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Derive trial k's stream seed from (base_seed, k) through a SplitMix64
/// finalizer, so per-trial streams are decorrelated yet fully reproducible.
pub fn mix_seed(base_seed: u64, trial_index: u64) -> u64 {
    let mut z = base_seed.wrapping_add(trial_index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRIAL PLANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// One unit of worker work: a contiguous range of trial indices, all in the
/// same scenario
#[derive(Debug, Clone, Copy)]
pub struct TrialBatch {
    pub batch_id: usize,
    pub scenario_index: usize,
    pub trial_start: u64,
    pub trial_count: usize,
}

/// Proportional trial allocation: floor(n × weight) per scenario, leftover
/// trials to the highest-weight scenario so the total stays exact
pub fn allocate_trials(scenarios: &[Scenario], num_simulations: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = scenarios
        .iter()
        .map(|s| (num_simulations as f64 * s.probability_weight).floor() as usize)
        .collect();
    let allocated: usize = counts.iter().sum();
    let leftover = num_simulations.saturating_sub(allocated);
    if leftover > 0 && !counts.is_empty() {
        let richest = scenarios
            .iter()
            .enumerate()
            .max_by(|a, b| {
                a.1.probability_weight
                    .partial_cmp(&b.1.probability_weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        counts[richest] += leftover;
    }
    counts
}

/// Split the allocation into batches with globally contiguous trial indices
fn plan_batches(counts: &[usize], batch_size: usize) -> Vec<TrialBatch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();
    let mut trial_start = 0u64;
    let mut batch_id = 0usize;
    for (scenario_index, &count) in counts.iter().enumerate() {
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(batch_size);
            batches.push(TrialBatch {
                batch_id,
                scenario_index,
                trial_start,
                trial_count: take,
            });
            batch_id += 1;
            trial_start += take as u64;
            remaining -= take;
        }
    }
    batches
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARTIALS AND ENSEMBLE
// ═══════════════════════════════════════════════════════════════════════════════

/// A full path kept for percentile estimation, tagged with its trial index
/// for deterministic ordering
#[derive(Debug, Clone)]
pub struct ReservoirPath {
    pub trial_index: u64,
    pub path: Vec<f64>,
}

/// Per-batch partial statistics accumulated worker-locally
#[derive(Debug, Clone)]
struct BatchPartial {
    batch_id: usize,
    scenario_index: usize,
    completed: usize,
    discarded: usize,
    period_sums: Vec<f64>,
    final_moments: Moments,
    tail_count: usize,
    drawdown_sum: f64,
    drawdown_worst: f64,
    reservoir: Vec<ReservoirPath>,
}

/// The reduced trial ensemble handed to the aggregator
#[derive(Debug, Clone)]
pub struct SimulationEnsemble {
    pub base_value: f64,
    pub num_periods: usize,
    /// Trials the caller asked for
    pub requested: usize,
    /// Trials actually handed to workers (completed + discarded)
    pub dispatched: usize,
    pub completed: usize,
    pub discarded: usize,
    /// Sum of value[t] over completed trials, per period
    pub period_sums: Vec<f64>,
    /// Moments of the final-period outcome distribution
    pub final_moments: Moments,
    /// Final moments per scenario, indexed like the input scenario set
    pub scenario_moments: Vec<Moments>,
    /// Completed trials with final value at or below the severity floor
    pub tail_count: usize,
    /// Sum over completed trials of each path's maximum drawdown
    pub drawdown_sum: f64,
    /// Worst per-path maximum drawdown
    pub drawdown_worst: f64,
    /// Stride-sampled complete paths, ordered by trial index
    pub reservoir: Vec<ReservoirPath>,
    /// Final value at or below this counts toward tail risk
    pub severity_floor: f64,
    pub deadline_expired: bool,
    pub base_seed: u64,
    pub elapsed_ms: u64,
}

impl SimulationEnsemble {
    /// Discarded trials as a fraction of dispatched (0 when none dispatched)
    pub fn discard_rate(&self) -> f64 {
        if self.dispatched == 0 {
            0.0
        } else {
            self.discarded as f64 / self.dispatched as f64
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only per-run context shared by all workers
struct TrialContext<'a> {
    scenarios: &'a [Scenario],
    noise: NoiseModel,
    base_value: f64,
    num_periods: usize,
    base_seed: u64,
    reservoir_stride: u64,
    severity_floor: f64,
}

/// Fixed-size worker pool running independent stochastic trials
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    config: PredictionConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Run the ensemble. Fails with `Numerical` when the discard rate exceeds
    /// the configured fail fraction; a deadline never fails, it truncates.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        base_value: f64,
        scenarios: &[Scenario],
        num_periods: usize,
        num_simulations: usize,
        base_seed: u64,
        deadline: Option<Duration>,
    ) -> Result<SimulationEnsemble> {
        if scenarios.is_empty() {
            return Err(AugurError::validation("no scenarios to simulate"));
        }
        if num_periods == 0 {
            return Err(AugurError::validation("num_periods must be at least 1"));
        }
        if num_simulations == 0 {
            return Err(AugurError::validation("num_simulations must be at least 1"));
        }
        if !base_value.is_finite() || base_value <= 0.0 {
            return Err(AugurError::validation(format!(
                "base_value {} must be finite and positive",
                base_value
            )));
        }

        let start = Instant::now();
        let counts = allocate_trials(scenarios, num_simulations);
        let batches = plan_batches(&counts, self.config.batch_size);
        let workers = self.config.effective_workers();
        let reservoir_stride =
            (num_simulations as u64).div_ceil(self.config.reservoir_capacity.max(1) as u64);
        let severity_floor = base_value * (1.0 - self.config.severity_loss_fraction);

        let ctx = TrialContext {
            scenarios,
            noise: self.config.noise,
            base_value,
            num_periods,
            base_seed,
            reservoir_stride: reservoir_stride.max(1),
            severity_floor,
        };

        let mut partials: Vec<BatchPartial> = Vec::with_capacity(batches.len());
        let mut dispatched_trials = 0usize;
        let mut deadline_expired = false;

        std::thread::scope(|s| {
            let (task_tx, task_rx) = bounded::<TrialBatch>(workers);
            let (result_tx, result_rx) = unbounded::<BatchPartial>();
            let ctx = &ctx;

            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move || {
                    for batch in task_rx.iter() {
                        let partial = run_batch(ctx, &batch);
                        if result_tx.send(partial).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);
            drop(result_tx);

            for batch in &batches {
                if let Some(limit) = deadline {
                    if start.elapsed() >= limit {
                        deadline_expired = true;
                        break;
                    }
                }
                if task_tx.send(*batch).is_err() {
                    break;
                }
                dispatched_trials += batch.trial_count;
            }
            drop(task_tx);

            partials = result_rx.iter().collect();
        });

        // Completion order is nondeterministic; merge order is not
        partials.sort_by_key(|p| p.batch_id);

        let mut ensemble = SimulationEnsemble {
            base_value,
            num_periods,
            requested: num_simulations,
            dispatched: dispatched_trials,
            completed: 0,
            discarded: 0,
            period_sums: vec![0.0; num_periods],
            final_moments: Moments::new(),
            scenario_moments: vec![Moments::new(); scenarios.len()],
            tail_count: 0,
            drawdown_sum: 0.0,
            drawdown_worst: 0.0,
            reservoir: Vec::new(),
            severity_floor,
            deadline_expired,
            base_seed,
            elapsed_ms: 0,
        };

        for partial in &partials {
            ensemble.completed += partial.completed;
            ensemble.discarded += partial.discarded;
            for (sum, add) in ensemble.period_sums.iter_mut().zip(&partial.period_sums) {
                *sum += add;
            }
            ensemble.final_moments.merge(&partial.final_moments);
            ensemble.scenario_moments[partial.scenario_index].merge(&partial.final_moments);
            ensemble.tail_count += partial.tail_count;
            ensemble.drawdown_sum += partial.drawdown_sum;
            if partial.drawdown_worst > ensemble.drawdown_worst {
                ensemble.drawdown_worst = partial.drawdown_worst;
            }
            ensemble.reservoir.extend(partial.reservoir.iter().cloned());
        }
        ensemble.reservoir.sort_by_key(|r| r.trial_index);
        ensemble.elapsed_ms = start.elapsed().as_millis() as u64;

        if deadline_expired {
            warn!(
                requested = num_simulations,
                completed = ensemble.completed,
                "deadline expired before all trials were dispatched"
            );
        }

        let discard_rate = ensemble.discard_rate();
        if ensemble.dispatched > 0 && discard_rate > self.config.discard_fail_fraction {
            return Err(AugurError::Numerical {
                discarded: ensemble.discarded,
                total: ensemble.dispatched,
            });
        }
        if discard_rate > self.config.discard_warn_fraction {
            warn!(
                discarded = ensemble.discarded,
                dispatched = ensemble.dispatched,
                "elevated trial discard rate"
            );
        }

        Ok(ensemble)
    }
}

/// Run one batch of trials, accumulating worker-local partials
fn run_batch(ctx: &TrialContext<'_>, batch: &TrialBatch) -> BatchPartial {
    let scenario = &ctx.scenarios[batch.scenario_index];
    let mut partial = BatchPartial {
        batch_id: batch.batch_id,
        scenario_index: batch.scenario_index,
        completed: 0,
        discarded: 0,
        period_sums: vec![0.0; ctx.num_periods],
        final_moments: Moments::new(),
        tail_count: 0,
        drawdown_sum: 0.0,
        drawdown_worst: 0.0,
        reservoir: Vec::new(),
    };

    let mut path = Vec::with_capacity(ctx.num_periods);
    for k in batch.trial_start..batch.trial_start + batch.trial_count as u64 {
        let mut rng = StdRng::seed_from_u64(mix_seed(ctx.base_seed, k));
        path.clear();
        let mut value = ctx.base_value;
        let mut aborted = false;

        for _ in 0..ctx.num_periods {
            let z = ctx.noise.sample(&mut rng);
            value *= 1.0 + scenario.drift + scenario.volatility * z;
            if !value.is_finite() {
                aborted = true;
                break;
            }
            path.push(value);
        }

        if aborted {
            partial.discarded += 1;
            debug!(trial = k, scenario = %scenario.name, "trial diverged, discarded");
            continue;
        }

        partial.completed += 1;
        for (sum, v) in partial.period_sums.iter_mut().zip(&path) {
            *sum += v;
        }
        let final_value = path[ctx.num_periods - 1];
        partial.final_moments.push(final_value);
        if final_value <= ctx.severity_floor {
            partial.tail_count += 1;
        }

        let drawdown = max_drawdown(ctx.base_value, &path);
        partial.drawdown_sum += drawdown;
        if drawdown > partial.drawdown_worst {
            partial.drawdown_worst = drawdown;
        }

        if k % ctx.reservoir_stride == 0 {
            partial.reservoir.push(ReservoirPath {
                trial_index: k,
                path: path.clone(),
            });
        }
    }
    partial
}

/// Largest peak-to-trough fractional decline along one path, starting from
/// the base value
fn max_drawdown(base_value: f64, path: &[f64]) -> f64 {
    let mut peak = base_value;
    let mut worst = 0.0;
    for &v in path {
        if v > peak {
            peak = v;
        } else if peak > 0.0 {
            let dd = (peak - v) / peak;
            if dd > worst {
                worst = dd;
            }
        }
    }
    worst
}
