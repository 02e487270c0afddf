//! IMM: RR-set sampling with a sample-size certificate.
//!
//! Two phases over one growing [`RrPool`]:
//!
//! 1. **Lower bound search.** For `i = 1..=⌊log2(n - 1)⌋` guess
//!    `x = n / 2^i`, grow the pool to `θ_i = λ' / x`, run greedy max-coverage
//!    and stop as soon as the covered fraction `F` certifies
//!    `n · F ≥ (1 + ε') · x`. The certified bound is `LB = n · F / (1 + ε')`
//!    (1 if no guess is certified).
//! 2. **Final sampling.** Grow the pool to `θ = λ* / LB` and run a last
//!    max-coverage pass.
//!
//! With probability at least `1 - n^-l` the result is a
//! `(1 - 1/e - ε)`-approximation. The outer loop runs `O(log n)` times.

use std::f64::consts::{E, LN_2};

use tracing::{debug, warn};

use crate::engine::deadline::Deadline;
use crate::engine::errors::ImError;
use crate::engine::graph::NodeId;
use crate::engine::ris::SketchOutcome;
use crate::engine::rr_sets::{Coverage, RrPool, RrSampler};

pub const DEFAULT_EPSILON: f64 = 0.5;
pub const DEFAULT_L: f64 = 1.0;

/// Accuracy and confidence knobs of IMM.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImmParams {
    /// Approximation slack `ε` in `(0, 1)`.
    pub epsilon: f64,
    /// Confidence exponent: failure probability is at most `n^-l`.
    pub l: f64,
    /// Hard cap on the pool size. The guarantee no longer holds when it binds.
    pub max_rr_sets: Option<usize>,
}

impl Default for ImmParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            l: DEFAULT_L,
            max_rr_sets: None,
        }
    }
}

impl ImmParams {
    pub fn validate(&self) -> Result<(), ImError> {
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(ImError::InvalidConfig(format!(
                "IMM epsilon must lie in (0, 1), got {}",
                self.epsilon
            )));
        }
        if !(self.l > 0.0 && self.l.is_finite()) {
            return Err(ImError::InvalidConfig(format!(
                "IMM confidence exponent must be positive, got {}",
                self.l
            )));
        }
        if self.max_rr_sets == Some(0) {
            return Err(ImError::InvalidConfig("IMM max_rr_sets must be at least 1".into()));
        }
        Ok(())
    }
}

/// `ln C(n, k)` as a difference of log sums.
pub fn log_cnk(n: usize, k: usize) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    let k = k.min(n - k);
    ((n - k + 1)..=n).map(|i| (i as f64).ln()).sum::<f64>()
        - (1..=k).map(|i| (i as f64).ln()).sum::<f64>()
}

/// Sample-size constants for one `(n, k, ε, l)` instance.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    n: f64,
    eps_prime: f64,
    lambda_prime: f64,
    lambda_star: f64,
}

impl Bounds {
    fn new(n: usize, k: usize, params: &ImmParams) -> Self {
        let nf = n as f64;
        let ln_n = nf.ln();
        let l = params.l * (1.0 + LN_2 / ln_n);
        let eps = params.epsilon;
        let eps_prime = 2f64.sqrt() * eps;
        let lcnk = log_cnk(n, k);

        let lambda_prime = (2.0 + 2.0 * eps_prime / 3.0) * (lcnk + l * ln_n + nf.log2().ln()) * nf
            / (eps_prime * eps_prime);
        let alpha = (l * ln_n + LN_2).sqrt();
        let beta = ((1.0 - 1.0 / E) * (lcnk + l * ln_n + LN_2)).sqrt();
        let lambda_star = 2.0 * nf * ((1.0 - 1.0 / E) * alpha + beta).powi(2) / (eps * eps);

        Self {
            n: nf,
            eps_prime,
            lambda_prime,
            lambda_star,
        }
    }
}

/// Pool growth honouring the optional cap.
struct Sampling<'s, 'g> {
    sampler: &'s RrSampler<'g>,
    pool: RrPool,
    cap: Option<usize>,
    capped: bool,
}

impl Sampling<'_, '_> {
    fn grow_to(&mut self, theta: f64) -> Result<(), ImError> {
        if !theta.is_finite() || theta < 0.0 {
            return Err(ImError::Numerical(format!("RR-set target {theta} is not finite")));
        }
        let mut target = theta.ceil().min(usize::MAX as f64) as usize;
        if let Some(cap) = self.cap {
            if target > cap {
                if !self.capped {
                    warn!(
                        requested = target,
                        cap,
                        "imm: RR-set cap reached, accuracy bound no longer holds"
                    );
                }
                self.capped = true;
                target = cap;
            }
        }
        let missing = target.saturating_sub(self.pool.total_len());
        self.pool.fill(self.sampler, missing)
    }

    fn select(&self, k: usize) -> (Coverage, f64) {
        let coverage = self.pool.max_coverage(k);
        let fraction = coverage.covered as f64 / self.pool.total_len().max(1) as f64;
        (coverage, fraction)
    }
}

/// Picks `budget` seeds with IMM.
pub fn imm(
    sampler: &RrSampler<'_>,
    budget: usize,
    params: &ImmParams,
    deadline: &Deadline,
) -> Result<SketchOutcome, ImError> {
    params.validate()?;
    let n = sampler.graph().node_count();
    if budget > n {
        return Err(ImError::InvalidConfig(format!(
            "budget {budget} exceeds node count {n}"
        )));
    }
    if budget == 0 {
        return Ok(SketchOutcome::default());
    }
    if budget == n {
        // C(n, n) = 1 and every node is chosen; nothing to estimate.
        return Ok(SketchOutcome {
            seeds: (0..n as u32).map(NodeId).collect(),
            marginal_gains: vec![1.0; n],
            spread: n as f64,
            rr_sets: 0,
        });
    }

    let bounds = Bounds::new(n, budget, params);
    let mut sampling = Sampling {
        sampler,
        pool: RrPool::new(n),
        cap: params.max_rr_sets,
        capped: false,
    };

    let mut lower_bound = 1.0;
    for i in 1..=(n - 1).ilog2() {
        deadline.check()?;
        let x = bounds.n / 2f64.powi(i as i32);
        sampling.grow_to(bounds.lambda_prime / x)?;
        let (_, fraction) = sampling.select(budget);
        debug!(
            iteration = i,
            x,
            rr_sets = sampling.pool.total_len(),
            fraction,
            "imm: lower bound search"
        );
        if bounds.n * fraction >= (1.0 + bounds.eps_prime) * x {
            lower_bound = bounds.n * fraction / (1.0 + bounds.eps_prime);
            break;
        }
        if sampling.capped {
            break;
        }
    }

    deadline.check()?;
    sampling.grow_to(bounds.lambda_star / lower_bound)?;
    deadline.check()?;
    let (coverage, fraction) = sampling.select(budget);
    let total = sampling.pool.total_len().max(1) as f64;
    debug!(
        lower_bound,
        rr_sets = sampling.pool.total_len(),
        fraction,
        "imm: final selection"
    );

    Ok(SketchOutcome {
        marginal_gains: coverage
            .gains
            .iter()
            .map(|&g| bounds.n * g as f64 / total)
            .collect(),
        seeds: coverage.seeds,
        spread: bounds.n * fraction,
        rr_sets: sampling.pool.total_len(),
    })
}
