//! Dual distinguishing attack.

use std::f64::consts::{LN_2, PI};

use tracing::debug;

use super::reduction::{delta, grid, sieve_memory_log2, ReductionCostModel, SIEVE_VECTORS_EXPONENT};
use super::{noise_stddevs, require_lwe};
use crate::cost::{CostReport, Metric};
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::StrategyOptions;

const SAMPLE_GRID: u64 = 256;

/// Cost of one (β, d) point of the dual attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DualPoint {
    /// BKZ cost including the extra short vectors beyond one sieve output.
    pub red_log2: f64,
    /// log2 of the number of short dual vectors needed to distinguish.
    pub repetitions_log2: f64,
}

/// Evaluates the dual attack with block size `beta` on `m'` samples, `d = n + m'`.
///
/// The secret part is rescaled by `c = σ_s / σ_e`, giving a dual lattice of
/// log volume `n·ln q + n·ln c`. A dual vector of length ℓ yields advantage
/// `ε = exp(-2π²(σ_e ℓ / q)²)` and `1/ε²` of them are needed; each BKZ run
/// returns `2^(0.2075β)` vectors for free.
pub(crate) fn dual_point(
    n: u64,
    q: u64,
    d: u64,
    beta: u64,
    sigma_s: f64,
    sigma_e: f64,
    model: ReductionCostModel,
) -> DualPoint {
    let beta_f = beta as f64;
    let d_f = d as f64;
    let n_f = n as f64;
    let q_f = q as f64;
    let c = sigma_s / sigma_e;
    let log_vol = n_f * q_f.ln() + n_f * c.ln();
    let log_len = d_f * delta(beta_f).ln() + log_vol / d_f;

    let ratio = sigma_e * log_len.exp() / q_f;
    // -log2(ε²) = 4π²(σ_e ℓ / q)² / ln 2
    let repetitions_log2 = 4.0 * PI * PI * ratio * ratio / LN_2;
    let extra = (repetitions_log2 - SIEVE_VECTORS_EXPONENT * beta_f).max(0.0);

    DualPoint {
        red_log2: model.bkz_log2(beta_f, d_f) + extra,
        repetitions_log2,
    }
}

/// Dual attack: find short vectors in the scaled dual lattice and use them
/// to distinguish the samples from uniform.
pub fn dual(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    let (sigma_s, sigma_e) = noise_stddevs(lwe)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("dual attack needs at least one sample"));
    }
    let n = lwe.n();

    let mut best: Option<(DualPoint, u64, u64, u64)> = None;
    for m_prime in grid(1, lwe.m(), SAMPLE_GRID) {
        let d = n + m_prime;
        for beta in 2..=d {
            let point = dual_point(n, lwe.q(), d, beta, sigma_s, sigma_e, options.red_cost_model);
            if !point.red_log2.is_finite() {
                continue;
            }
            if best.map_or(true, |(b, ..)| point.red_log2 < b.red_log2) {
                best = Some((point, beta, d, m_prime));
            }
        }
    }

    let (point, beta, d, m_prime) =
        best.ok_or_else(|| EstimatorError::infeasible("no finite dual attack cost"))?;
    debug!(beta, d, m = m_prime, rop = point.red_log2, "dual solution");

    Ok(CostReport::new("dual", point.red_log2)
        .with_log2(Metric::Mem, sieve_memory_log2(beta as f64))
        .with_integer(Metric::Beta, beta)
        .with_integer(Metric::Dimension, d)
        .with_real(Metric::Delta, delta(beta as f64))
        .with_log2(Metric::Repetitions, point.repetitions_log2)
        .with_integer(Metric::Samples, m_prime))
}
