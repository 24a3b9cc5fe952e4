//! Lattice attack on SIS: BKZ on the kernel lattice `{x : A x = 0 mod q}`.

use tracing::debug;

use super::reduction::{delta, erf, sieve_memory_log2, SIEVE_VECTORS_EXPONENT};
use super::require_sis;
use crate::cost::{CostReport, Metric};
use crate::error::EstimatorError;
use crate::params::{Norm, ProblemParameters, SampleCount};
use crate::strategy::StrategyOptions;

/// Largest block size searched.
const MAX_BETA: u64 = 2048;

/// Sub-dimension minimising the first GSA vector for BKZ-β,
/// `sqrt(n ln q / ln δ)`, clamped to the available columns.
fn optimal_dimension(n: u64, q: u64, beta: u64, m: SampleCount) -> u64 {
    let log_delta = delta(beta as f64).ln();
    let d = ((n as f64 * (q as f64).ln() / log_delta).sqrt().round() as u64).max(n + 1);
    match m.bound() {
        Some(m) => d.min(m),
        None => d,
    }
}

/// SIS lattice attack under the L2 or infinity norm.
///
/// For L2 the first reduced vector must be within the bound. For the
/// infinity norm the vector is treated as having Gaussian coordinates, and
/// enough vectors are sampled until one falls into the box.
pub fn sis_lattice(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let sis = require_sis(params)?;
    let (n, q, bound) = (sis.n(), sis.q(), sis.norm_bound());

    if bound >= q as f64 {
        debug!(bound, q, "q-vector already satisfies the bound");
        let d = sis.m().bound().map_or(n + 1, |m| m.min(n + 1));
        return Ok(CostReport::new("lattice", 0.0)
            .with_log2(Metric::Red, 0.0)
            .with_integer(Metric::Beta, 0)
            .with_integer(Metric::Dimension, d));
    }
    if let Some(m) = sis.m().bound() {
        if m <= n {
            return Err(EstimatorError::infeasible(format!(
                "kernel lattice needs more than n = {n} columns, got {m}"
            )));
        }
    }

    let log_q = (q as f64).ln();
    let mut best: Option<(f64, CostReport)> = None;
    for beta in 2..=MAX_BETA {
        let d = optimal_dimension(n, q, beta, sis.m());
        if beta > d {
            break;
        }
        let (beta_f, d_f) = (beta as f64, d as f64);
        let log_len = d_f * delta(beta_f).ln() + n as f64 * log_q / d_f;
        let length = log_len.exp();
        let red = options.red_cost_model.bkz_log2(beta_f, d_f);

        let (rop, prob, repetitions) = match sis.norm() {
            Norm::L2 if length <= bound => (red, 1.0, 0.0),
            Norm::L2 => continue,
            Norm::Linf => {
                let sigma = length / d_f.sqrt();
                let per_coordinate = erf(bound / (sigma * std::f64::consts::SQRT_2));
                let prob_log2 = d_f * per_coordinate.log2();
                let repetitions = (-prob_log2 - SIEVE_VECTORS_EXPONENT * beta_f).max(0.0);
                (red + repetitions, prob_log2.exp2(), repetitions)
            }
        };
        if !rop.is_finite() || best.as_ref().is_some_and(|(cost, _)| rop >= *cost) {
            continue;
        }

        let report = CostReport::new("lattice", rop)
            .with_log2(Metric::Red, red)
            .with_log2(Metric::Mem, sieve_memory_log2(beta_f))
            .with_integer(Metric::Beta, beta)
            .with_integer(Metric::Eta, beta)
            .with_integer(Metric::Dimension, d)
            .with_real(Metric::Delta, delta(beta_f))
            .with_real(Metric::Probability, prob)
            .with_log2(Metric::Repetitions, repetitions);
        best = Some((rop, report));

        if sis.norm() == Norm::L2 {
            // larger blocks only add cost once the bound is met
            break;
        }
    }

    let (rop, report) = best.ok_or_else(|| {
        EstimatorError::infeasible(format!("no block size up to {MAX_BETA} reaches length {bound}"))
    })?;
    debug!(rop, norm = %sis.norm(), "SIS lattice solution");
    Ok(report)
}
