//! Two-step primal attack: BKZ-β preprocessing followed by one sieve in
//! dimension η ≥ β on the projected sublattice.

use std::f64::consts::{E, PI};

use rayon::prelude::*;
use tracing::debug;

use super::reduction::{delta, grid, log2_add, sieve_memory_log2, Profile};
use super::require_lwe;
use crate::cost::{CostReport, Metric};
use crate::distribution::ProbabilityLaw;
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::{CostGoal, ExpectedNorm, StrategyOptions};

/// Sample counts tried.
const SAMPLE_GRID: u64 = 16;

/// Target coordinate statistics. Secret and error coordinates are scaled by
/// the root of their second moment so the target has unit-mean squares.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Target {
    /// ln sqrt(E[s^2]).
    ln_scale_s: f64,
    /// ln sqrt(E[e^2]).
    ln_scale_e: f64,
    /// Var[x^2] of a scaled coordinate, the larger of secret and error.
    spread: f64,
}

impl Target {
    /// Closed-form continuous Gaussians (E[x^4] = 3σ^4).
    fn gaussian(sigma_s: f64, sigma_e: f64) -> Self {
        Self {
            ln_scale_s: sigma_s.ln(),
            ln_scale_e: sigma_e.ln(),
            spread: 2.0,
        }
    }

    /// Moments read off the tabulated laws, mean and window clipping included.
    fn from_laws(secret: &ProbabilityLaw, error: &ProbabilityLaw) -> Option<Self> {
        let (s2, e2) = (secret.raw_moment(2), error.raw_moment(2));
        if s2 <= 0.0 || e2 <= 0.0 {
            return None;
        }
        let spread =
            |law: &ProbabilityLaw, m2: f64| (law.raw_moment(4) / (m2 * m2) - 1.0).max(0.0);
        Some(Self {
            ln_scale_s: 0.5 * s2.ln(),
            ln_scale_e: 0.5 * e2.ln(),
            spread: spread(secret, s2).max(spread(error, e2)),
        })
    }
}

/// Normalised embedding of one sample count.
#[derive(Clone, Copy, Debug)]
struct Instance {
    d: u64,
    log_vol: f64,
    log_q: f64,
    m: u64,
    spread: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Solution {
    rop: f64,
    red: f64,
    svp: f64,
    beta: u64,
    eta: u64,
    d: u64,
    m: u64,
}

impl Solution {
    fn better_than(&self, other: &Solution) -> bool {
        self.rop < other.rop || (self.rop == other.rop && self.beta < other.beta)
    }
}

/// ln of the expected norm of the scaled target projected onto η coordinates.
/// The worst case adds two standard deviations of the squared norm.
fn expected_norm_ln(eta: f64, spread: f64, options: &StrategyOptions) -> f64 {
    let mut squared = match options.expected_norm {
        ExpectedNorm::Chi => eta - 0.5,
        ExpectedNorm::Sqrt => eta,
    };
    if options.worst_case {
        squared += 2.0 * (eta * spread).sqrt();
    }
    0.5 * squared.ln()
}

/// Smallest η in `beta..=d` for which the projected target is shorter than
/// the Gaussian heuristic of the last η Gram–Schmidt vectors.
fn smallest_eta(instance: &Instance, beta: u64, options: &StrategyOptions) -> Option<u64> {
    let profile = Profile::new(
        options.red_shape,
        instance.d as usize,
        instance.log_vol,
        beta as f64,
        instance.log_q,
    );
    (beta..=instance.d).find(|&eta| {
        let eta_f = eta as f64;
        let gh = 0.5 * (eta_f / (2.0 * PI * E)).ln() + profile.tail_mean(eta as usize);
        expected_norm_ln(eta_f, instance.spread, options) <= gh
    })
}

fn evaluate(instance: &Instance, beta: u64, options: &StrategyOptions) -> Option<Solution> {
    let eta = smallest_eta(instance, beta, options)?;
    let red = options.red_cost_model.bkz_log2(beta as f64, instance.d as f64);
    let svp = options.sieve_cost.svp_log2(eta as f64);
    let rop = match options.goal {
        CostGoal::Gates => log2_add(red, svp),
        CostGoal::Time => red.max(svp),
    };
    Some(Solution {
        rop,
        red,
        svp,
        beta,
        eta,
        d: instance.d,
        m: instance.m,
    })
}

fn pick(best: Solution, s: Solution) -> Solution {
    if s.better_than(&best) {
        s
    } else {
        best
    }
}

fn search(instance: &Instance, options: &StrategyOptions) -> Option<Solution> {
    let betas: Vec<u64> = (2..=instance.d).collect();
    if options.parallel {
        betas
            .par_iter()
            .filter_map(|&beta| evaluate(instance, beta, options))
            .reduce_with(pick)
    } else {
        betas
            .iter()
            .filter_map(|&beta| evaluate(instance, beta, options))
            .reduce(pick)
    }
}

/// Minimises over the sample count.
fn solve(n: u64, q: u64, m: u64, target: &Target, options: &StrategyOptions) -> Option<Solution> {
    let log_q = (q as f64).ln();
    grid(1, m, SAMPLE_GRID)
        .into_iter()
        .filter_map(|m_prime| {
            let log_vol =
                m_prime as f64 * (log_q - target.ln_scale_e) - n as f64 * target.ln_scale_s;
            let instance = Instance {
                d: n + m_prime,
                log_vol,
                log_q,
                m: m_prime,
                spread: target.spread,
            };
            search(&instance, options)
        })
        .reduce(pick)
}

fn report(tag: &'static str, s: Solution) -> CostReport {
    CostReport::new(tag, s.rop)
        .with_log2(Metric::Red, s.red)
        .with_log2(Metric::Svp, s.svp)
        .with_log2(Metric::Mem, sieve_memory_log2(s.eta as f64))
        .with_integer(Metric::Beta, s.beta)
        .with_integer(Metric::Dimension, s.d)
        .with_integer(Metric::Eta, s.eta)
        .with_real(Metric::Delta, delta(s.beta as f64))
        .with_integer(Metric::Samples, s.m)
}

/// Two-step estimate on the discretized secret and error laws (MATZOV22 style).
pub fn two_step_advanced(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    if lwe.secret().gaussian_stddev().is_none() || lwe.error().gaussian_stddev().is_none() {
        return Err(EstimatorError::not_applicable(
            "two-step profile needs discrete Gaussian secret and error",
        ));
    }
    let (Some(secret), Some(error)) = (lwe.secret_law(), lwe.error_law()) else {
        return Err(EstimatorError::infeasible(
            "Gaussian law too wide to tabulate over Z_q",
        ));
    };
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("two-step attack needs at least one sample"));
    }
    let target = Target::from_laws(secret, error).ok_or(EstimatorError::DegenerateDistribution(
        "point-mass law has zero second moment",
    ))?;

    let solution = solve(lwe.n(), lwe.q(), lwe.m(), &target, options)
        .ok_or_else(|| EstimatorError::infeasible("no (β, η) pair succeeds"))?;
    debug!(beta = solution.beta, eta = solution.eta, rop = solution.rop, "two-step solution");
    Ok(report("two-step", solution))
}

/// Simplified two-step estimate from `(n, q, m, σ)` alone; the secret is
/// assumed to follow the error distribution.
pub fn two_step_simple(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("two-step attack needs at least one sample"));
    }
    let sigma = lwe.error_stddev();
    if sigma <= 0.0 {
        return Err(EstimatorError::DegenerateDistribution(
            "error distribution has zero variance",
        ));
    }

    let solution = solve(lwe.n(), lwe.q(), lwe.m(), &Target::gaussian(sigma, sigma), options)
        .ok_or_else(|| EstimatorError::infeasible("no (β, η) pair succeeds"))?;
    debug!(beta = solution.beta, eta = solution.eta, rop = solution.rop, "simple two-step solution");
    Ok(report("two-step-simple", solution))
}
