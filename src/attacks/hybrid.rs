//! Hybrid attacks: guess ζ secret coordinates, attack the remaining
//! `n - ζ` dimensional instance with a lattice method.

use std::f64::consts::LN_2;

use tracing::debug;

use super::dual::dual_point;
use super::primal::usvp_search;
use super::reduction::{delta, gaussian_coverage, grid, ln_binomial, log2_add, log2_binomial, sieve_memory_log2};
use super::{noise_stddevs, require_lwe};
use crate::cost::{CostReport, Metric};
use crate::distribution::NoiseDistribution;
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::StrategyOptions;

/// Guessing dimensions tried.
const ZETA_GRID: u64 = 32;

/// Sample counts tried per guess for the dual hybrid.
const SAMPLE_GRID: u64 = 64;

/// Exhaustive-search description for ζ guessed coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Guess {
    /// log2 |S|
    space_log2: f64,
    /// log2 of the probability that the secret lies in S.
    prob_log2: f64,
    /// Non-zero entries searched over, sparse secrets only.
    h1: Option<u64>,
}

impl Guess {
    /// log2 of the candidates enumerated; meet-in-the-middle halves the exponent.
    fn enumerated_log2(&self, mitm: bool) -> f64 {
        if mitm {
            self.space_log2 / 2.0
        } else {
            self.space_log2
        }
    }
}

fn guess(secret: &NoiseDistribution, n: u64, zeta: u64) -> Result<Guess, EstimatorError> {
    if let Some(hw) = secret.hamming_weight() {
        let ternary = matches!(secret, NoiseDistribution::SparseTernary { .. });
        let h1 = ((hw as f64 * zeta as f64 / n as f64).round() as u64).min(hw).min(zeta);

        let mut space_log2 = f64::NEG_INFINITY;
        let mut prob_log2 = f64::NEG_INFINITY;
        let ln_total = ln_binomial(n, zeta);
        for i in 0..=h1 {
            let signs = if ternary { i as f64 } else { 0.0 };
            space_log2 = log2_add(space_log2, log2_binomial(zeta, i) + signs);
            // hypergeometric: i of the hw non-zero entries fall among the ζ guessed
            let ln_p = ln_binomial(hw, i) + ln_binomial(n - hw, zeta - i) - ln_total;
            prob_log2 = log2_add(prob_log2, ln_p / LN_2);
        }
        return Ok(Guess {
            space_log2,
            prob_log2: prob_log2.min(0.0),
            h1: Some(h1),
        });
    }

    if let Some(width) = secret.support_width() {
        let width = width as f64;
        return Ok(Guess {
            space_log2: zeta as f64 * width.log2(),
            prob_log2: 0.0,
            h1: None,
        });
    }

    match secret.gaussian_stddev() {
        Some(sigma) if sigma > 0.0 => {
            let t = (3.0 * sigma).ceil();
            let coverage = gaussian_coverage(t + 0.5, sigma);
            Ok(Guess {
                space_log2: zeta as f64 * (2.0 * t + 1.0).log2(),
                prob_log2: zeta as f64 * coverage.log2(),
                h1: None,
            })
        }
        Some(_) => Err(EstimatorError::DegenerateDistribution(
            "secret distribution has zero variance",
        )),
        None => Err(EstimatorError::not_applicable(
            "guessing needs a secret with bounded support",
        )),
    }
}

/// Primal hybrid: guess ζ coordinates, then solve BDD on the rest, either
/// with Babai's nearest plane (d² per guess) or an SVP call per guess.
pub fn primal_hybrid(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    let (sigma_s, sigma_e) = noise_stddevs(lwe)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("hybrid attack needs at least one sample"));
    }
    let n = lwe.n();
    // surfaces NotApplicable for unguessable secrets before searching
    guess(lwe.secret(), n, 1)?;

    let mut best: Option<(f64, CostReport)> = None;
    for zeta in grid(0, n - 1, ZETA_GRID) {
        let g = guess(lwe.secret(), n, zeta)?;
        if !g.prob_log2.is_finite() {
            continue;
        }
        let Some(solution) = usvp_search(
            n - zeta,
            lwe.q(),
            lwe.m(),
            sigma_s,
            sigma_e,
            options.red_shape,
            options.red_cost_model,
        ) else {
            continue;
        };

        let per_guess = if options.babai {
            2.0 * (solution.d as f64).log2()
        } else {
            options.red_cost_model.svp_log2(solution.beta as f64)
        };
        let search_log2 = g.enumerated_log2(options.mitm) + per_guess;
        let rop = log2_add(solution.red_log2, search_log2) - g.prob_log2;

        if best.as_ref().map_or(true, |(cost, _)| rop < *cost) {
            let mem = if options.mitm {
                g.enumerated_log2(true)
            } else {
                sieve_memory_log2(solution.beta as f64)
            };
            let mut report = CostReport::new("hybrid", rop)
                .with_log2(Metric::Red, solution.red_log2)
                .with_log2(Metric::Svp, search_log2)
                .with_log2(Metric::Mem, mem)
                .with_integer(Metric::Beta, solution.beta)
                .with_integer(Metric::Dimension, solution.d)
                .with_real(Metric::Delta, delta(solution.beta as f64))
                .with_integer(Metric::Zeta, zeta)
                .with_log2(Metric::SearchSpace, g.space_log2)
                .with_real(Metric::Probability, g.prob_log2.exp2())
                .with_integer(Metric::Samples, solution.m);
            if let Some(h1) = g.h1 {
                report = report.with_integer(Metric::H1, h1);
            }
            best = Some((rop, report));
        }
    }

    let (rop, report) = best.ok_or_else(|| {
        EstimatorError::infeasible("no guessing dimension leaves a solvable uSVP instance")
    })?;
    debug!(rop, "primal hybrid solution");
    Ok(report)
}

/// Dual hybrid: short dual vectors on the last `n - ζ` coordinates, then
/// evaluate the distinguisher for every guess of the first ζ.
pub fn dual_hybrid(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    let (sigma_s, sigma_e) = noise_stddevs(lwe)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("hybrid attack needs at least one sample"));
    }
    let n = lwe.n();
    guess(lwe.secret(), n, 1)?;

    let mut best: Option<(f64, CostReport)> = None;
    for zeta in grid(0, n - 1, ZETA_GRID) {
        let g = guess(lwe.secret(), n, zeta)?;
        if !g.prob_log2.is_finite() {
            continue;
        }
        let n_prime = n - zeta;
        let enumerated = g.enumerated_log2(options.mitm);

        for m_prime in grid(1, lwe.m(), SAMPLE_GRID) {
            let d = n_prime + m_prime;
            for beta in 2..=d {
                let point = dual_point(
                    n_prime,
                    lwe.q(),
                    d,
                    beta,
                    sigma_s,
                    sigma_e,
                    options.red_cost_model,
                );
                let search_log2 = if options.fft {
                    let fft = enumerated + enumerated.max(1.0).log2();
                    log2_add(point.repetitions_log2, fft)
                } else {
                    point.repetitions_log2 + enumerated
                };
                let rop = log2_add(point.red_log2, search_log2) - g.prob_log2;
                if !rop.is_finite() || best.as_ref().is_some_and(|(cost, _)| rop >= *cost) {
                    continue;
                }

                let mut report = CostReport::new("dual_hybrid", rop)
                    .with_log2(Metric::Red, point.red_log2)
                    .with_log2(Metric::Svp, search_log2)
                    .with_log2(Metric::Mem, sieve_memory_log2(beta as f64).max(enumerated))
                    .with_integer(Metric::Beta, beta)
                    .with_integer(Metric::Dimension, d)
                    .with_real(Metric::Delta, delta(beta as f64))
                    .with_integer(Metric::Zeta, zeta)
                    .with_log2(Metric::SearchSpace, g.space_log2)
                    .with_real(Metric::Probability, g.prob_log2.exp2())
                    .with_log2(Metric::Repetitions, point.repetitions_log2)
                    .with_integer(Metric::Samples, m_prime);
                if let Some(h1) = g.h1 {
                    report = report.with_integer(Metric::H1, h1);
                }
                if options.mitm {
                    report = report.with_integer(Metric::Split, zeta / 2);
                }
                best = Some((rop, report));
            }
        }
    }

    let (rop, report) =
        best.ok_or_else(|| EstimatorError::infeasible("no finite dual hybrid cost"))?;
    debug!(rop, "dual hybrid solution");
    Ok(report)
}
