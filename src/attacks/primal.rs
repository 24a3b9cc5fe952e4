//! Primal attack: embed the LWE instance and solve unique-SVP with BKZ.

use tracing::debug;

use super::reduction::{delta, grid, Profile, ReductionCostModel, ReductionShape};
use super::{noise_stddevs, require_lwe};
use crate::cost::{CostReport, Metric};
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::StrategyOptions;

/// Sample counts tried per block size.
const SAMPLE_GRID: u64 = 256;

/// Cheapest BKZ parameters solving the embedded uSVP instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct UsvpSolution {
    pub beta: u64,
    pub d: u64,
    pub m: u64,
    pub red_log2: f64,
}

/// Searches the smallest block size satisfying the uSVP success condition
/// `σ·sqrt(β) <= ‖b*_{d-β}‖`, trying sample counts `m' <= m`.
///
/// The secret is rescaled to the error size, so the embedded lattice has
/// dimension `n + m' + 1` and log volume `m'·ln q + n·ln(σ_e/σ_s)`.
pub(crate) fn usvp_search(
    n: u64,
    q: u64,
    m: u64,
    sigma_s: f64,
    sigma_e: f64,
    shape: ReductionShape,
    model: ReductionCostModel,
) -> Option<UsvpSolution> {
    let log_q = (q as f64).ln();
    let log_nu = (sigma_e / sigma_s).ln();
    let candidates = grid(0, m, SAMPLE_GRID);
    let beta_max = n + m + 1;

    for beta in 2..=beta_max {
        let beta_f = beta as f64;
        let lhs = sigma_e.ln() + 0.5 * beta_f.ln();

        let best = candidates
            .iter()
            .filter_map(|&m_prime| {
                let d = n + m_prime + 1;
                if beta > d {
                    return None;
                }
                let log_vol = m_prime as f64 * log_q + n as f64 * log_nu;
                let profile = Profile::new(shape, d as usize, log_vol, beta_f, log_q);
                if lhs <= profile.at((d - beta) as usize) {
                    Some((model.bkz_log2(beta_f, d as f64), m_prime, d))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((red_log2, m_prime, d)) = best {
            return Some(UsvpSolution {
                beta,
                d,
                m: m_prime,
                red_log2,
            });
        }
    }
    None
}

/// Primal uSVP attack under the configured reduction shape and cost model.
pub fn primal_usvp(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    let (sigma_s, sigma_e) = noise_stddevs(lwe)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("primal attack needs at least one sample"));
    }

    let solution = usvp_search(
        lwe.n(),
        lwe.q(),
        lwe.m(),
        sigma_s,
        sigma_e,
        options.red_shape,
        options.red_cost_model,
    )
    .ok_or_else(|| {
        EstimatorError::infeasible(format!(
            "no block size up to {} satisfies the uSVP condition",
            lwe.n() + lwe.m() + 1
        ))
    })?;

    debug!(
        beta = solution.beta,
        d = solution.d,
        m = solution.m,
        red = solution.red_log2,
        "primal uSVP solution"
    );

    Ok(CostReport::new("usvp", solution.red_log2)
        .with_log2(Metric::Red, solution.red_log2)
        .with_real(Metric::Delta, delta(solution.beta as f64))
        .with_integer(Metric::Beta, solution.beta)
        .with_integer(Metric::Dimension, solution.d)
        .with_integer(Metric::Samples, solution.m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::NoiseDistribution;
    use crate::params::ParameterBuilder;

    fn lwe(n: i64, q: i64, m: i64, sigma: f64) -> ProblemParameters {
        let g = NoiseDistribution::discrete_gaussian(sigma, 0.0).unwrap();
        ParameterBuilder::lwe(n, q, m, g.clone(), g).unwrap()
    }

    #[test]
    fn test_easy_instance_needs_small_block() {
        let params = lwe(100, 1 << 20, 200, 2.0);
        let report = primal_usvp(&params, &StrategyOptions::default()).unwrap();
        assert!(report.validate().is_ok());
        assert!(report.beta().unwrap() < 60);
    }

    #[test]
    fn test_larger_dimension_costs_more() {
        let options = StrategyOptions::default();
        let small = primal_usvp(&lwe(256, 3329, 512, 1.0), &options).unwrap();
        let large = primal_usvp(&lwe(512, 3329, 1024, 1.0), &options).unwrap();
        assert!(large.beta().unwrap() > small.beta().unwrap());
        assert!(large.rop_log2().unwrap() > small.rop_log2().unwrap());
    }

    #[test]
    fn test_rejects_sis() {
        let params = ParameterBuilder::sis(
            50,
            97,
            crate::params::SampleCount::Unbounded,
            20.0,
            crate::params::Norm::Linf,
        )
        .unwrap();
        let err = primal_usvp(&params, &StrategyOptions::default()).unwrap_err();
        assert!(matches!(err, EstimatorError::NotApplicable(_)));
    }

    #[test]
    fn test_zero_noise_is_degenerate() {
        let params = lwe(64, 3329, 128, 0.0);
        let err = primal_usvp(&params, &StrategyOptions::default()).unwrap_err();
        assert!(matches!(err, EstimatorError::DegenerateDistribution(_)));
    }

    #[test]
    fn test_zgsa_profile_solves() {
        let params = lwe(256, 3329, 512, 1.0);
        let gsa = primal_usvp(&params, &StrategyOptions::default()).unwrap();
        let zgsa = primal_usvp(
            &params,
            &StrategyOptions::default().with_red_shape(ReductionShape::Zgsa),
        )
        .unwrap();
        assert!(gsa.validate().is_ok() && zgsa.validate().is_ok());
    }
}
