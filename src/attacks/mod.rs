//! Attack-cost models.
//!
//! Every model has the same shape: it reads a [`ProblemParameters`] and the
//! strategy's [`StrategyOptions`] and either returns a [`CostReport`] or an
//! [`EstimatorError`] describing why it does not apply.
//!
//! [`StrategyOptions`]: crate::strategy::StrategyOptions
//! [`CostReport`]: crate::cost::CostReport

mod algebraic;
mod combined;
mod dual;
mod hybrid;
mod primal;
pub mod reduction;
mod sis;
mod two_step;

pub use algebraic::arora_gb;
pub use combined::combined;
pub use dual::dual;
pub use hybrid::{dual_hybrid, primal_hybrid};
pub use primal::primal_usvp;
pub use reduction::{ReductionCostModel, ReductionShape};
pub use sis::sis_lattice;
pub use two_step::{two_step_advanced, two_step_simple};

use crate::error::EstimatorError;
use crate::params::{LweParameters, ProblemParameters, SisParameters};

pub(crate) fn require_lwe(params: &ProblemParameters) -> Result<&LweParameters, EstimatorError> {
    params
        .as_lwe()
        .ok_or_else(|| EstimatorError::not_applicable("requires an LWE instance"))
}

pub(crate) fn require_sis(params: &ProblemParameters) -> Result<&SisParameters, EstimatorError> {
    params
        .as_sis()
        .ok_or_else(|| EstimatorError::not_applicable("requires an SIS instance"))
}

/// `(σ_s, σ_e)`, rejecting zero-variance noise.
pub(crate) fn noise_stddevs(lwe: &LweParameters) -> Result<(f64, f64), EstimatorError> {
    let sigma_s = lwe.secret_stddev();
    let sigma_e = lwe.error_stddev();
    if sigma_e <= 0.0 {
        return Err(EstimatorError::DegenerateDistribution(
            "error distribution has zero variance",
        ));
    }
    if sigma_s <= 0.0 {
        return Err(EstimatorError::DegenerateDistribution(
            "secret distribution has zero variance",
        ));
    }
    Ok((sigma_s, sigma_e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::NoiseDistribution;
    use crate::params::{Norm, ParameterBuilder, SampleCount};

    #[test]
    fn test_require_kind() {
        let sis = ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 20.0, Norm::L2).unwrap();
        assert!(require_sis(&sis).is_ok());
        assert!(matches!(require_lwe(&sis), Err(EstimatorError::NotApplicable(_))));
    }

    #[test]
    fn test_noise_stddevs() {
        let g = NoiseDistribution::discrete_gaussian(3.2, 0.0).unwrap();
        let params = ParameterBuilder::lwe(64, 3329, 128, NoiseDistribution::centered_binomial(2).unwrap(), g)
            .unwrap();
        let (sigma_s, sigma_e) = noise_stddevs(params.as_lwe().unwrap()).unwrap();
        assert!((sigma_s - 1.0).abs() < 1e-12);
        assert!((sigma_e - 3.2).abs() < 1e-12);
    }
}
