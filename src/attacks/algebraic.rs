//! Arora–Ge style algebraic attack solved by linearization or Gröbner bases.

use tracing::{debug, trace};

use super::reduction::{gaussian_coverage, log2_binomial};
use super::require_lwe;
use crate::cost::{CostReport, Metric};
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::StrategyOptions;

/// Largest noise bound tried for unbounded errors.
const MAX_NOISE_BOUND: u64 = 64;

/// Terms of the Hilbert series examined before giving up.
const MAX_SERIES_DEGREE: u64 = 512;

/// Linear-algebra exponent.
const OMEGA: f64 = 2.0;

/// Degree of regularity of `m` semi-regular equations of degree `degree` in
/// `n` variables: index of the first non-positive coefficient of
/// `(1 - z^D)^m / (1 - z)^n`.
///
/// Coefficients are summed in log space with signs; `None` when no such
/// index is found within [`MAX_SERIES_DEGREE`] terms.
pub(crate) fn degree_of_regularity(n: u64, m: u64, degree: u64) -> Option<u64> {
    if degree == 0 || m <= n {
        return None;
    }

    // ln C(n-1+j, j) for j in 0..=MAX_SERIES_DEGREE
    let mut ln_free = Vec::with_capacity(MAX_SERIES_DEGREE as usize + 1);
    let mut acc = 0.0;
    ln_free.push(acc);
    for j in 1..=MAX_SERIES_DEGREE {
        acc += ((n - 1 + j) as f64).ln() - (j as f64).ln();
        ln_free.push(acc);
    }

    // ln C(m, k) for k in 0..=MAX_SERIES_DEGREE / degree
    let k_max = (MAX_SERIES_DEGREE / degree).min(m);
    let mut ln_equations = Vec::with_capacity(k_max as usize + 1);
    let mut acc = 0.0;
    ln_equations.push(acc);
    for k in 0..k_max {
        acc += ((m - k) as f64).ln() - ((k + 1) as f64).ln();
        ln_equations.push(acc);
    }

    for d in 0..=MAX_SERIES_DEGREE {
        let terms: Vec<(f64, f64)> = (0..=(d / degree).min(k_max))
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                let ln = ln_equations[k as usize] + ln_free[(d - degree * k) as usize];
                (sign, ln)
            })
            .collect();
        let peak = terms.iter().map(|&(_, ln)| ln).fold(f64::NEG_INFINITY, f64::max);
        let scaled: f64 = terms.iter().map(|&(sign, ln)| sign * (ln - peak).exp()).sum();
        if scaled <= 0.0 {
            return Some(d);
        }
    }
    None
}

/// Candidate noise bounds `t` with the log2 probability that all `m` errors
/// fall into `[-t, t]`.
fn noise_bounds(
    params: &crate::params::LweParameters,
) -> Result<Vec<(u64, u64, f64)>, EstimatorError> {
    let error = params.error();
    if let (Some((a, b)), Some(degree)) = (error.bounds(), error.support_width()) {
        let t = a.unsigned_abs().max(b.unsigned_abs());
        return Ok(vec![(t, degree, 0.0)]);
    }
    match error.gaussian_stddev() {
        Some(sigma) if sigma == 0.0 => Ok(vec![(0, 1, 0.0)]),
        Some(sigma) => {
            let t_max = ((6.0 * sigma).ceil() as u64).clamp(1, MAX_NOISE_BOUND);
            Ok((1..=t_max)
                .map(|t| {
                    let coverage = gaussian_coverage(t as f64 + 0.5, sigma);
                    (t, 2 * t + 1, params.m() as f64 * coverage.log2())
                })
                .collect())
        }
        None => Err(EstimatorError::not_applicable(
            "algebraic attack needs a bounded or Gaussian error",
        )),
    }
}

/// Arora–Ge: every sample becomes a degree-`2t+1` polynomial vanishing on
/// the secret, then the system is linearized or solved with a Gröbner basis.
pub fn arora_gb(
    params: &ProblemParameters,
    _options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let lwe = require_lwe(params)?;
    if lwe.m() == 0 {
        return Err(EstimatorError::not_applicable("algebraic attack needs at least one sample"));
    }
    let (n, m) = (lwe.n(), lwe.m());

    let mut best: Option<(f64, CostReport)> = None;
    for (t, degree, prob_log2) in noise_bounds(lwe)? {
        let linearization_log2 = log2_binomial(n.saturating_add(degree), degree);
        let dreg = if (m as f64).log2() >= linearization_log2 {
            Some(degree)
        } else {
            degree_of_regularity(n, m, degree)
        };
        let Some(dreg) = dreg else {
            trace!(t, "no degree of regularity");
            continue;
        };

        let monomials_log2 = log2_binomial(n + dreg, dreg);
        let rop = OMEGA * monomials_log2 - prob_log2;
        if !rop.is_finite() || best.as_ref().is_some_and(|(cost, _)| rop >= *cost) {
            continue;
        }
        let report = CostReport::new("arora-gb", rop)
            .with_log2(Metric::Mem, OMEGA * monomials_log2)
            .with_real(Metric::Probability, prob_log2.exp2())
            .with_integer(Metric::Samples, m)
            .with_integer(Metric::Dreg, dreg)
            .with_integer(Metric::NoiseBound, t);
        best = Some((rop, report));
    }

    let (rop, report) = best.ok_or_else(|| {
        EstimatorError::infeasible(format!(
            "no degree of regularity below {MAX_SERIES_DEGREE} with {m} samples in dimension {n}"
        ))
    })?;
    debug!(rop, "arora-gb solution");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::NoiseDistribution;
    use crate::params::ParameterBuilder;

    #[test]
    fn test_degree_of_regularity_quadratic() {
        // n quadratic equations in n variables: (1 - z^2)^n / (1 - z)^n = (1 + z)^n,
        // never non-positive; one extra equation makes the series terminate
        assert_eq!(degree_of_regularity(10, 10, 2), None);
        let dreg = degree_of_regularity(10, 20, 2).unwrap();
        assert!(dreg >= 2 && dreg <= 10);
    }

    #[test]
    fn test_degree_of_regularity_decreases_with_samples() {
        let few = degree_of_regularity(20, 40, 3).unwrap();
        let many = degree_of_regularity(20, 400, 3).unwrap();
        assert!(many <= few);
    }

    #[test]
    fn test_binary_error_many_samples_linearizes() {
        let params = ParameterBuilder::lwe(
            16,
            3329,
            100_000,
            NoiseDistribution::binary(),
            NoiseDistribution::binary(),
        )
        .unwrap();
        let report = arora_gb(&params, &StrategyOptions::default()).unwrap();
        assert!(report.validate().is_ok());
        // binary error: degree-2 polynomials, C(18, 2) = 153 < 100000 samples
        assert_eq!(report.get(Metric::Dreg), Some(crate::cost::MetricValue::Integer(2)));
    }

    #[test]
    fn test_gaussian_error_tries_bounds() {
        let g = NoiseDistribution::discrete_gaussian(1.0, 0.0).unwrap();
        let params = ParameterBuilder::lwe(16, 3329, 2000, g.clone(), g).unwrap();
        let report = arora_gb(&params, &StrategyOptions::default()).unwrap();
        assert!(report.validate().is_ok());
        assert!(report.get(Metric::NoiseBound).is_some());
    }

    #[test]
    fn test_uniform_mod_error_not_applicable() {
        let params = ParameterBuilder::lwe(
            16,
            3329,
            64,
            NoiseDistribution::ternary(),
            NoiseDistribution::uniform_mod(),
        )
        .unwrap();
        let err = arora_gb(&params, &StrategyOptions::default()).unwrap_err();
        assert!(matches!(err, EstimatorError::NotApplicable(_)));
    }
}
