//! Problem parameters and their builder.
//!
//! A [`ProblemParameters`] value is built once per run from validated input
//! and only ever handed out by shared reference afterwards.

use std::fmt;

use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

use crate::distribution::{
    build_gaussian_law, gaussian_law_radius, NoiseDistribution, ProbabilityLaw, MAX_LAW_RADIUS,
};
use crate::error::ParameterError;

/// Norm constraining SIS solutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Norm {
    L2,
    Linf,
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Norm::L2 => write!(f, "L2"),
            Norm::Linf => write!(f, "Linf"),
        }
    }
}

/// Number of samples available to the attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleCount {
    Bounded(u64),
    Unbounded,
}

impl SampleCount {
    /// Console convention: `0` means no cap, negative values are rejected.
    pub fn from_raw(m: i64) -> Result<Self, ParameterError> {
        match m {
            m if m < 0 => Err(ParameterError::range("m", m, "m >= 0")),
            0 => Ok(SampleCount::Unbounded),
            m => Ok(SampleCount::Bounded(m as u64)),
        }
    }

    pub fn bound(&self) -> Option<u64> {
        match *self {
            SampleCount::Bounded(m) => Some(m),
            SampleCount::Unbounded => None,
        }
    }
}

impl fmt::Display for SampleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleCount::Bounded(m) => write!(f, "{m}"),
            SampleCount::Unbounded => write!(f, "∞"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemKind {
    Lwe,
    Sis,
}

/// LWE instance: dimension, modulus, sample count and noise models.
#[derive(Clone, Debug, PartialEq)]
pub struct LweParameters {
    n: u64,
    q: u64,
    m: u64,
    secret: NoiseDistribution,
    error: NoiseDistribution,
    secret_law: Option<ProbabilityLaw>,
    error_law: Option<ProbabilityLaw>,
}

impl LweParameters {
    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn q(&self) -> u64 {
        self.q
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn secret(&self) -> &NoiseDistribution {
        &self.secret
    }

    pub fn error(&self) -> &NoiseDistribution {
        &self.error
    }

    /// Discretized secret law, present for discrete Gaussian secrets.
    pub fn secret_law(&self) -> Option<&ProbabilityLaw> {
        self.secret_law.as_ref()
    }

    /// Discretized error law, present for discrete Gaussian errors.
    pub fn error_law(&self) -> Option<&ProbabilityLaw> {
        self.error_law.as_ref()
    }

    pub fn secret_stddev(&self) -> f64 {
        self.secret.stddev(self.n, self.q)
    }

    pub fn error_stddev(&self) -> f64 {
        self.error.stddev(self.m, self.q)
    }
}

/// SIS instance: find short non-zero `x` with `A x = 0 mod q`.
#[derive(Clone, Debug, PartialEq)]
pub struct SisParameters {
    n: u64,
    q: u64,
    m: SampleCount,
    norm_bound: f64,
    norm: Norm,
}

impl SisParameters {
    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn q(&self) -> u64 {
        self.q
    }

    pub fn m(&self) -> SampleCount {
        self.m
    }

    pub fn norm_bound(&self) -> f64 {
        self.norm_bound
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }
}

/// The canonical, problem-defining value every strategy reads.
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemParameters {
    Lwe(LweParameters),
    Sis(SisParameters),
}

impl ProblemParameters {
    pub fn kind(&self) -> ProblemKind {
        match self {
            ProblemParameters::Lwe(_) => ProblemKind::Lwe,
            ProblemParameters::Sis(_) => ProblemKind::Sis,
        }
    }

    pub fn as_lwe(&self) -> Option<&LweParameters> {
        match self {
            ProblemParameters::Lwe(p) => Some(p),
            ProblemParameters::Sis(_) => None,
        }
    }

    pub fn as_sis(&self) -> Option<&SisParameters> {
        match self {
            ProblemParameters::Sis(p) => Some(p),
            ProblemParameters::Lwe(_) => None,
        }
    }

    pub fn to_json_value(&self) -> Value {
        match self {
            ProblemParameters::Lwe(p) => json!({
                "problem": "lwe",
                "n": p.n,
                "q": p.q,
                "m": p.m,
                "secret": p.secret.to_json_value(),
                "error": p.error.to_json_value()
            }),
            ProblemParameters::Sis(p) => json!({
                "problem": "sis",
                "n": p.n,
                "q": p.q,
                "m": p.m.bound(),
                "norm_bound": p.norm_bound,
                "norm": p.norm.to_string()
            }),
        }
    }

    /// Short Keccak-256 digest of the canonical JSON form.
    ///
    /// Identical inputs always produce the same fingerprint, so reports from
    /// separate runs can be matched up before diffing.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Keccak256::new();
        hasher.update(b"hardness-estimator/params");
        hasher.update(self.to_json_value().to_string().as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        hex::encode(&digest[..8])
    }
}

impl fmt::Display for ProblemParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemParameters::Lwe(p) => write!(
                f,
                "LWE[n={}, q={}, m={}, Xs={}, Xe={}]",
                p.n,
                p.q,
                p.m,
                p.secret.to_json_string(),
                p.error.to_json_string()
            ),
            ProblemParameters::Sis(p) => write!(
                f,
                "SIS[n={}, q={}, m={}, length_bound={}, norm={}]",
                p.n, p.q, p.m, p.norm_bound, p.norm
            ),
        }
    }
}

/// Validating constructor for [`ProblemParameters`].
///
/// Raw numeric input is taken as signed integers so that out-of-range values
/// coming from a user are representable and rejected here, before any
/// strategy runs.
pub struct ParameterBuilder;

impl ParameterBuilder {
    pub fn lwe(
        n: i64,
        q: i64,
        m: i64,
        secret: NoiseDistribution,
        error: NoiseDistribution,
    ) -> Result<ProblemParameters, ParameterError> {
        let (n, q) = Self::check_dimension_and_modulus(n, q)?;
        if m < 0 {
            return Err(ParameterError::range("m", m, "m >= 0"));
        }
        secret.check_dimension(n)?;
        error.check_dimension(m as u64)?;

        let secret_law = Self::law_for(&secret, q)?;
        let error_law = Self::law_for(&error, q)?;

        Ok(ProblemParameters::Lwe(LweParameters {
            n,
            q,
            m: m as u64,
            secret,
            error,
            secret_law,
            error_law,
        }))
    }

    pub fn sis(
        n: i64,
        q: i64,
        m: SampleCount,
        norm_bound: f64,
        norm: Norm,
    ) -> Result<ProblemParameters, ParameterError> {
        let (n, q) = Self::check_dimension_and_modulus(n, q)?;
        if !norm_bound.is_finite() || norm_bound <= 0.0 {
            return Err(ParameterError::range(
                "norm_bound",
                norm_bound,
                "a finite bound > 0",
            ));
        }
        Ok(ProblemParameters::Sis(SisParameters {
            n,
            q,
            m,
            norm_bound,
            norm,
        }))
    }

    fn check_dimension_and_modulus(n: i64, q: i64) -> Result<(u64, u64), ParameterError> {
        if n <= 0 {
            return Err(ParameterError::range("n", n, "n > 0"));
        }
        if q <= 1 {
            return Err(ParameterError::range("q", q, "q > 1"));
        }
        Ok((n as u64, q as u64))
    }

    /// Tabulated law for Gaussian noise. A law too wide to tabulate is left
    /// out; estimators that need it then skip instead of failing the run.
    fn law_for(
        dist: &NoiseDistribution,
        q: u64,
    ) -> Result<Option<ProbabilityLaw>, ParameterError> {
        match dist.gaussian_stddev() {
            Some(stddev) if gaussian_law_radius(stddev, q) <= MAX_LAW_RADIUS => {
                build_gaussian_law(stddev, q).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(stddev: f64) -> NoiseDistribution {
        NoiseDistribution::discrete_gaussian(stddev, 0.0).unwrap()
    }

    #[test]
    fn test_lwe_accepts_kyber_like_parameters() {
        let params = ParameterBuilder::lwe(256, 3329, 512, gaussian(3.0), gaussian(3.0)).unwrap();
        let lwe = params.as_lwe().unwrap();
        assert_eq!(lwe.n(), 256);
        assert_eq!(lwe.q(), 3329);
        assert_eq!(lwe.m(), 512);
        assert!(lwe.secret_law().is_some());
        assert!(lwe.error_law().is_some());
        assert_eq!(params.kind(), ProblemKind::Lwe);
    }

    #[test]
    fn test_lwe_rejects_out_of_range() {
        let zero_n = ParameterBuilder::lwe(0, 3329, 512, gaussian(3.0), gaussian(3.0));
        assert!(matches!(
            zero_n,
            Err(ParameterError::InvalidParameterRange { name: "n", .. })
        ));

        let unit_q = ParameterBuilder::lwe(256, 1, 512, gaussian(3.0), gaussian(3.0));
        assert!(matches!(
            unit_q,
            Err(ParameterError::InvalidParameterRange { name: "q", .. })
        ));

        let negative_m = ParameterBuilder::lwe(256, 3329, -1, gaussian(3.0), gaussian(3.0));
        assert!(matches!(
            negative_m,
            Err(ParameterError::InvalidParameterRange { name: "m", .. })
        ));
    }

    #[test]
    fn test_lwe_rejects_oversized_sparse_secret() {
        let secret = NoiseDistribution::sparse_ternary(40, 40);
        let err = ParameterBuilder::lwe(64, 3329, 128, secret, gaussian(3.0)).unwrap_err();
        assert!(matches!(err, ParameterError::InvalidDistributionParameter { .. }));
    }

    #[test]
    fn test_non_gaussian_has_no_law() {
        let params = ParameterBuilder::lwe(
            256,
            3329,
            512,
            NoiseDistribution::centered_binomial(2).unwrap(),
            gaussian(1.0),
        )
        .unwrap();
        let lwe = params.as_lwe().unwrap();
        assert!(lwe.secret_law().is_none());
        assert!(lwe.error_law().is_some());
    }

    #[test]
    fn test_lwe_rejects_overflowing_sparse_weight() {
        let secret = NoiseDistribution::from_json_str(
            r#"{"distribution":"sparse_ternary","p":18446744073709551615,"m":1}"#,
        )
        .unwrap();
        let err = ParameterBuilder::lwe(64, 3329, 128, secret, gaussian(3.0)).unwrap_err();
        assert!(matches!(
            err,
            ParameterError::InvalidDistributionParameter { name: "sparse ternary weight", .. }
        ));
    }

    #[test]
    fn test_lwe_leaves_out_untabulable_law() {
        let params =
            ParameterBuilder::lwe(16, 1 << 40, 32, gaussian(1e5), gaussian(3.0)).unwrap();
        let lwe = params.as_lwe().unwrap();
        assert!(lwe.secret_law().is_none());
        let error_law = lwe.error_law().unwrap();
        assert!((error_law.stddev() - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_sis_sample_count() {
        assert_eq!(SampleCount::from_raw(0).unwrap(), SampleCount::Unbounded);
        assert_eq!(SampleCount::from_raw(7).unwrap(), SampleCount::Bounded(7));
        assert!(SampleCount::from_raw(-3).is_err());

        let params = ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 20.0, Norm::Linf).unwrap();
        let sis = params.as_sis().unwrap();
        assert_eq!(sis.m(), SampleCount::Unbounded);
        assert!(params.as_lwe().is_none());

        assert!(ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 0.0, Norm::Linf).is_err());
        assert!(ParameterBuilder::sis(50, 97, SampleCount::Unbounded, f64::NAN, Norm::L2).is_err());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = ParameterBuilder::lwe(256, 3329, 512, gaussian(3.0), gaussian(3.0)).unwrap();
        let b = ParameterBuilder::lwe(256, 3329, 512, gaussian(3.0), gaussian(3.0)).unwrap();
        let c = ParameterBuilder::lwe(256, 3329, 513, gaussian(3.0), gaussian(3.0)).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn test_display() {
        let params = ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 20.0, Norm::Linf).unwrap();
        assert_eq!(
            params.to_string(),
            "SIS[n=50, q=97, m=∞, length_bound=20, norm=Linf]"
        );
    }
}
