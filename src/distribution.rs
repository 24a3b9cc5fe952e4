//! Noise models for secret and error coefficients.
//!
//! [`NoiseDistribution`] is the closed-form descriptor every estimator reads;
//! [`ProbabilityLaw`] is the explicit probability table some two-step cost
//! models need instead of closed-form Gaussian parameters.

use serde_json::{json, Value};

use crate::error::ParameterError;

/// Probabilities below this are dropped from a discretized law (2^-60).
const LAW_TAIL_CUTOFF: f64 = 8.673_617_379_884_035e-19;

/// Widest half-window a discretized law will materialise. Laws needing a
/// wider window are refused rather than truncated.
pub const MAX_LAW_RADIUS: i64 = 1 << 18;

/// Secret/error coefficient distribution.
#[derive(Clone, Debug, PartialEq)]
pub enum NoiseDistribution {
    /// Discrete Gaussian with standard deviation σ and mean μ.
    DiscreteGaussian { stddev: f64, mean: f64 },
    /// Centered binomial distribution with parameter η.
    CenteredBinomial { eta: u64 },
    /// Uniform distribution over [a, b].
    Uniform { a: i64, b: i64 },
    /// Uniform mod q.
    UniformMod,
    /// Sparse ternary: p values of +1, m values of -1, rest 0.
    SparseTernary { p: u64, m: u64 },
    /// Sparse binary with the given Hamming weight.
    SparseBinary { hw: u64 },
}

impl NoiseDistribution {
    /// Discrete Gaussian. `stddev = 0` is accepted as the zero-noise distribution.
    pub fn discrete_gaussian(stddev: f64, mean: f64) -> Result<Self, ParameterError> {
        if !stddev.is_finite() || stddev < 0.0 {
            return Err(ParameterError::distribution(
                "stddev",
                stddev,
                "a finite value >= 0",
            ));
        }
        if !mean.is_finite() {
            return Err(ParameterError::distribution("mean", mean, "a finite value"));
        }
        Ok(NoiseDistribution::DiscreteGaussian { stddev, mean })
    }

    pub fn centered_binomial(eta: u64) -> Result<Self, ParameterError> {
        if eta == 0 || eta > i64::MAX as u64 {
            return Err(ParameterError::distribution("eta", eta, "1 <= eta <= 2^63 - 1"));
        }
        Ok(NoiseDistribution::CenteredBinomial { eta })
    }

    pub fn uniform(a: i64, b: i64) -> Result<Self, ParameterError> {
        if a > b {
            return Err(ParameterError::distribution(
                "uniform bounds",
                format!("[{a}, {b}]"),
                "a <= b",
            ));
        }
        if b.checked_sub(a).and_then(|w| w.checked_add(1)).is_none() {
            return Err(ParameterError::distribution(
                "uniform bounds",
                format!("[{a}, {b}]"),
                "at most 2^63 - 1 support points",
            ));
        }
        Ok(NoiseDistribution::Uniform { a, b })
    }

    pub fn uniform_mod() -> Self {
        NoiseDistribution::UniformMod
    }

    pub fn sparse_ternary(p: u64, m: u64) -> Self {
        NoiseDistribution::SparseTernary { p, m }
    }

    pub fn sparse_binary(hw: u64) -> Self {
        NoiseDistribution::SparseBinary { hw }
    }

    /// Binary {0, 1}.
    pub fn binary() -> Self {
        NoiseDistribution::Uniform { a: 0, b: 1 }
    }

    /// Ternary {-1, 0, 1}.
    pub fn ternary() -> Self {
        NoiseDistribution::Uniform { a: -1, b: 1 }
    }

    /// Checks constraints that depend on the dimension the distribution is used in.
    pub fn check_dimension(&self, n: u64) -> Result<(), ParameterError> {
        match *self {
            NoiseDistribution::SparseTernary { p, m } if p.checked_add(m).map_or(true, |w| w > n) => {
                Err(ParameterError::distribution(
                    "sparse ternary weight",
                    format!("p = {p}, m = {m}"),
                    "p + m <= n",
                ))
            }
            NoiseDistribution::SparseBinary { hw } if hw > n => Err(
                ParameterError::distribution("sparse binary weight", hw, "hw <= n"),
            ),
            _ => Ok(()),
        }
    }

    /// Number of support points of a bounded distribution, saturating.
    pub fn support_width(&self) -> Option<u64> {
        self.bounds()
            .map(|(a, b)| b.abs_diff(a).saturating_add(1))
    }

    /// Standard deviation of one coefficient in dimension `n` over modulus `q`.
    pub fn stddev(&self, n: u64, q: u64) -> f64 {
        self.variance(n, q).sqrt()
    }

    pub fn variance(&self, n: u64, q: u64) -> f64 {
        match *self {
            NoiseDistribution::DiscreteGaussian { stddev, .. } => stddev * stddev,
            NoiseDistribution::CenteredBinomial { eta } => eta as f64 / 2.0,
            NoiseDistribution::Uniform { a, b } => {
                let width = b as f64 - a as f64 + 1.0;
                (width * width - 1.0) / 12.0
            }
            NoiseDistribution::UniformMod => {
                let q = q as f64;
                (q * q - 1.0) / 12.0
            }
            NoiseDistribution::SparseTernary { p, m } => {
                let n = n.max(1) as f64;
                let mean = (p as f64 - m as f64) / n;
                (p as f64 + m as f64) / n - mean * mean
            }
            NoiseDistribution::SparseBinary { hw } => {
                let density = hw as f64 / n.max(1) as f64;
                density * (1.0 - density)
            }
        }
    }

    pub fn mean(&self, n: u64) -> f64 {
        match *self {
            NoiseDistribution::DiscreteGaussian { mean, .. } => mean,
            NoiseDistribution::CenteredBinomial { .. } | NoiseDistribution::UniformMod => 0.0,
            NoiseDistribution::Uniform { a, b } => (a as f64 + b as f64) / 2.0,
            NoiseDistribution::SparseTernary { p, m } => {
                (p as f64 - m as f64) / n.max(1) as f64
            }
            NoiseDistribution::SparseBinary { hw } => hw as f64 / n.max(1) as f64,
        }
    }

    /// Inclusive support bounds, `None` when the support is unbounded or covers Z_q.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match *self {
            NoiseDistribution::DiscreteGaussian { .. } | NoiseDistribution::UniformMod => None,
            NoiseDistribution::CenteredBinomial { eta } => {
                let eta = i64::try_from(eta).unwrap_or(i64::MAX);
                Some((-eta, eta))
            }
            NoiseDistribution::Uniform { a, b } => Some((a, b)),
            NoiseDistribution::SparseTernary { .. } => Some((-1, 1)),
            NoiseDistribution::SparseBinary { .. } => Some((0, 1)),
        }
    }

    /// Number of non-zero coefficients for sparse distributions.
    pub fn hamming_weight(&self) -> Option<u64> {
        match *self {
            NoiseDistribution::SparseTernary { p, m } => Some(p.saturating_add(m)),
            NoiseDistribution::SparseBinary { hw } => Some(hw),
            _ => None,
        }
    }

    pub fn gaussian_stddev(&self) -> Option<f64> {
        match *self {
            NoiseDistribution::DiscreteGaussian { stddev, .. } => Some(stddev),
            _ => None,
        }
    }

    /// Convert to the JSON descriptor format.
    pub fn to_json_value(&self) -> Value {
        match *self {
            NoiseDistribution::DiscreteGaussian { stddev, mean } => json!({
                "distribution": "discrete_gaussian",
                "stddev": stddev,
                "mean": mean
            }),
            NoiseDistribution::CenteredBinomial { eta } => json!({
                "distribution": "centered_binomial",
                "eta": eta
            }),
            NoiseDistribution::Uniform { a, b } => json!({
                "distribution": "uniform",
                "a": a,
                "b": b
            }),
            NoiseDistribution::UniformMod => json!({ "distribution": "uniform_mod" }),
            NoiseDistribution::SparseTernary { p, m } => json!({
                "distribution": "sparse_ternary",
                "p": p,
                "m": m
            }),
            NoiseDistribution::SparseBinary { hw } => json!({
                "distribution": "sparse_binary",
                "hw": hw
            }),
        }
    }

    /// Convert to compact JSON string.
    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Parse the JSON descriptor format, validating parameters like the typed constructors.
    pub fn from_json_value(value: &Value) -> Result<Self, ParameterError> {
        let kind = value
            .get("distribution")
            .and_then(Value::as_str)
            .ok_or_else(|| ParameterError::UnknownDistribution(value.to_string()))?;

        let float = |key: &'static str, default: Option<f64>| -> Result<f64, ParameterError> {
            match value.get(key) {
                Some(v) => v
                    .as_f64()
                    .ok_or_else(|| ParameterError::distribution(key, v, "a number")),
                None => default.ok_or_else(|| ParameterError::distribution(key, "missing", "a number")),
            }
        };
        let unsigned = |key: &'static str| -> Result<u64, ParameterError> {
            let v = value
                .get(key)
                .ok_or_else(|| ParameterError::distribution(key, "missing", "an integer >= 0"))?;
            v.as_u64()
                .ok_or_else(|| ParameterError::distribution(key, v, "an integer >= 0"))
        };
        let signed = |key: &'static str| -> Result<i64, ParameterError> {
            let v = value
                .get(key)
                .ok_or_else(|| ParameterError::distribution(key, "missing", "an integer"))?;
            v.as_i64()
                .ok_or_else(|| ParameterError::distribution(key, v, "an integer"))
        };

        match kind {
            "discrete_gaussian" => {
                NoiseDistribution::discrete_gaussian(float("stddev", None)?, float("mean", Some(0.0))?)
            }
            "centered_binomial" => NoiseDistribution::centered_binomial(unsigned("eta")?),
            "uniform" => NoiseDistribution::uniform(signed("a")?, signed("b")?),
            "uniform_mod" => Ok(NoiseDistribution::UniformMod),
            "sparse_ternary" => Ok(NoiseDistribution::sparse_ternary(unsigned("p")?, unsigned("m")?)),
            "sparse_binary" => Ok(NoiseDistribution::sparse_binary(unsigned("hw")?)),
            "binary" => Ok(NoiseDistribution::binary()),
            "ternary" => Ok(NoiseDistribution::ternary()),
            other => Err(ParameterError::UnknownDistribution(other.to_string())),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ParameterError> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| ParameterError::UnknownDistribution(format!("{s}: {e}")))?;
        Self::from_json_value(&value)
    }
}

/// Explicit probability table over a contiguous integer window.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityLaw {
    /// Smallest value with non-zero probability.
    offset: i64,
    /// `probs[i]` is Pr[X = offset + i].
    probs: Vec<f64>,
}

impl ProbabilityLaw {
    /// Law putting all mass on `value`.
    pub fn point(value: i64) -> Self {
        Self {
            offset: value,
            probs: vec![1.0],
        }
    }

    pub fn probability(&self, x: i64) -> f64 {
        if x < self.offset {
            return 0.0;
        }
        self.probs
            .get((x - self.offset) as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.probs
            .iter()
            .enumerate()
            .map(move |(i, &p)| (self.offset + i as i64, p))
    }

    /// Number of support points.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(x, p)| x as f64 * p).sum()
    }

    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.iter()
            .map(|(x, p)| {
                let centered = x as f64 - mean;
                centered * centered * p
            })
            .sum()
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// E[X^k] about zero, so a non-zero mean counts towards it.
    pub fn raw_moment(&self, k: i32) -> f64 {
        self.iter().map(|(x, p)| (x as f64).powi(k) * p).sum()
    }
}

/// Half-width of the window a centered Gaussian law of this width needs:
/// `±q/2`, narrowed to where the density stays above 2^-60.
pub fn gaussian_law_radius(stddev: f64, modulus: u64) -> i64 {
    let half_q = (modulus / 2).min(i64::MAX as u64) as i64;
    // exp(-x^2 / 2σ^2) >= 2^-60  <=>  |x| <= σ·sqrt(120·ln 2)
    let tail = (stddev * (120.0 * std::f64::consts::LN_2).sqrt()).ceil();
    if tail >= half_q as f64 {
        half_q
    } else {
        tail as i64
    }
}

/// Discretized centered Gaussian law over Z_q.
///
/// The window is clipped to `±q/2`; tails below 2^-60 are dropped before
/// normalising. A law whose window exceeds [`MAX_LAW_RADIUS`] is refused.
pub fn build_gaussian_law(stddev: f64, modulus: u64) -> Result<ProbabilityLaw, ParameterError> {
    if !stddev.is_finite() || stddev < 0.0 {
        return Err(ParameterError::distribution(
            "stddev",
            stddev,
            "a finite value >= 0",
        ));
    }
    if modulus < 2 {
        return Err(ParameterError::range("q", modulus, "q > 1"));
    }
    if stddev == 0.0 {
        return Ok(ProbabilityLaw::point(0));
    }

    let radius = gaussian_law_radius(stddev, modulus);
    if radius > MAX_LAW_RADIUS {
        return Err(ParameterError::distribution(
            "stddev",
            stddev,
            "a law window of at most 2^18 points each side",
        ));
    }

    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| {
            let x = x as f64;
            (-(x * x) / (2.0 * stddev * stddev)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();

    let mut probs: Vec<f64> = weights.into_iter().map(|w| w / total).collect();
    let trimmed = probs
        .iter()
        .take_while(|&&p| p < LAW_TAIL_CUTOFF)
        .count()
        .min(probs.len() / 2);
    probs.truncate(probs.len() - trimmed);
    probs.drain(..trimmed);
    let total: f64 = probs.iter().sum();
    for p in probs.iter_mut() {
        *p /= total;
    }

    Ok(ProbabilityLaw {
        offset: -radius + trimmed as i64,
        probs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_json_discrete_gaussian() {
        let d = NoiseDistribution::discrete_gaussian(8.0, 0.0).unwrap();
        let json = d.to_json_string();
        assert!(json.contains("discrete_gaussian"));
        assert!(json.contains("8"));
    }

    #[test]
    fn test_distribution_json_ternary() {
        let d = NoiseDistribution::ternary();
        let json = d.to_json_string();
        assert_eq!(json, r#"{"a":-1,"b":1,"distribution":"uniform"}"#);
    }

    #[test]
    fn test_distribution_json_sparse_ternary() {
        let d = NoiseDistribution::sparse_ternary(32, 32);
        let json = d.to_json_string();
        assert!(json.contains("sparse_ternary"));
        assert!(json.contains("\"p\":32"));
        assert!(json.contains("\"m\":32"));
    }

    #[test]
    fn test_distribution_json_parse() {
        let d = NoiseDistribution::from_json_str(r#"{"distribution":"centered_binomial","eta":2}"#)
            .unwrap();
        assert_eq!(d, NoiseDistribution::CenteredBinomial { eta: 2 });

        let d = NoiseDistribution::from_json_str(r#"{"distribution":"discrete_gaussian","stddev":3.2}"#)
            .unwrap();
        assert_eq!(d, NoiseDistribution::DiscreteGaussian { stddev: 3.2, mean: 0.0 });

        let err = NoiseDistribution::from_json_str(r#"{"distribution":"laplace"}"#).unwrap_err();
        assert!(matches!(err, ParameterError::UnknownDistribution(_)));

        let err = NoiseDistribution::from_json_str(r#"{"distribution":"discrete_gaussian","stddev":-1}"#)
            .unwrap_err();
        assert!(matches!(err, ParameterError::InvalidDistributionParameter { .. }));
    }

    #[test]
    fn test_gaussian_rejects_negative_stddev() {
        let err = NoiseDistribution::discrete_gaussian(-1.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            ParameterError::InvalidDistributionParameter { name: "stddev", .. }
        ));
        assert!(NoiseDistribution::discrete_gaussian(f64::NAN, 0.0).is_err());
        assert!(NoiseDistribution::discrete_gaussian(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_gaussian_accepts_zero_stddev() {
        let d = NoiseDistribution::discrete_gaussian(0.0, 0.0).unwrap();
        assert_eq!(d.stddev(256, 3329), 0.0);
        let law = build_gaussian_law(0.0, 3329).unwrap();
        assert_eq!(law.len(), 1);
        assert_eq!(law.probability(0), 1.0);
    }

    #[test]
    fn test_moments() {
        let cbd = NoiseDistribution::centered_binomial(2).unwrap();
        assert!((cbd.variance(256, 3329) - 1.0).abs() < 1e-12);

        let ternary = NoiseDistribution::ternary();
        assert!((ternary.variance(256, 3329) - 2.0 / 3.0).abs() < 1e-12);

        let sparse = NoiseDistribution::sparse_binary(64);
        assert!((sparse.mean(256) - 0.25).abs() < 1e-12);
        assert_eq!(sparse.hamming_weight(), Some(64));
        assert!(sparse.check_dimension(32).is_err());
    }

    #[test]
    fn test_gaussian_law_matches_stddev() {
        let law = build_gaussian_law(3.0, 3329).unwrap();
        let total: f64 = law.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(law.mean().abs() < 1e-9);
        assert!((law.stddev() - 3.0).abs() < 0.01, "stddev {}", law.stddev());
        assert_eq!(law.probability(1), law.probability(-1));
    }

    #[test]
    fn test_sparse_weight_overflow_rejected() {
        let huge = NoiseDistribution::from_json_str(
            r#"{"distribution":"sparse_ternary","p":18446744073709551615,"m":1}"#,
        )
        .unwrap();
        assert!(matches!(
            huge.check_dimension(64),
            Err(ParameterError::InvalidDistributionParameter { .. })
        ));
        assert_eq!(huge.hamming_weight(), Some(u64::MAX));
        assert!(NoiseDistribution::sparse_ternary(u64::MAX, u64::MAX)
            .check_dimension(u64::MAX)
            .is_err());
        assert!(NoiseDistribution::sparse_ternary(16, 16).check_dimension(32).is_ok());
    }

    #[test]
    fn test_extreme_bounds_rejected() {
        assert!(NoiseDistribution::uniform(i64::MIN, i64::MAX).is_err());
        assert!(NoiseDistribution::uniform(-5, 5).is_ok());
        assert!(NoiseDistribution::centered_binomial(u64::MAX).is_err());

        let wide = NoiseDistribution::Uniform { a: i64::MIN, b: i64::MAX };
        assert_eq!(wide.support_width(), Some(u64::MAX));
        assert!(wide.variance(16, 3329).is_finite());
        assert_eq!(wide.mean(16), 0.0);
        let cbd = NoiseDistribution::CenteredBinomial { eta: u64::MAX };
        assert_eq!(cbd.bounds(), Some((-i64::MAX, i64::MAX)));
    }

    #[test]
    fn test_wide_gaussian_law_keeps_stddev_or_refuses() {
        let law = build_gaussian_law(1e4, 1 << 40).unwrap();
        assert!((law.stddev() / 1e4 - 1.0).abs() < 0.01, "stddev {}", law.stddev());

        assert!(matches!(
            build_gaussian_law(1e5, 1 << 40),
            Err(ParameterError::InvalidDistributionParameter { name: "stddev", .. })
        ));
        // wide σ but a small modulus: the q/2 window fits
        assert_eq!(build_gaussian_law(1e5, 4097).unwrap().len(), 4097);
    }

    #[test]
    fn test_raw_moment_counts_clipping() {
        let law = build_gaussian_law(3.0, 3329).unwrap();
        assert!((law.raw_moment(2) - law.variance()).abs() < 1e-9);
        let clipped = build_gaussian_law(1000.0, 3329).unwrap();
        assert!(clipped.raw_moment(2).sqrt() < 900.0);
    }

    #[test]
    fn test_gaussian_law_clipped_to_modulus() {
        let law = build_gaussian_law(100.0, 17).unwrap();
        assert_eq!(law.len(), 17);
        assert_eq!(law.probability(9), 0.0);
        assert!(law.probability(8) > 0.0);
    }
}
