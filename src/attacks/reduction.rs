//! Lattice-reduction toolkit shared by the cost models.
//!
//! Geometry (profiles, volumes) is in natural logarithms; costs are in log2.

use std::f64::consts::{E, LN_2, PI};

/// Root Hermite factor reached by LLL (β = 2).
pub const LLL_DELTA: f64 = 1.0219;

/// Block size from which the Chen–Nguyen asymptotic formula is used.
const CN_MIN_BETA: f64 = 40.0;

/// log2 of the number of vectors a sieve in dimension β outputs (and stores).
pub const SIEVE_VECTORS_EXPONENT: f64 = 0.2075;

/// Polynomial overhead of one sieving call in the MATZOV gate-count model.
const MATZOV_OVERHEAD: f64 = 16.4;

/// BKZ tours accounted by the MATZOV model.
const MATZOV_TOURS: f64 = 8.0;

/// Root Hermite factor δ(β) of a BKZ-β reduced basis.
pub fn delta(beta: f64) -> f64 {
    if beta <= 2.0 {
        return LLL_DELTA;
    }
    if beta < CN_MIN_BETA {
        let d40 = delta_chen_nguyen(CN_MIN_BETA);
        return LLL_DELTA + (d40 - LLL_DELTA) * (beta - 2.0) / (CN_MIN_BETA - 2.0);
    }
    delta_chen_nguyen(beta)
}

// delta = ((pi * beta)^(1/beta) * beta / (2*pi*e))^(1/(2*(beta-1)))
fn delta_chen_nguyen(beta: f64) -> f64 {
    let inner = (PI * beta).powf(1.0 / beta) * beta / (2.0 * PI * E);
    inner.powf(1.0 / (2.0 * (beta - 1.0)))
}

/// Cost model for BKZ and its SVP oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReductionCostModel {
    /// One classical sieving call, 2^(0.292β).
    CoreSvp,
    /// One quantum sieving call, 2^(0.265β).
    QuantumCoreSvp,
    /// Gate count with tours and per-block calls, MATZOV-style.
    Matzov,
}

impl ReductionCostModel {
    /// log2 cost of one SVP call in dimension β.
    pub fn svp_log2(&self, beta: f64) -> f64 {
        match self {
            ReductionCostModel::CoreSvp => 0.292 * beta,
            ReductionCostModel::QuantumCoreSvp => 0.265 * beta,
            ReductionCostModel::Matzov => 0.29613 * beta + MATZOV_OVERHEAD,
        }
    }

    /// log2 cost of BKZ-β on a d-dimensional basis, LLL preprocessing included.
    pub fn bkz_log2(&self, beta: f64, d: f64) -> f64 {
        let lll = lll_log2(d);
        if beta <= 2.0 {
            return lll;
        }
        let bkz = match self {
            ReductionCostModel::CoreSvp | ReductionCostModel::QuantumCoreSvp => self.svp_log2(beta),
            ReductionCostModel::Matzov => {
                let calls = MATZOV_TOURS * (d - beta + 1.0).max(1.0);
                calls.log2() + self.svp_log2(beta)
            }
        };
        log2_add(lll, bkz)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReductionCostModel::CoreSvp => "CoreSVP",
            ReductionCostModel::QuantumCoreSvp => "QuantumCoreSVP",
            ReductionCostModel::Matzov => "MATZOV",
        }
    }
}

/// log2 cost of LLL on a d-dimensional basis, d^3.
pub fn lll_log2(d: f64) -> f64 {
    3.0 * d.max(1.0).log2()
}

/// log2 of the memory of a sieve in dimension β.
pub fn sieve_memory_log2(beta: f64) -> f64 {
    SIEVE_VECTORS_EXPONENT * beta.max(0.0)
}

/// Shape of the Gram–Schmidt profile after reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReductionShape {
    /// Geometric series assumption.
    Gsa,
    /// GSA clipped by the q-ary structure (Z-shape).
    Zgsa,
}

/// A basis profile description: dimension, log volume, slope and modulus.
#[derive(Clone, Copy, Debug)]
pub struct Profile {
    pub d: usize,
    pub log_vol: f64,
    pub log_delta: f64,
    pub log_q: f64,
    pub shape: ReductionShape,
}

impl Profile {
    pub fn new(shape: ReductionShape, d: usize, log_vol: f64, beta: f64, log_q: f64) -> Self {
        Self {
            d,
            log_vol,
            log_delta: delta(beta).ln(),
            log_q,
            shape,
        }
    }

    fn gsa_at(&self, i: usize) -> f64 {
        let d = self.d as f64;
        self.log_vol / d + (d - 1.0 - 2.0 * i as f64) * self.log_delta
    }

    /// Z-shape layout `(k, len)`: k leading vectors of norm q, then a slope of
    /// `len` vectors from q down to 1, then unit vectors. `None` when the plain
    /// GSA profile already stays within [1, q].
    fn z_layout(&self) -> Option<(usize, usize)> {
        if self.gsa_at(0) <= self.log_q && self.gsa_at(self.d - 1) >= 0.0 {
            return None;
        }
        let len = (self.log_q / (2.0 * self.log_delta)).floor() as usize + 1;
        if len >= self.d {
            return None;
        }
        let len_f = len as f64;
        let slope_sum = len_f * self.log_q - self.log_delta * len_f * (len_f - 1.0);
        let k = ((self.log_vol - slope_sum) / self.log_q).round();
        let k = k.clamp(0.0, (self.d - len) as f64) as usize;
        Some((k, len))
    }

    /// ln ‖b*_i‖ for `i` in `0..d`.
    pub fn at(&self, i: usize) -> f64 {
        match self.shape {
            ReductionShape::Gsa => self.gsa_at(i),
            ReductionShape::Zgsa => match self.z_layout() {
                None => self.gsa_at(i),
                Some((k, len)) => {
                    if i < k {
                        self.log_q
                    } else if i < k + len {
                        self.log_q - 2.0 * self.log_delta * (i - k) as f64
                    } else {
                        0.0
                    }
                }
            },
        }
    }

    /// Mean of ln ‖b*_i‖ over the last `eta` vectors.
    pub fn tail_mean(&self, eta: usize) -> f64 {
        let eta = eta.clamp(1, self.d);
        match (self.shape, self.z_layout()) {
            (ReductionShape::Gsa, _) | (ReductionShape::Zgsa, None) => {
                self.log_vol / self.d as f64 - (self.d - eta) as f64 * self.log_delta
            }
            (ReductionShape::Zgsa, Some(_)) => {
                let sum: f64 = (self.d - eta..self.d).map(|i| self.at(i)).sum();
                sum / eta as f64
            }
        }
    }
}

/// log2(2^a + 2^b) without overflow.
pub fn log2_add(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo == f64::NEG_INFINITY {
        return hi;
    }
    hi + (1.0 + (lo - hi).exp2()).log2()
}

/// Error function, Abramowitz–Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Pr[|X| <= bound] for X ~ N(0, stddev^2).
pub fn gaussian_coverage(bound: f64, stddev: f64) -> f64 {
    if stddev <= 0.0 {
        return 1.0;
    }
    erf(bound / (stddev * std::f64::consts::SQRT_2))
}

/// ln C(n, k).
pub fn ln_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    let k = k.min(n - k);
    (0..k)
        .map(|i| ((n - i) as f64).ln() - ((i + 1) as f64).ln())
        .sum()
}

/// log2 C(n, k).
pub fn log2_binomial(n: u64, k: u64) -> f64 {
    ln_binomial(n, k) / LN_2
}

/// Evenly spaced candidates in `lo..=hi`, at most `limit + 1` of them, `hi` always included.
pub fn grid(lo: u64, hi: u64, limit: u64) -> Vec<u64> {
    if hi < lo {
        return Vec::new();
    }
    let step = ((hi - lo) / limit.max(1)).max(1);
    let mut points: Vec<u64> = (lo..=hi).step_by(step as usize).collect();
    if points.last() != Some(&hi) {
        points.push(hi);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bkz_delta() {
        // BKZ-100 should give delta ≈ 1.0094
        let delta_100 = delta(100.0);
        assert!(delta_100 > 1.008 && delta_100 < 1.012);

        // BKZ-300 should give delta ≈ 1.0036
        let delta_300 = delta(300.0);
        assert!(delta_300 > 1.003 && delta_300 < 1.005);

        assert_eq!(delta(2.0), LLL_DELTA);
    }

    #[test]
    fn test_delta_monotone() {
        let mut prev = delta(2.0);
        for beta in 3..600 {
            let cur = delta(beta as f64);
            assert!(cur < prev, "delta not decreasing at beta={beta}");
            prev = cur;
        }
    }

    #[test]
    fn test_cost_models_ordering() {
        let beta = 300.0;
        let d = 900.0;
        let core = ReductionCostModel::CoreSvp.bkz_log2(beta, d);
        let quantum = ReductionCostModel::QuantumCoreSvp.bkz_log2(beta, d);
        let matzov = ReductionCostModel::Matzov.bkz_log2(beta, d);
        assert!(quantum < core);
        assert!(core < matzov);
        assert!((core - 0.292 * beta).abs() < 0.01);
    }

    #[test]
    fn test_gsa_profile_volume() {
        let profile = Profile::new(ReductionShape::Gsa, 200, 500.0, 80.0, 12.0);
        let total: f64 = (0..200).map(|i| profile.at(i)).sum();
        assert!((total - 500.0).abs() < 1e-6);
        let tail: f64 = (150..200).map(|i| profile.at(i)).sum::<f64>() / 50.0;
        assert!((tail - profile.tail_mean(50)).abs() < 1e-9);
    }

    #[test]
    fn test_zgsa_profile_clipped() {
        // q-ary lattice with many q-vectors: GSA head would exceed q
        let log_q = (97.0f64).ln();
        let profile = Profile::new(ReductionShape::Zgsa, 400, 300.0 * log_q, 60.0, log_q);
        for i in 0..400 {
            let v = profile.at(i);
            assert!(v <= log_q + 1e-9 && v >= -1e-9, "b*_{i} outside [1, q]");
        }
    }

    #[test]
    fn test_log2_add() {
        assert!((log2_add(10.0, 10.0) - 11.0).abs() < 1e-12);
        assert_eq!(log2_add(5.0, f64::NEG_INFINITY), 5.0);
        assert!((log2_add(100.0, 0.0) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_erf() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((gaussian_coverage(2.0, 1.0) - 0.954_499_7).abs() < 1e-6);
    }

    #[test]
    fn test_binomial() {
        assert!((log2_binomial(10, 5) - (252.0f64).log2()).abs() < 1e-9);
        assert_eq!(ln_binomial(5, 0), 0.0);
        assert_eq!(ln_binomial(3, 4), f64::NEG_INFINITY);
    }

    #[test]
    fn test_grid() {
        assert_eq!(grid(0, 4, 10), vec![0, 1, 2, 3, 4]);
        let g = grid(0, 1000, 10);
        assert_eq!(g.first(), Some(&0));
        assert_eq!(g.last(), Some(&1000));
        assert!(g.len() <= 12);
        assert!(grid(5, 4, 10).is_empty());
    }
}
