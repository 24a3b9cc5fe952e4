//! Cost reports produced by attack-cost models.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Map, Value};

/// Metric reported by an attack-cost model.
///
/// Declaration order is legend order; reports iterate in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Total operation count.
    Rop,
    /// Lattice-reduction cost.
    Red,
    /// Search / final SVP-call cost.
    Svp,
    /// Memory.
    Mem,
    /// BKZ block size.
    Beta,
    /// Lattice dimension.
    Dimension,
    /// Dimension of the final SVP/BDD call.
    Eta,
    /// Root Hermite factor.
    Delta,
    /// Number of guessed coordinates.
    Zeta,
    /// Guessing search-space size.
    SearchSpace,
    /// Success probability.
    Probability,
    /// Repetition factor.
    Repetitions,
    /// Samples actually used.
    Samples,
    /// Non-zero coordinates among the guessed ones.
    H1,
    /// Meet-in-the-middle split dimension.
    Split,
    /// Degree of regularity of the polynomial system.
    Dreg,
    /// Noise bound assumed for the polynomial system.
    NoiseBound,
}

impl Metric {
    pub const ALL: [Metric; 17] = [
        Metric::Rop,
        Metric::Red,
        Metric::Svp,
        Metric::Mem,
        Metric::Beta,
        Metric::Dimension,
        Metric::Eta,
        Metric::Delta,
        Metric::Zeta,
        Metric::SearchSpace,
        Metric::Probability,
        Metric::Repetitions,
        Metric::Samples,
        Metric::H1,
        Metric::Split,
        Metric::Dreg,
        Metric::NoiseBound,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Metric::Rop => "rop",
            Metric::Red => "red",
            Metric::Svp => "svp",
            Metric::Mem => "mem",
            Metric::Beta => "β",
            Metric::Dimension => "d",
            Metric::Eta => "η",
            Metric::Delta => "δ",
            Metric::Zeta => "ζ",
            Metric::SearchSpace => "|S|",
            Metric::Probability => "prob",
            Metric::Repetitions => "↻",
            Metric::Samples => "m",
            Metric::H1 => "h1",
            Metric::Split => "k",
            Metric::Dreg => "dreg",
            Metric::NoiseBound => "t",
        }
    }

    /// ASCII key used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Rop => "rop",
            Metric::Red => "red",
            Metric::Svp => "svp",
            Metric::Mem => "mem",
            Metric::Beta => "beta",
            Metric::Dimension => "d",
            Metric::Eta => "eta",
            Metric::Delta => "delta",
            Metric::Zeta => "zeta",
            Metric::SearchSpace => "search_space",
            Metric::Probability => "prob",
            Metric::Repetitions => "repetitions",
            Metric::Samples => "m",
            Metric::H1 => "h1",
            Metric::Split => "k",
            Metric::Dreg => "dreg",
            Metric::NoiseBound => "t",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Metric::Rop => "total cost",
            Metric::Red => "lattice-reduction cost",
            Metric::Svp => "search cost",
            Metric::Mem => "total memory",
            Metric::Beta => "BKZ block size",
            Metric::Dimension => "lattice dimension",
            Metric::Eta => "dimension of the final SVP/BDD call",
            Metric::Delta => "root Hermite factor of the reduced basis",
            Metric::Zeta => "number of guessed coordinates",
            Metric::SearchSpace => "guessing search-space size",
            Metric::Probability => "success probability",
            Metric::Repetitions => "number of repetitions",
            Metric::Samples => "samples actually used",
            Metric::H1 => "non-zero entries among guessed coordinates",
            Metric::Split => "meet-in-the-middle split dimension",
            Metric::Dreg => "degree of regularity",
            Metric::NoiseBound => "assumed noise bound",
        }
    }
}

/// Value of a metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    /// Quantity stored as its base-2 logarithm (costs, memory, sizes).
    Log2(f64),
    Integer(u64),
    Real(f64),
}

impl MetricValue {
    pub fn is_finite(&self) -> bool {
        match *self {
            MetricValue::Log2(x) | MetricValue::Real(x) => x.is_finite(),
            MetricValue::Integer(_) => true,
        }
    }

    pub fn to_json_value(&self) -> Value {
        match *self {
            MetricValue::Log2(x) => json!({ "log2": x }),
            MetricValue::Integer(x) => json!(x),
            MetricValue::Real(x) => json!(x),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Log2(x) => write!(f, "≈2^{x:.1}"),
            MetricValue::Integer(x) => write!(f, "{x}"),
            MetricValue::Real(x) => match f.precision() {
                Some(p) => write!(f, "{x:.p$}"),
                None => write!(f, "{x:.4}"),
            },
        }
    }
}

/// Structured output of one attack-cost model.
#[derive(Clone, Debug, PartialEq)]
pub struct CostReport {
    tag: &'static str,
    metrics: BTreeMap<Metric, MetricValue>,
}

impl CostReport {
    /// New report with the total cost `rop` given as log2.
    pub fn new(tag: &'static str, rop_log2: f64) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(Metric::Rop, MetricValue::Log2(rop_log2));
        Self { tag, metrics }
    }

    pub fn with(mut self, metric: Metric, value: MetricValue) -> Self {
        self.metrics.insert(metric, value);
        self
    }

    pub fn with_log2(self, metric: Metric, log2: f64) -> Self {
        self.with(metric, MetricValue::Log2(log2))
    }

    pub fn with_integer(self, metric: Metric, value: u64) -> Self {
        self.with(metric, MetricValue::Integer(value))
    }

    pub fn with_real(self, metric: Metric, value: f64) -> Self {
        self.with(metric, MetricValue::Real(value))
    }

    /// Same report under another tag.
    pub fn retagged(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.metrics.get(&metric).copied()
    }

    /// Total cost as log2, if recorded as a cost.
    pub fn rop_log2(&self) -> Option<f64> {
        match self.get(Metric::Rop) {
            Some(MetricValue::Log2(x)) => Some(x),
            _ => None,
        }
    }

    pub fn beta(&self) -> Option<u64> {
        match self.get(Metric::Beta) {
            Some(MetricValue::Integer(b)) => Some(b),
            _ => None,
        }
    }

    /// Metrics in legend order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        self.metrics.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Checks the report contract: finite, non-negative total cost and finite values.
    pub fn validate(&self) -> Result<(), String> {
        match self.rop_log2() {
            None => return Err("missing total cost".to_string()),
            Some(rop) if !rop.is_finite() => return Err(format!("non-finite total cost {rop}")),
            Some(rop) if rop < 0.0 => return Err(format!("negative log2 total cost {rop}")),
            Some(_) => {}
        }
        if let Some((metric, value)) = self.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("non-finite {} = {:?}", metric.key(), value));
        }
        Ok(())
    }

    pub fn to_json_value(&self) -> Value {
        let mut metrics = Map::new();
        for (metric, value) in self.iter() {
            metrics.insert(metric.key().to_string(), value.to_json_value());
        }
        json!({
            "tag": self.tag,
            "metrics": Value::Object(metrics)
        })
    }
}

impl fmt::Display for CostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (metric, value) in self.iter() {
            match metric {
                Metric::Delta => write!(f, "{}: {:.6}, ", metric.symbol(), value)?,
                _ => write!(f, "{}: {}, ", metric.symbol(), value)?,
            }
        }
        write!(f, "tag: {}", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_in_legend_order() {
        let report = CostReport::new("usvp", 52.1)
            .with_integer(Metric::Dimension, 301)
            .with_integer(Metric::Beta, 121)
            .with_log2(Metric::Red, 52.1);
        let order: Vec<Metric> = report.iter().map(|(m, _)| m).collect();
        assert_eq!(order, vec![Metric::Rop, Metric::Red, Metric::Beta, Metric::Dimension]);
    }

    #[test]
    fn test_display() {
        let report = CostReport::new("usvp", 52.14)
            .with_integer(Metric::Beta, 121)
            .with_real(Metric::Delta, 1.007051);
        assert_eq!(
            report.to_string(),
            "rop: ≈2^52.1, β: 121, δ: 1.007051, tag: usvp"
        );
    }

    #[test]
    fn test_validate() {
        assert!(CostReport::new("ok", 0.0).validate().is_ok());
        assert!(CostReport::new("neg", -1.0).validate().is_err());
        assert!(CostReport::new("inf", f64::INFINITY).validate().is_err());
        let nan_metric = CostReport::new("nan", 10.0).with_real(Metric::Probability, f64::NAN);
        assert!(nan_metric.validate().is_err());
    }

    #[test]
    fn test_json() {
        let report = CostReport::new("dual", 80.0).with_integer(Metric::Beta, 200);
        let json = report.to_json_value();
        assert_eq!(json["tag"], "dual");
        assert_eq!(json["metrics"]["beta"], 200);
        assert_eq!(json["metrics"]["rop"]["log2"], 80.0);
    }

    #[test]
    fn test_all_metrics_listed_once() {
        let mut sorted = Metric::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), Metric::ALL.len());
        assert_eq!(sorted, Metric::ALL.to_vec());
    }
}
