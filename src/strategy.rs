//! Attack strategies and the ordered registry the orchestrator walks.

use std::fmt;
use std::sync::Arc;

use crate::attacks::{self, ReductionCostModel, ReductionShape};
use crate::config::RunConfig;
use crate::cost::CostReport;
use crate::error::EstimatorError;
use crate::params::{ProblemKind, ProblemParameters};

/// What the two-step search minimises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostGoal {
    /// Total gate count, reduction plus final call.
    Gates,
    /// Wall time when reduction and final call overlap, the larger of the two.
    Time,
}

/// Cost model for the final sieve of two-step attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SieveCostModel {
    /// List-decoding sieve gate counts (AGPS20).
    Agps20,
    /// Asymptotic BDGL16 sieve with polynomial overhead.
    Bdgl16,
}

impl SieveCostModel {
    pub fn svp_log2(&self, eta: f64) -> f64 {
        match self {
            SieveCostModel::Agps20 => 0.29613 * eta + 21.0,
            SieveCostModel::Bdgl16 => 0.292 * eta + 16.4,
        }
    }
}

/// How the expected norm of the target projection is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectedNorm {
    /// Mean of the chi distribution, ≈ sqrt(η - 1/2).
    Chi,
    /// sqrt(η).
    Sqrt,
}

/// Strategy-local configuration record.
///
/// Each strategy reads only the fields it recognises; the baseline registry
/// fixes the values per strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyOptions {
    pub red_cost_model: ReductionCostModel,
    pub red_shape: ReductionShape,
    pub mitm: bool,
    pub babai: bool,
    pub fft: bool,
    pub worst_case: bool,
    pub parallel: bool,
    pub goal: CostGoal,
    pub sieve_cost: SieveCostModel,
    pub expected_norm: ExpectedNorm,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            red_cost_model: ReductionCostModel::Matzov,
            red_shape: ReductionShape::Gsa,
            mitm: false,
            babai: false,
            fft: false,
            worst_case: false,
            parallel: false,
            goal: CostGoal::Gates,
            sieve_cost: SieveCostModel::Agps20,
            expected_norm: ExpectedNorm::Chi,
        }
    }
}

impl StrategyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_red_cost_model(mut self, model: ReductionCostModel) -> Self {
        self.red_cost_model = model;
        self
    }

    pub fn with_red_shape(mut self, shape: ReductionShape) -> Self {
        self.red_shape = shape;
        self
    }

    pub fn with_mitm(mut self, mitm: bool) -> Self {
        self.mitm = mitm;
        self
    }

    pub fn with_babai(mut self, babai: bool) -> Self {
        self.babai = babai;
        self
    }

    pub fn with_fft(mut self, fft: bool) -> Self {
        self.fft = fft;
        self
    }

    pub fn with_worst_case(mut self, worst_case: bool) -> Self {
        self.worst_case = worst_case;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_goal(mut self, goal: CostGoal) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_sieve_cost(mut self, sieve_cost: SieveCostModel) -> Self {
        self.sieve_cost = sieve_cost;
        self
    }

    pub fn with_expected_norm(mut self, expected_norm: ExpectedNorm) -> Self {
        self.expected_norm = expected_norm;
        self
    }
}

/// Contract every attack-cost model fulfils.
///
/// Implementations may fail for any out-of-domain input; callers treat every
/// failure the same way.
pub trait AttackEstimator: Send + Sync {
    fn estimate(
        &self,
        params: &ProblemParameters,
        options: &StrategyOptions,
    ) -> Result<CostReport, EstimatorError>;
}

impl<F> AttackEstimator for F
where
    F: Fn(&ProblemParameters, &StrategyOptions) -> Result<CostReport, EstimatorError> + Send + Sync,
{
    fn estimate(
        &self,
        params: &ProblemParameters,
        options: &StrategyOptions,
    ) -> Result<CostReport, EstimatorError> {
        self(params, options)
    }
}

/// A named estimator together with its fixed options.
#[derive(Clone)]
pub struct Strategy {
    name: &'static str,
    label: &'static str,
    estimator: Arc<dyn AttackEstimator>,
    options: StrategyOptions,
}

impl Strategy {
    pub fn new(
        name: &'static str,
        label: &'static str,
        estimator: impl AttackEstimator + 'static,
        options: StrategyOptions,
    ) -> Self {
        Self {
            name,
            label,
            estimator: Arc::new(estimator),
            options,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    pub(crate) fn estimator(&self) -> Arc<dyn AttackEstimator> {
        Arc::clone(&self.estimator)
    }

    pub fn estimate(&self, params: &ProblemParameters) -> Result<CostReport, EstimatorError> {
        self.estimator.estimate(params, &self.options)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish()
    }
}

/// Ordered, read-only list of strategies.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    strategies: Vec<Strategy>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Baseline LWE registry in its fixed evaluation order.
    ///
    /// The combined-attacks slot is only present when enabled in `config`.
    pub fn lwe_baseline(config: &RunConfig) -> Self {
        let mut registry = Registry::new()
            .register(Strategy::new(
                "primal_usvp",
                "Primal attack (uSVP)",
                attacks::primal_usvp,
                StrategyOptions::new().with_red_shape(ReductionShape::Gsa),
            ))
            .register(Strategy::new(
                "dual",
                "Dual attack",
                attacks::dual,
                StrategyOptions::new(),
            ))
            .register(Strategy::new(
                "primal_hybrid",
                "Hybrid primal attack (mitm + Babai)",
                attacks::primal_hybrid,
                StrategyOptions::new().with_mitm(true).with_babai(true),
            ))
            .register(Strategy::new(
                "dual_hybrid",
                "Hybrid dual attack",
                attacks::dual_hybrid,
                StrategyOptions::new().with_mitm(true).with_fft(false),
            ));

        if config.combined_attacks {
            registry = registry.register(Strategy::new(
                "combined",
                "Combined attacks",
                attacks::combined,
                StrategyOptions::new().with_red_cost_model(ReductionCostModel::CoreSvp),
            ));
        }

        registry
            .register(Strategy::new(
                "arora_gb",
                "Algebraic attack (Arora-Ge / Gröbner basis)",
                attacks::arora_gb,
                StrategyOptions::new(),
            ))
            .register(Strategy::new(
                "two_step_matzov",
                "Two-step estimator (MATZOV22 profile)",
                attacks::two_step_advanced,
                StrategyOptions::new()
                    .with_red_shape(ReductionShape::Gsa)
                    .with_parallel(false)
                    .with_worst_case(false)
                    .with_goal(CostGoal::Gates)
                    .with_sieve_cost(SieveCostModel::Agps20)
                    .with_expected_norm(ExpectedNorm::Chi),
            ))
            .register(Strategy::new(
                "two_step_simple",
                "Two-step estimator (simple)",
                attacks::two_step_simple,
                StrategyOptions::new(),
            ))
    }

    /// Baseline SIS registry: a single lattice attack under the MATZOV model.
    pub fn sis_baseline(_config: &RunConfig) -> Self {
        Registry::new().register(Strategy::new(
            "sis_lattice",
            "SIS lattice attack",
            attacks::sis_lattice,
            StrategyOptions::new().with_red_cost_model(ReductionCostModel::Matzov),
        ))
    }

    pub fn for_problem(kind: ProblemKind, config: &RunConfig) -> Self {
        match kind {
            ProblemKind::Lwe => Self::lwe_baseline(config),
            ProblemKind::Sis => Self::sis_baseline(config),
        }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Strategy> {
        self.strategies.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Strategy;
    type IntoIter = std::slice::Iter<'a, Strategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lwe_baseline_order() {
        let registry = Registry::lwe_baseline(&RunConfig::default());
        assert_eq!(
            registry.names(),
            vec![
                "primal_usvp",
                "dual",
                "primal_hybrid",
                "dual_hybrid",
                "arora_gb",
                "two_step_matzov",
                "two_step_simple",
            ]
        );
    }

    #[test]
    fn test_combined_slot_gated() {
        let config = RunConfig::default().with_combined_attacks(true);
        let registry = Registry::lwe_baseline(&config);
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.names()[4], "combined");
    }

    #[test]
    fn test_sis_baseline() {
        let registry = Registry::for_problem(ProblemKind::Sis, &RunConfig::default());
        assert_eq!(registry.names(), vec!["sis_lattice"]);
        let strategy = registry.iter().next().unwrap();
        assert_eq!(strategy.options().red_cost_model, ReductionCostModel::Matzov);
    }

    #[test]
    fn test_asymmetric_hybrid_options() {
        let registry = Registry::lwe_baseline(&RunConfig::default());
        let by_name = |name: &str| registry.iter().find(|s| s.name() == name).unwrap().options().clone();
        let primal_hybrid = by_name("primal_hybrid");
        assert!(primal_hybrid.mitm && primal_hybrid.babai);
        let dual_hybrid = by_name("dual_hybrid");
        assert!(dual_hybrid.mitm && !dual_hybrid.fft);
        assert!(!by_name("dual").mitm);
    }

    #[test]
    fn test_closure_estimator() {
        let strategy = Strategy::new(
            "fixed",
            "Fixed cost",
            |_: &ProblemParameters, _: &StrategyOptions| -> Result<CostReport, EstimatorError> {
                Ok(CostReport::new("fixed", 42.0))
            },
            StrategyOptions::default(),
        );
        let params = crate::params::ParameterBuilder::sis(
            10,
            97,
            crate::params::SampleCount::Unbounded,
            5.0,
            crate::params::Norm::L2,
        )
        .unwrap();
        assert_eq!(strategy.estimate(&params).unwrap().rop_log2(), Some(42.0));
    }
}
