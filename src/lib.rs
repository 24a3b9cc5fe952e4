//! # Hardness estimator for LWE and SIS
//!
//! Runs a fixed, ordered list of attack-cost models against one problem
//! instance and reports every model's cost, skipping models that do not
//! apply instead of aborting:
//!
//! 1. **Parameters** (`params`, `distribution`) - validated LWE/SIS instances and noise laws
//! 2. **Strategies** (`strategy`, `attacks`) - named estimators with fixed options, in registry order
//! 3. **Orchestration** (`orchestrator`) - failure-isolated, streaming evaluation of a registry
//! 4. **Presentation** (`report`) - legend, per-strategy blocks, summary and JSON
//!
//! ## Modules
//!
//! - [`distribution`] - Noise distributions and discretized Gaussian laws
//! - [`params`] - `ProblemParameters` and its validating builder
//! - [`cost`] - Cost reports and metrics
//! - [`attacks`] - Primal, dual, hybrid, algebraic, two-step and SIS cost models
//! - [`strategy`] - Estimator contract, strategy options and the baseline registries
//! - [`orchestrator`] - Ordered run with per-strategy isolation and optional deadlines
//! - [`report`] - Text and JSON rendering
//!
//! ## Example
//!
//! ```
//! use hardness_estimator::{NoiseDistribution, Orchestrator, ParameterBuilder, Registry, RunConfig};
//!
//! let noise = NoiseDistribution::discrete_gaussian(3.0, 0.0).unwrap();
//! let params = ParameterBuilder::lwe(64, 3329, 128, noise.clone(), noise).unwrap();
//! let registry = Registry::lwe_baseline(&RunConfig::default());
//! for result in Orchestrator::new(&registry).run(&params) {
//!     println!("{}: {}", result.name, result.outcome.is_completed());
//! }
//! ```

pub mod attacks;
pub mod config;
pub mod cost;
pub mod distribution;
pub mod error;
pub mod orchestrator;
pub mod params;
pub mod report;
pub mod strategy;

pub use config::RunConfig;
pub use cost::{CostReport, Metric, MetricValue};
pub use distribution::{build_gaussian_law, NoiseDistribution, ProbabilityLaw};
pub use error::{EstimatorError, ParameterError};
pub use orchestrator::{Orchestrator, RunSummary, SlotState, StrategyOutcome, StrategyResult};
pub use params::{Norm, ParameterBuilder, ProblemKind, ProblemParameters, SampleCount};
pub use strategy::{AttackEstimator, Registry, Strategy, StrategyOptions};
