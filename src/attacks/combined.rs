//! Combined attacks: the cheapest of the primal, dual and hybrid estimates.

use tracing::trace;

use super::{dual, primal_hybrid, primal_usvp};
use crate::cost::CostReport;
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::StrategyOptions;

type Model = fn(&ProblemParameters, &StrategyOptions) -> Result<CostReport, EstimatorError>;

const MEMBERS: [(&str, Model); 3] = [
    ("usvp", primal_usvp),
    ("dual", dual),
    ("hybrid", primal_hybrid),
];

/// Cheapest of the primal, dual and primal-hybrid models under one shared
/// set of options. Fails only when every member fails.
pub fn combined(
    params: &ProblemParameters,
    options: &StrategyOptions,
) -> Result<CostReport, EstimatorError> {
    let mut best: Option<CostReport> = None;
    let mut last_error = None;

    for (name, model) in MEMBERS {
        match model(params, options) {
            Ok(report) => {
                let cheaper = match (&best, report.rop_log2()) {
                    (None, Some(_)) => true,
                    (Some(current), Some(rop)) => current.rop_log2().map_or(true, |c| rop < c),
                    (_, None) => false,
                };
                if cheaper {
                    best = Some(report);
                }
            }
            Err(err) => {
                trace!(member = name, error = %err, "combined member failed");
                last_error = Some(err);
            }
        }
    }

    match (best, last_error) {
        (Some(report), _) => Ok(report.retagged("combined")),
        (None, Some(err)) => Err(err),
        (None, None) => Err(EstimatorError::infeasible("no member produced a total cost")),
    }
}
