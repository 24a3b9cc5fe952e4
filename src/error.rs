use std::time::Duration;

use thiserror::Error;

/// Errors raised while building noise models or problem parameters.
///
/// Fatal to a run; raised before any strategy executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("invalid parameter range: {name} = {value} (expected {expected})")]
    InvalidParameterRange {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid distribution parameter: {name} = {value} (expected {expected})")]
    InvalidDistributionParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown distribution: {0}")]
    UnknownDistribution(String),
}

impl ParameterError {
    pub(crate) fn range(name: &'static str, value: impl ToString, expected: &'static str) -> Self {
        ParameterError::InvalidParameterRange {
            name,
            value: value.to_string(),
            expected,
        }
    }

    pub(crate) fn distribution(
        name: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        ParameterError::InvalidDistributionParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

/// Failure of a single attack-cost estimator.
///
/// The orchestrator converts every variant into a skipped outcome; none of
/// them aborts a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("not applicable: {0}")]
    NotApplicable(String),

    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(&'static str),

    #[error("infeasible: {0}")]
    Infeasible(String),

    #[error("malformed cost report: {0}")]
    MalformedReport(String),

    #[error("estimator panicked: {0}")]
    Panicked(String),

    #[error("estimator exceeded {0:?}")]
    TimedOut(Duration),
}

impl EstimatorError {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        EstimatorError::NotApplicable(reason.into())
    }

    pub fn infeasible(reason: impl Into<String>) -> Self {
        EstimatorError::Infeasible(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_message() {
        let err = ParameterError::range("n", 0, "n > 0");
        assert_eq!(
            err.to_string(),
            "invalid parameter range: n = 0 (expected n > 0)"
        );
    }

    #[test]
    fn test_estimator_error_message() {
        let err = EstimatorError::TimedOut(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
        let err = EstimatorError::not_applicable("requires an LWE instance");
        assert_eq!(err.to_string(), "not applicable: requires an LWE instance");
    }
}
