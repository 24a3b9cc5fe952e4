//! Text and JSON rendering of estimation runs. Pure functions, no I/O.

use serde_json::{json, Value};

use crate::cost::Metric;
use crate::orchestrator::{RunSummary, StrategyOutcome, StrategyResult};
use crate::params::{ProblemKind, ProblemParameters};

pub const SEPARATOR: &str = "-----------------------------------";

const LWE_LEGEND: [Metric; 17] = Metric::ALL;

const SIS_LEGEND: [Metric; 9] = [
    Metric::Rop,
    Metric::Red,
    Metric::Mem,
    Metric::Beta,
    Metric::Eta,
    Metric::Dimension,
    Metric::Delta,
    Metric::Probability,
    Metric::Repetitions,
];

/// Metrics explained in the legend for a problem kind.
pub fn legend_metrics(kind: ProblemKind) -> &'static [Metric] {
    match kind {
        ProblemKind::Lwe => &LWE_LEGEND,
        ProblemKind::Sis => &SIS_LEGEND,
    }
}

/// Legend block: one `symbol: meaning` line per metric, between separators.
pub fn legend(kind: ProblemKind) -> String {
    let mut out = String::new();
    out.push_str(SEPARATOR);
    out.push('\n');
    for metric in legend_metrics(kind) {
        let description = match (kind, metric) {
            (ProblemKind::Sis, Metric::Eta) => "dimension of the sieving call",
            _ => metric.description(),
        };
        out.push_str(&format!("{:<5}: {}\n", metric.symbol(), description));
    }
    out.push_str(SEPARATOR);
    out
}

pub fn header(params: &ProblemParameters) -> String {
    format!("{params}\nfingerprint: {}", params.fingerprint())
}

/// Text block for one strategy. Skipped strategies get a fixed notice; the
/// failure reason is left to the logs.
pub fn present(label: &str, outcome: &StrategyOutcome) -> String {
    match outcome {
        StrategyOutcome::Completed(report) => format!("{label}\n{report}\n{SEPARATOR}"),
        StrategyOutcome::Skipped(_) => format!("{label}\n  not applicable / failed\n{SEPARATOR}"),
    }
}

pub fn summary(summary: &RunSummary) -> String {
    let counts = format!(
        "{} of {} strategies completed, {} skipped",
        summary.completed,
        summary.total(),
        summary.skipped
    );
    match summary.cheapest {
        Some((name, rop)) => format!("{counts}\ncheapest: {name} (rop ≈2^{rop:.1})"),
        None => counts,
    }
}

pub fn outcome_to_json(result: &StrategyResult) -> Value {
    match &result.outcome {
        StrategyOutcome::Completed(report) => json!({
            "name": result.name,
            "label": result.label,
            "status": "completed",
            "report": report.to_json_value()
        }),
        StrategyOutcome::Skipped(reason) => json!({
            "name": result.name,
            "label": result.label,
            "status": "skipped",
            "reason": reason.to_string()
        }),
    }
}

/// Whole run as one JSON document.
pub fn run_to_json(
    params: &ProblemParameters,
    results: &[StrategyResult],
    summary: &RunSummary,
) -> Value {
    let cheapest = summary
        .cheapest
        .map(|(name, rop)| json!({ "name": name, "rop_log2": rop }));
    let strategies: Vec<Value> = results.iter().map(outcome_to_json).collect();
    json!({
        "parameters": params.to_json_value(),
        "fingerprint": params.fingerprint(),
        "strategies": strategies,
        "summary": {
            "completed": summary.completed,
            "skipped": summary.skipped,
            "cheapest": cheapest
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostReport;
    use crate::error::EstimatorError;
    use crate::params::{Norm, ParameterBuilder, SampleCount};

    fn completed() -> StrategyResult {
        StrategyResult {
            name: "primal_usvp",
            label: "Primal attack (uSVP)",
            outcome: StrategyOutcome::Completed(
                CostReport::new("usvp", 52.14).with_integer(Metric::Beta, 121),
            ),
        }
    }

    fn skipped() -> StrategyResult {
        StrategyResult {
            name: "arora_gb",
            label: "Algebraic attack",
            outcome: StrategyOutcome::Skipped(EstimatorError::infeasible("secret detail")),
        }
    }

    #[test]
    fn test_legend_lists_symbols() {
        let lwe = legend(ProblemKind::Lwe);
        assert!(lwe.starts_with(SEPARATOR));
        assert!(lwe.ends_with(SEPARATOR));
        for symbol in ["rop", "β", "|S|", "↻", "h1", "k", "dreg"] {
            assert!(lwe.contains(symbol), "missing {symbol}");
        }
        let sis = legend(ProblemKind::Sis);
        assert!(sis.contains("sieving call"));
        assert!(!sis.contains("h1"));
    }

    #[test]
    fn test_present_completed() {
        let result = completed();
        let text = present(result.label, &result.outcome);
        assert_eq!(
            text,
            format!("Primal attack (uSVP)\nrop: ≈2^52.1, β: 121, tag: usvp\n{SEPARATOR}")
        );
    }

    #[test]
    fn test_present_skipped_hides_reason() {
        let result = skipped();
        let text = present(result.label, &result.outcome);
        assert!(text.contains("not applicable / failed"));
        assert!(!text.contains("secret detail"));
    }

    #[test]
    fn test_summary_text() {
        let results = [completed(), skipped()];
        let text = summary(&RunSummary::from_results(&results));
        assert!(text.starts_with("1 of 2 strategies completed, 1 skipped"));
        assert!(text.contains("cheapest: primal_usvp (rop ≈2^52.1)"));
        assert_eq!(summary(&RunSummary::default()), "0 of 0 strategies completed, 0 skipped");
    }

    #[test]
    fn test_json_output() {
        let params = ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 20.0, Norm::Linf).unwrap();
        let results = [completed(), skipped()];
        let doc = run_to_json(&params, &results, &RunSummary::from_results(&results));
        assert_eq!(doc["fingerprint"], params.fingerprint());
        assert_eq!(doc["strategies"][0]["status"], "completed");
        assert_eq!(doc["strategies"][0]["report"]["metrics"]["beta"], 121);
        assert_eq!(doc["strategies"][1]["status"], "skipped");
        assert_eq!(doc["summary"]["cheapest"]["name"], "primal_usvp");
        assert_eq!(doc["parameters"]["m"], Value::Null);
    }

    #[test]
    fn test_header_has_fingerprint() {
        let params = ParameterBuilder::sis(50, 97, SampleCount::Unbounded, 20.0, Norm::Linf).unwrap();
        let text = header(&params);
        assert!(text.starts_with("SIS[n=50"));
        assert!(text.ends_with(&params.fingerprint()));
    }
}
