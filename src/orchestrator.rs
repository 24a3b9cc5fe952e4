//! Failure-isolated, ordered evaluation of a strategy registry.
//!
//! A run visits every registered strategy exactly once, in registry order,
//! and yields one [`StrategyResult`] per strategy. Any failure inside a
//! strategy (an error, a panic, a malformed report or an elapsed deadline)
//! becomes a [`StrategyOutcome::Skipped`] for that strategy only.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn};

use crate::config::RunConfig;
use crate::cost::CostReport;
use crate::error::EstimatorError;
use crate::params::ProblemParameters;
use crate::strategy::{Registry, Strategy};

/// Result of one strategy within a run.
#[derive(Clone, Debug, PartialEq)]
pub enum StrategyOutcome {
    Completed(CostReport),
    /// The reason is kept for logs and JSON output; the text presenter never shows it.
    Skipped(EstimatorError),
}

impl StrategyOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StrategyOutcome::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StrategyOutcome::Skipped(_))
    }

    pub fn report(&self) -> Option<&CostReport> {
        match self {
            StrategyOutcome::Completed(report) => Some(report),
            StrategyOutcome::Skipped(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&EstimatorError> {
        match self {
            StrategyOutcome::Skipped(err) => Some(err),
            StrategyOutcome::Completed(_) => None,
        }
    }
}

/// Per-slot state during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Running,
    Completed,
    Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyResult {
    pub name: &'static str,
    pub label: &'static str,
    pub outcome: StrategyOutcome,
}

/// Counts and the cheapest completed strategy of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    /// `(strategy name, log2 rop)` of the cheapest completed strategy.
    pub cheapest: Option<(&'static str, f64)>,
}

impl RunSummary {
    pub fn record(&mut self, result: &StrategyResult) {
        match &result.outcome {
            StrategyOutcome::Completed(report) => {
                self.completed += 1;
                if let Some(rop) = report.rop_log2() {
                    if self.cheapest.map_or(true, |(_, best)| rop < best) {
                        self.cheapest = Some((result.name, rop));
                    }
                }
            }
            StrategyOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a StrategyResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(result);
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.completed + self.skipped
    }
}

/// Drives a registry over one set of parameters.
#[derive(Clone, Debug)]
pub struct Orchestrator<'r> {
    registry: &'r Registry,
    timeout: Option<Duration>,
}

impl<'r> Orchestrator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    pub fn from_config(registry: &'r Registry, config: &RunConfig) -> Self {
        Self::new(registry).with_timeout(config.strategy_timeout)
    }

    /// Per-strategy deadline. With a deadline every call runs on its own
    /// worker thread; a late worker is abandoned, not joined.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Starts a run. Outcomes are produced lazily, one strategy per `next()`.
    pub fn run(&self, params: &ProblemParameters) -> Run<'r> {
        info!(
            problem = %params,
            fingerprint = %params.fingerprint(),
            strategies = self.registry.len(),
            "starting estimation"
        );
        Run {
            strategies: self.registry.iter(),
            params: Arc::new(params.clone()),
            timeout: self.timeout,
            states: vec![SlotState::Pending; self.registry.len()],
            position: 0,
            summary: RunSummary::default(),
            started: Instant::now(),
            finished: false,
        }
    }
}

/// An in-progress run; iterate it to evaluate the strategies in order.
pub struct Run<'r> {
    strategies: std::slice::Iter<'r, Strategy>,
    params: Arc<ProblemParameters>,
    timeout: Option<Duration>,
    states: Vec<SlotState>,
    position: usize,
    summary: RunSummary,
    started: Instant,
    finished: bool,
}

impl Run<'_> {
    pub fn states(&self) -> &[SlotState] {
        &self.states
    }

    /// Summary of the outcomes yielded so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

impl Iterator for Run<'_> {
    type Item = StrategyResult;

    fn next(&mut self) -> Option<StrategyResult> {
        let Some(strategy) = self.strategies.next() else {
            if !self.finished {
                self.finished = true;
                info!(
                    completed = self.summary.completed,
                    skipped = self.summary.skipped,
                    elapsed_ms = self.started.elapsed().as_millis() as u64,
                    "estimation finished"
                );
            }
            return None;
        };

        let slot = self.position;
        self.position += 1;
        self.states[slot] = SlotState::Running;

        let span = info_span!("strategy", name = strategy.name());
        let _guard = span.enter();
        let outcome = invoke(strategy, &self.params, self.timeout);

        match &outcome {
            StrategyOutcome::Completed(report) => {
                self.states[slot] = SlotState::Completed;
                debug!(rop = ?report.rop_log2(), tag = report.tag(), "strategy completed");
            }
            StrategyOutcome::Skipped(reason) => {
                self.states[slot] = SlotState::Skipped;
                warn!(reason = %reason, "strategy skipped");
            }
        }

        let result = StrategyResult {
            name: strategy.name(),
            label: strategy.label(),
            outcome,
        };
        self.summary.record(&result);
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.strategies.size_hint()
    }
}

impl ExactSizeIterator for Run<'_> {}

fn invoke(
    strategy: &Strategy,
    params: &Arc<ProblemParameters>,
    timeout: Option<Duration>,
) -> StrategyOutcome {
    let result = match timeout {
        None => isolate(|| strategy.estimate(params)),
        Some(limit) => with_deadline(strategy, Arc::clone(params), limit),
    };
    match result {
        Ok(report) => match report.validate() {
            Ok(()) => StrategyOutcome::Completed(report),
            Err(reason) => StrategyOutcome::Skipped(EstimatorError::MalformedReport(reason)),
        },
        Err(err) => StrategyOutcome::Skipped(err),
    }
}

fn isolate<F>(call: F) -> Result<CostReport, EstimatorError>
where
    F: FnOnce() -> Result<CostReport, EstimatorError>,
{
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(EstimatorError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn with_deadline(
    strategy: &Strategy,
    params: Arc<ProblemParameters>,
    limit: Duration,
) -> Result<CostReport, EstimatorError> {
    let estimator = strategy.estimator();
    let options = strategy.options().clone();
    let worker_params = Arc::clone(&params);
    let (tx, rx) = mpsc::channel();

    let spawned = thread::Builder::new()
        .name(format!("estimate-{}", strategy.name()))
        .spawn(move || {
            let result = isolate(|| estimator.estimate(&worker_params, &options));
            // receiver is gone once the deadline has passed
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        warn!(error = %err, "could not spawn worker, estimating inline");
        return isolate(|| strategy.estimate(&params));
    }

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(EstimatorError::TimedOut(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(EstimatorError::Panicked(
            "worker exited without a result".to_string(),
        )),
    }
}
