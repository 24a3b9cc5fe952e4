//! Run-wide settings shared by the registry, the orchestrator and the CLI.

use std::time::Duration;

/// Per-run configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunConfig {
    /// Adds the combined-attacks slot to the LWE registry.
    pub combined_attacks: bool,
    /// Deadline for a single strategy; a late strategy is reported as skipped.
    pub strategy_timeout: Option<Duration>,
    /// Emit JSON instead of text blocks.
    pub json: bool,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combined_attacks(mut self, enabled: bool) -> Self {
        self.combined_attacks = enabled;
        self
    }

    pub fn with_strategy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}
