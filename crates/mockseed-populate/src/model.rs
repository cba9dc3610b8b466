use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use mockseed_config::{DEFAULT_CYCLES, DEFAULT_UNIQUE_ATTEMPTS, PopulateConfig};

use crate::errors::PopulateError;

/// Options for one population run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulateOptions {
    /// Containers to walk, in order.
    pub containers: Vec<String>,
    /// Full passes over every container.
    pub cycles: u32,
    /// Leave optional fields unset on a coin toss.
    pub use_coin_toss: bool,
    /// `container.Composite` names dropped before the walk starts.
    pub excluded_composites: Vec<String>,
    /// Seed for the run's random source; drawn from entropy when unset.
    pub seed: Option<u64>,
    /// Generation attempts for unique fields.
    pub unique_attempts: u32,
}

impl PopulateOptions {
    pub fn new(containers: Vec<String>) -> Self {
        Self {
            containers,
            cycles: DEFAULT_CYCLES,
            use_coin_toss: true,
            excluded_composites: Vec::new(),
            seed: None,
            unique_attempts: DEFAULT_UNIQUE_ATTEMPTS,
        }
    }

    pub fn from_config(config: &PopulateConfig) -> Self {
        Self {
            containers: config.containers.clone(),
            cycles: config.cycles,
            use_coin_toss: config.use_coin_toss,
            excluded_composites: config.excluded_composites.clone(),
            seed: config.seed,
            unique_attempts: config.unique_attempts,
        }
    }

    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_coin_toss(mut self, enabled: bool) -> Self {
        self.use_coin_toss = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_excluded(mut self, composites: Vec<String>) -> Self {
        self.excluded_composites = composites;
        self
    }

    /// Reject option sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), PopulateError> {
        if self.containers.is_empty() {
            return Err(PopulateError::Config(
                "at least one container is required".to_string(),
            ));
        }
        if self.cycles == 0 {
            return Err(PopulateError::Config(
                "cycles must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn excluded_set(&self) -> BTreeSet<String> {
        self.excluded_composites.iter().cloned().collect()
    }
}

/// Non-fatal outcome recorded while populating one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulateIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    /// `container.Composite.field` the issue belongs to.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u32>,
}

impl PopulateIssue {
    pub fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            path: path.into(),
            cycle: None,
        }
    }

    pub fn info(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "info".to_string(),
            ..Self::warning(code, path, message)
        }
    }

    pub fn in_cycle(mut self, cycle: u32) -> Self {
        self.cycle = Some(cycle);
        self
    }
}

/// Counters and issues for one population run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub seed: u64,
    pub cycles: u32,
    pub containers: usize,
    pub composites_persisted: u64,
    pub fields_filled: u64,
    pub fields_skipped: u64,
    pub handler_misses: u64,
    pub unique_exhausted: u64,
    pub unique_retries: u64,
    /// Filled fields per generator source (`choices`, `strict:<path>`, `global:<tag>`).
    pub handler_usage: BTreeMap<String, u64>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<PopulateIssue>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(run_id: String, seed: u64, cycles: u32, containers: usize) -> Self {
        Self {
            run_id,
            seed,
            cycles,
            containers,
            ..Self::default()
        }
    }

    pub fn record_persisted(&mut self) {
        self.composites_persisted += 1;
    }

    pub fn record_filled(&mut self, source: &str) {
        self.fields_filled += 1;
        *self.handler_usage.entry(source.to_string()).or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self) {
        self.fields_skipped += 1;
    }

    pub fn record_handler_miss(&mut self, issue: PopulateIssue) {
        self.handler_misses += 1;
        self.record_issue(issue);
    }

    pub fn record_unique_exhausted(&mut self, issue: PopulateIssue) {
        self.unique_exhausted += 1;
        self.record_issue(issue);
    }

    pub fn record_unique_retries(&mut self, retries: u32) {
        self.unique_retries += u64::from(retries);
    }

    pub fn record_issue(&mut self, issue: PopulateIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn issue_count(&self, code: &str) -> u64 {
        self.warnings_by_code.get(code).copied().unwrap_or(0)
    }

    /// `(containers, composites persisted, fields filled, fields skipped)`.
    pub fn totals(&self) -> (usize, u64, u64, u64) {
        (
            self.containers,
            self.composites_persisted,
            self.fields_filled,
            self.fields_skipped,
        )
    }
}
