//! Orchestrator configuration
//!
//! ## Configuration Sources
//! Values are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over .env file values.
//!
//! ## Keys
//! - `ORCHESTRATOR_DEFAULT_HARDWARE`: hardware requirement applied when a submission has none
//! - `ORCHESTRATOR_DEFAULT_MAX_MEMORY_FOOTPRINT`: memory ceiling applied when a submission has none
//! - `ORCHESTRATOR_RESULT_TIMEOUT_MS`: bound on blocking result waits (unbounded when unset)
//! - `ORCHESTRATOR_MAX_TRACKED_PROBLEMS`: ledger retention limit (unlimited when unset)

use std::time::Duration;

use crate::error::{OrchestratorError, OrchestratorResult};

pub const DEFAULT_HARDWARE: &str = "PIM_AI_1chip";
pub const DEFAULT_MAX_MEMORY_FOOTPRINT: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub default_hardware: String,
    pub default_max_memory_footprint: u32,

    /// Bound on blocking result waits. `None` waits until the worker answers.
    pub result_timeout: Option<Duration>,

    /// Number of problems the ledger keeps before evicting the oldest one.
    /// `None` keeps every task for the life of the process.
    pub max_tracked_problems: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_hardware: DEFAULT_HARDWARE.to_string(),
            default_max_memory_footprint: DEFAULT_MAX_MEMORY_FOOTPRINT,
            result_timeout: None,
            max_tracked_problems: None,
        }
    }
}

impl OrchestratorConfig {
    const HARDWARE_KEY: &'static str = "ORCHESTRATOR_DEFAULT_HARDWARE";
    const MEMORY_KEY: &'static str = "ORCHESTRATOR_DEFAULT_MAX_MEMORY_FOOTPRINT";
    const TIMEOUT_KEY: &'static str = "ORCHESTRATOR_RESULT_TIMEOUT_MS";
    const RETENTION_KEY: &'static str = "ORCHESTRATOR_MAX_TRACKED_PROBLEMS";

    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> OrchestratorResult<Self> {
        // Silently ignored when no .env file exists
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(hardware) = lookup(Self::HARDWARE_KEY).filter(|v| !v.trim().is_empty()) {
            config.default_hardware = hardware.trim().to_string();
        }
        if let Some(memory) = lookup(Self::MEMORY_KEY) {
            config.default_max_memory_footprint = parse_number(Self::MEMORY_KEY, &memory)?;
        }
        if let Some(timeout) = lookup(Self::TIMEOUT_KEY) {
            let millis: u64 = parse_number(Self::TIMEOUT_KEY, &timeout)?;
            config.result_timeout = Some(Duration::from_millis(millis));
        }
        if let Some(limit) = lookup(Self::RETENTION_KEY) {
            let limit: usize = parse_number(Self::RETENTION_KEY, &limit)?;
            if limit == 0 {
                return Err(OrchestratorError::config(format!("{} must be at least 1", Self::RETENTION_KEY)));
            }
            config.max_tracked_problems = Some(limit);
        }

        Ok(config)
    }

    pub fn with_result_timeout(mut self, timeout: Duration) -> Self {
        self.result_timeout = Some(timeout);
        self
    }

    pub fn with_max_tracked_problems(mut self, limit: usize) -> Self {
        self.max_tracked_problems = Some(limit);
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> OrchestratorResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| OrchestratorError::config(format!("{key} has invalid value '{value}'")))
}
