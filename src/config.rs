//! Layered configuration (SPEC_FULL.md "Configuration").
//!
//! Built-in defaults -> optional `scenario-runner.toml` in the working
//! directory -> `SCENARIO_RUNNER_*` environment overrides, using the `config`
//! crate the way the teacher's own root crate already depended on it.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub learning_store_path: String,
    pub data_csv_path: String,
    pub headless: bool,
    pub ai_enabled: bool,
    pub ai_endpoint: String,
    pub ai_api_key: String,
    pub ai_requests_per_minute: u32,
    /// Per-candidate attempt timeout (spec.md §5, "order of 2s").
    pub candidate_timeout_ms: u64,
    /// Per-action total budget (spec.md §5, "order of 30s").
    pub action_timeout_ms: u64,
    pub max_parallel_sessions: usize,
    pub screenshot_dir: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            learning_store_path: "test_learning.json".to_string(),
            data_csv_path: "test_data.csv".to_string(),
            headless: true,
            ai_enabled: false,
            ai_endpoint: String::new(),
            ai_api_key: String::new(),
            ai_requests_per_minute: 30,
            candidate_timeout_ms: 2_000,
            action_timeout_ms: 30_000,
            max_parallel_sessions: 4,
            screenshot_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Layered as built-in defaults -> optional `scenario-runner.toml` in the
    /// working directory -> `SCENARIO_RUNNER_*` environment overrides.
    /// Fields absent from both the file and the environment fall back to
    /// [`RunnerConfig::default`] via the struct-level `#[serde(default)]`.
    pub fn load() -> anyhow::Result<Self> {
        let built = config::Config::builder()
            .add_source(config::File::with_name("scenario-runner").required(false))
            .add_source(config::Environment::with_prefix("SCENARIO_RUNNER").separator("__"))
            .build()
            .context("failed to build layered configuration")?;

        built
            .try_deserialize()
            .context("failed to deserialize RunnerConfig")
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_millis(self.candidate_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_suggested_timeouts() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.candidate_timeout(), Duration::from_millis(2_000));
        assert_eq!(cfg.action_timeout(), Duration::from_millis(30_000));
    }
}
