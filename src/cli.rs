//! Thin CLI shell (spec.md §1: "CLI entry points ... are thin shells over
//! the core"). Parses arguments, builds the submission-contract request(s)
//! (spec.md §6.4), and hands them to the Parallel Coordinator — no
//! resolution logic lives here.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use runner_core_types::RowPreference;

#[derive(Parser, Debug)]
#[command(name = "scenario-runner", version, about = "Natural-language browser test runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit tracing output as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub log_format_json: bool,

    /// Also write tracing output to this file (rolling, never-rotated).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one step-list script against `url`, optionally N times in
    /// parallel (spec.md §4.8).
    Run(RunArgs),
    /// Forget every learned selector (spec.md §4.3 `clear_all`).
    ClearLearning,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Page to navigate to before the first step.
    pub url: String,

    /// Path to a newline-separated step script (spec.md §6.1).
    #[arg(long)]
    pub steps: PathBuf,

    /// Run the browser without a visible window.
    #[arg(long)]
    pub headless: bool,

    /// Enable the AI Locator fallback (spec.md §4.4) once candidates and
    /// the learning store are both exhausted.
    #[arg(long)]
    pub use_ai: bool,

    /// Which data rows this run may consume (spec.md §4.6).
    #[arg(long, value_enum, default_value = "mixed")]
    pub data_preference: DataPreferenceArg,

    /// Number of independent parallel sessions to run (spec.md §4.8).
    #[arg(short = 'n', long, default_value_t = 1)]
    pub parallel: usize,

    /// Continue past a failed step instead of stopping the session
    /// (spec.md §4.7 default is stop-on-first-failure).
    #[arg(long)]
    pub continue_on_failure: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DataPreferenceArg {
    Positive,
    Negative,
    Mixed,
}

impl From<DataPreferenceArg> for RowPreference {
    fn from(value: DataPreferenceArg) -> Self {
        match value {
            DataPreferenceArg::Positive => RowPreference::Positive,
            DataPreferenceArg::Negative => RowPreference::Negative,
            DataPreferenceArg::Mixed => RowPreference::Mixed,
        }
    }
}
