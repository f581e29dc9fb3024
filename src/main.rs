use clap::Parser;
use scenario_runner::cli::{Cli, Command};
use scenario_runner::config::RunnerConfig;
use scenario_runner::logging::{self, LoggingOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&LoggingOptions {
        json: cli.log_format_json,
        log_file: cli.log_file.clone(),
    });

    let config = RunnerConfig::load()?;

    let ok = match cli.command {
        Command::Run(args) => scenario_runner::run(args, config).await?,
        Command::ClearLearning => {
            let store = learning_store::LearningStore::open(config.learning_store_path)?;
            store.clear_all()?;
            true
        }
    };

    std::process::exit(if ok { 0 } else { 1 });
}
