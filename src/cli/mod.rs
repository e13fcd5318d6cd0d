pub mod args;
pub mod config_cmd;
pub mod kb;
pub mod patterns;
pub mod run;
pub mod runtime;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use args::{CliArgs, Commands, OutputFormat};
use runtime::{init_logging, load_config, LoadedConfig};

pub async fn execute() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level, cli.debug)?;

    info!("starting wayfarer v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { config, path } = load_config(cli.config.as_ref())?;
    let json_output = matches!(cli.output, OutputFormat::Json);

    let outcome = dispatch(cli.command, &config, &path, json_output).await;
    if let Err(err) = &outcome {
        error!("command failed: {err:#}");
    }
    outcome
}

async fn dispatch(command: Commands, config: &crate::config::RunnerConfig, config_path: &std::path::Path, json_output: bool) -> Result<()> {
    match command {
        Commands::Run(args) => run::cmd_run(args, config, json_output).await,
        Commands::Kb(args) => kb::cmd_kb(args, &config.knowledge_dir, config.stale_after_days, config.decay_rate),
        Commands::Patterns(args) => patterns::cmd_patterns(args, &config.knowledge_dir),
        Commands::Config(args) => config_cmd::cmd_config(args, config_path, config),
        Commands::Info => {
            println!("wayfarer v{}", env!("CARGO_PKG_VERSION"));
            println!("knowledge dir: {}", config.knowledge_dir.display());
            println!("config: {}", config_path.display());
            Ok(())
        }
    }
}
