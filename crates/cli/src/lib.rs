pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use reloom_core::config::{ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "reloom",
    about = "Reloom operator CLI",
    long_about = "Operate the Reloom garment reuse pipeline: migrations, demo fixtures, \
                  per-item analysis runs, and record inspection.",
    after_help = "Examples:\n  reloom migrate\n  reloom seed\n  reloom process --item demo-shirt-001\n  reloom show --item demo-shirt-001"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a reloom.toml config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load deterministic demo fixtures (pending items)")]
    Seed,
    #[command(about = "Run the analysis pipeline for one item")]
    Process {
        #[arg(long, help = "Item id to process")]
        item: String,
    },
    #[command(about = "Print the persisted record with status-aware field visibility")]
    Show {
        #[arg(long, help = "Item id to inspect")]
        item: String,
    },
    #[command(about = "Validate config and database connectivity")]
    Doctor,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        overrides: ConfigOverrides::default(),
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Process { item } => commands::process::run(options, &item),
        Command::Show { item } => commands::show::run(options, &item),
        Command::Doctor => commands::doctor::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
