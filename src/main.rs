//! scm-registry: register the git repositories listed in a settings file
//! with an in-process source-control registry, then report on them or run
//! the configured commit-message rules against a message.
use anyhow::Result;
use clap::{Parser, Subcommand};
use scm_registry::core::config::{ConfigProvider, ExportFormat};
use scm_registry::core::input::ValidationSeverity;
use scm_registry::utils;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scm-registry")]
#[command(about = "Register source-control repositories and inspect their state")]
struct Cli {
    /// Settings file (defaults to ./scm-registry.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level and print details in reports
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default settings file
    Init,
    /// Check the settings file for problems
    Validate,
    /// Show the registered repositories
    Status {
        /// Select this repository id before reporting
        #[arg(long)]
        select: Option<String>,
        /// console (default), json, yaml or toml
        #[arg(long)]
        format: Option<String>,
    },
    /// Run the validation rules against a commit message
    Check {
        message: String,
        /// Repository id (defaults to the selected repository)
        #[arg(long)]
        repo: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let manager = utils::config_manager(cli.config)?;

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        manager.load_config().map(|s| s.log_level).unwrap_or_else(|_| "info".to_string())
    };
    utils::init_tracing(&log_level);

    match cli.command {
        Commands::Init => utils::initialize(&manager),
        Commands::Validate => utils::validate(&manager),
        Commands::Status { select, format } => {
            let format = format
                .as_deref()
                .filter(|f| !f.eq_ignore_ascii_case("console"))
                .map(ExportFormat::parse)
                .transpose()?;
            utils::show_status(&manager, select.as_deref(), format, cli.verbose)
        }
        Commands::Check { message, repo } => match utils::check_message(&manager, &message, repo.as_deref())? {
            Some(result) => {
                println!("{}: {}", result.severity, result.message);
                if result.severity == ValidationSeverity::Error {
                    std::process::exit(1);
                }
                Ok(())
            }
            None => {
                println!("✓ No validation feedback");
                Ok(())
            }
        },
    }
}
