use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratewatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare USD/UAH rates and send an alert on significant difference
    Check {
        /// Print the alert email instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratewatch::cli::setup::setup(),
        Some(Commands::Check { dry_run }) => {
            ratewatch::run_check(cli.config_path.as_deref(), dry_run)
                .await
                .map(|outcome| println!("{outcome}"))
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
