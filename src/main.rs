use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cloudtrailctl::commands;
use cloudtrailctl::config::{AccessArgs, HistoryArgs};

#[derive(Parser)]
#[command(name = "cloudtrailctl")]
#[command(about = "CloudTrail write and permission-denied history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    access: AccessArgs,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints cloudtrail write events to console with optional filtering
    WriteHistory {
        #[command(flatten)]
        history: HistoryArgs,

        /// Only show events on resources carrying this tag (KEY:VALUE)
        #[arg(long, value_name = "KEY:VALUE")]
        tagged: Option<String>,
    },

    /// Prints cloudtrail permission denied events to console
    PermissionDeniedHistory {
        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,cloudtrailctl=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::WriteHistory { history, tagged } => {
            commands::write_history::run(&cli.access, &history, tagged.as_deref()).await
        }
        Commands::PermissionDeniedHistory { history } => {
            commands::permission_denied_history::run(&cli.access, &history).await
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "cloudtrailctl", &mut std::io::stdout());
            Ok(())
        }
    }
}
