use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod configuration;
mod error;
mod prompt;
mod services;
mod session;

use configuration::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize an RFP and vendor proposals into the documents directory
    Summarize {
        /// The RFP document
        #[arg(long)]
        rfp: Option<PathBuf>,

        /// A vendor proposal, repeat for several vendors
        #[arg(long = "proposal")]
        proposals: Vec<PathBuf>,
    },

    /// Chat with the evaluation agents about a summarized proposal
    Chat {
        /// Vendor to evaluate, defaults to the first summarized proposal
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Summarize an RFP and one proposal, then start the evaluation chat
    Analyze {
        #[arg(long)]
        rfp: PathBuf,

        #[arg(long)]
        proposal: PathBuf,
    },

    /// Evaluate every summarized proposal and write a comparison report
    Compare,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "rfp_eval=debug,rfp_eval_cli=debug"
    } else {
        "rfp_eval=info,rfp_eval_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::new().context("Failed to load configuration")?;
    match cli.command {
        Command::Summarize { rfp, proposals } => {
            commands::summarize::run(&settings, rfp, proposals).await
        }
        Command::Chat { vendor } => commands::chat::run(&settings, vendor).await,
        Command::Analyze { rfp, proposal } => {
            commands::analyze::run(&settings, rfp, proposal).await
        }
        Command::Compare => commands::compare::run(&settings).await,
    }
}
