//! Main CLI application structure

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{precheck_cmd, run_cmd, tracker_cmd, validate_cmd};
use crate::storage::{Config, Workspace};

#[derive(Parser)]
#[command(name = "intake")]
#[command(author, version, about = "Materializes planned epics and stories into an issue tracker")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Identifies the source ticket of a run
#[derive(clap::Args, Debug, Clone)]
pub struct TicketArgs {
    /// Key of the ticket that requested the intake
    #[arg(long, short = 't', env = "INTAKE_TICKET")]
    pub ticket: String,

    /// Automation context id; names the work-in-progress label
    #[arg(long, env = "INTAKE_CONTEXT_ID")]
    pub context_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new intake workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Create the planned epics and stories and report on the source ticket
    Run {
        #[command(flatten)]
        ticket: TicketArgs,

        /// Account the source ticket is assigned back to
        #[arg(long, env = "INTAKE_INITIATOR")]
        initiator: Option<String>,

        /// Mint fake keys and print the report instead of touching the tracker
        #[arg(long)]
        dry_run: bool,
    },

    /// Check the WIP label and write the tracker snapshot (exit 3 to skip)
    Precheck {
        #[command(flatten)]
        ticket: TicketArgs,
    },

    /// Write existing epics and stories for the planner
    Snapshot {
        #[command(flatten)]
        ticket: TicketArgs,

        /// Target folder (defaults to <input_dir>/<ticket>)
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },

    /// Check the entry list without creating anything
    Validate,

    /// Manage tracker plugins
    #[command(subcommand)]
    Tracker(tracker_cmd::TrackerCommands),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()
            .map(|config| config.global.default_format.into())
            .unwrap_or_default(),
    };
    let output = Output::new(format);

    debug!("intake starting");

    let code = match cli.command {
        Commands::Init { path } => {
            debug!("Initializing workspace at: {}", path);
            let workspace = Workspace::init(&path)?;
            debug!("Created .intake directory at: {}", workspace.intake_dir().display());
            output.success(&format!(
                "Initialized intake workspace at {}",
                workspace.root().display()
            ));
            ExitCode::SUCCESS
        }

        Commands::Run {
            ticket,
            initiator,
            dry_run,
        } => run_cmd::run(&output, &ticket, initiator, dry_run)?,

        Commands::Precheck { ticket } => precheck_cmd::precheck(&output, &ticket)?,

        Commands::Snapshot { ticket, out } => precheck_cmd::snapshot(&output, &ticket, out)?,

        Commands::Validate => validate_cmd::run(&output)?,

        Commands::Tracker(cmd) => tracker_cmd::run(cmd, &output)?,
    };

    debug!("Command completed");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "intake",
            "--format",
            "json",
            "run",
            "--ticket",
            "JD-1",
            "--context-id",
            "ctx",
            "--initiator",
            "acc-1",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Run {
                ticket,
                initiator,
                dry_run,
            } => {
                assert_eq!(ticket.ticket, "JD-1");
                assert_eq!(ticket.context_id.as_deref(), Some("ctx"));
                assert_eq!(initiator.as_deref(), Some("acc-1"));
                assert!(dry_run);
            }
            _ => panic!("expected run"),
        }
    }
}
