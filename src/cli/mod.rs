//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `.intake/` with a default config |
//! | `precheck` | WIP label check and tracker snapshot before planning |
//! | `snapshot` | Tracker snapshot only |
//! | `validate` | Check the entry list without creating anything |
//! | `run` | Create the tickets, post the report, close the source ticket |
//! | `tracker list` / `tracker test` | Plugin discovery and connectivity |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr. `RUST_LOG` selects the filter; without it `--verbose`
//! (or `-v`) enables debug logs:
//! ```bash
//! intake --verbose run --ticket JD-12 --dry-run
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod precheck_cmd;
mod run_cmd;
mod tracker_cmd;
mod validate_cmd;

pub use app::{run, Cli, Commands, TicketArgs};
pub use output::{Output, OutputFormat};
pub use precheck_cmd::SKIP_EXIT_CODE;
