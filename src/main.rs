//! intake - Materializes planned epics and stories into an issue tracker

use std::process::ExitCode;

fn main() -> ExitCode {
    match intake_cli::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
