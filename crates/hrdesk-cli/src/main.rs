//! hrdesk - terminal front-end for the hrdesk HR dashboard.
//!
//! Signs in against the backend, keeps the session between runs and
//! prints the dashboard views as plain tables.

mod commands;

use std::io;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

const USAGE: &str = "\
Usage: hrdesk <command> [args]

Commands:
  login [email]         Sign in (password from HRDESK_PASSWORD or prompt)
  logout                Sign out and forget the saved session
  whoami                Show the signed-in user
  dashboard             Headline counters
  employees             List employees
  leaves [status]       List leave requests (pending, approved, rejected)
  approve-leave <id>    Approve a pending leave request
  reject-leave <id>     Reject a pending leave request
  jobs                  List job postings
  payroll               List payroll records";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    if matches!(command, Command::Help) {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    info!(?command, "hrdesk starting");
    match commands::run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
