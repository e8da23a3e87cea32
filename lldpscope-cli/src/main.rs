use clap::Parser;
use lldpscope_cli::args::{Cli, Commands};
use lldpscope_cli::{commands, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logged = match &cli.command {
        Commands::CaptureWorker { log_file, .. } => logging::init_file(log_file, cli.verbose),
        Commands::Run => logging::init_console(cli.verbose, "info"),
        _ => logging::init_console(cli.verbose, "warn"),
    };
    if let Err(e) = logged {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
