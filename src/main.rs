// src/main.rs

use std::process::ExitCode;

use tracing::error;

use runasd::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Without a subscriber the only place left to report to is stderr.
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("runasd: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = format!("{err:#}"), "runasd stopped on an error");
            ExitCode::FAILURE
        }
    }
}
