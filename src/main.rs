use std::io::Write;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use remote_runner::cli;
use remote_runner::config::constants::EXIT_USAGE;
use remote_runner::config::settings::{ClientArgs, Settings};
use remote_runner::utils::logging::{init_file_logging, init_logging};

#[tokio::main]
async fn main() {
    // Parse command line arguments; help and version exit cleanly
    let args = match ClientArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    let settings = match Settings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    // Initialize logging
    let guard = init_tracing(&settings);

    tracing::debug!("remote-runner {}", env!("CARGO_PKG_VERSION"));
    let code = cli::run(args, settings).await;

    let _ = std::io::stdout().flush();
    drop(guard);
    std::process::exit(code);
}

fn init_tracing(settings: &Settings) -> Option<WorkerGuard> {
    match &settings.log_file {
        Some(path) => match init_file_logging(&settings.log_level, path) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("warning: file logging disabled: {}", e);
                let _ = init_logging(&settings.log_level);
                None
            }
        },
        None => {
            if let Err(e) = init_logging(&settings.log_level) {
                eprintln!("warning: {}", e);
            }
            None
        }
    }
}
