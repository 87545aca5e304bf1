use std::process::ExitCode;

use clap::Parser;

use condlock_cli::logging::init_logging;
use condlock_cli::{Cli, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("condlock: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logging_guard = match init_logging(&settings.logging.logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("condlock: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    condlock_core::metrics::describe_metrics();

    match condlock_cli::run(&cli.command, &settings).await {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("condlock: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
