use color_eyre::Result;

use trigger_watcher::adapters::SystemClock;
use trigger_watcher::cli::{parse_args, version_line, CliCommand, EXIT_USAGE, USAGE};
use trigger_watcher::cli_output::print_event;
use trigger_watcher::config::{self, process_env};
use trigger_watcher::watcher::{self, WatchOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    trigger_watcher::logging::init();

    let (config_path, check_only) = match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(message) => {
            eprintln!("error: {}\n\n{}", message, USAGE);
            std::process::exit(EXIT_USAGE);
        }
        CliCommand::Watch {
            config_path,
            check_only,
        } => (config_path, check_only),
    };

    let resolved = config::load(config_path.as_deref(), &process_env);

    if check_only {
        match resolved {
            Ok(config) => {
                print!("{}", config);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(WatchOutcome::EXIT_FAILURE);
            }
        }
    }

    let outcome = tokio::select! {
        outcome = watcher::run(resolved, SystemClock, |event| print_event(event)) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, abandoning watch");
            WatchOutcome::Interrupted
        }
    };

    tracing::info!(%outcome, "Watch finished");
    std::process::exit(outcome.exit_code());
}
