use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use stratex::cli::output::{print_summary, ConsoleEventSink};
use stratex::cli::{usage_example, Cli};
use stratex::config::AppConfig;
use stratex::coordination::{spawn_signal_listener, CancellablePacer};
use stratex::error::{Result, StratexError};
use stratex::exchange::build_gateway;
use stratex::logging::init_logging;
use stratex::strategy::{run_strategy, RunReport, TracingEventSink};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Conventional exit status for a run stopped by SIGINT
const EXIT_CANCELLED: u8 = 130;
const EXIT_USAGE: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_error(err),
    };

    let app_config = match AppConfig::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("\x1b[31m✗ Configuration error: {e}\x1b[0m");
            return ExitCode::FAILURE;
        }
    };
    if let Err(errors) = app_config.validate() {
        for problem in errors {
            eprintln!("\x1b[31m✗ Configuration error: {problem}\x1b[0m");
        }
        return ExitCode::FAILURE;
    }

    let _log_guard = init_logging(&app_config.logging);

    match run(cli, &app_config).await {
        Ok(report) => {
            print_summary(&report);
            if report.cancelled() {
                ExitCode::from(EXIT_CANCELLED)
            } else if report.overall_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{e}");
            // the console sink already printed validation failures
            if !matches!(e, StratexError::Validation(_)) {
                eprintln!("\x1b[31m✗ {e}\x1b[0m");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, app_config: &AppConfig) -> Result<RunReport> {
    let gateway = build_gateway(app_config, cli.dry_run)?;
    if gateway.is_dry_run() {
        warn!("Dry run: orders are acknowledged locally and never sent");
    }

    let params = cli.command.into_parameters();
    info!(
        strategy = params.kind().as_str(),
        symbol = params.symbol(),
        base_url = %app_config.exchange.base_url,
        "Starting order placement"
    );

    let token = CancellationToken::new();
    let listener = spawn_signal_listener(token.clone());
    let pacer = CancellablePacer::new(token.clone());
    let events = ConsoleEventSink::new(TracingEventSink);

    let result = run_strategy(&params, gateway.as_ref(), &events, &pacer).await;

    token.cancel();
    let _ = listener.await;
    result
}

fn usage_error(err: clap::Error) -> ExitCode {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => {
            if let Some(example) = std::env::args().skip(1).find_map(|a| usage_example(&a)) {
                eprintln!("\nExample: {example}");
            }
            ExitCode::from(EXIT_USAGE)
        }
    }
}
