//! Sunsync command-line entry point.

mod app;
mod config;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;

/// Log file written next to the working directory.
const LOG_FILE: &str = "sunsync.log";

#[derive(Parser, Debug)]
#[command(
    name = "sunsync",
    version,
    about = "Syncs the installed Steam library into Sunshine's apps.json"
)]
struct Args {
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Skip restarting Steam and Sunshine.
    #[arg(long)]
    no_restart: bool,

    /// Report what would change without writing anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(".", LOG_FILE));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    let status = run_sync(&args);

    // Flush the file log before exiting; process::exit skips destructors.
    drop(file_guard);
    std::process::exit(status);
}

/// Runs the sync pass and maps every outcome to an exit status.
fn run_sync(args: &Args) -> i32 {
    config::load_env_files();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            return 1;
        }
    };

    let options = app::Options {
        no_restart: args.no_restart,
        dry_run: args.dry_run,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            return 1;
        }
    };

    runtime.block_on(async {
        tokio::select! {
            result = app::run(config, options) => match result {
                Ok(()) => {
                    tracing::info!("sync completed");
                    0
                }
                Err(e) => {
                    tracing::error!(error = %e, "sync failed");
                    1
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted, no changes written");
                1
            }
        }
    })
}
