//! Point Engine CLI
//!
//! Replays a CSV file of point commands through the point service and prints
//! the resulting state as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > balances.csv
//! cargo run -- --mode sequential commands.csv > balances.csv
//! cargo run -- --report histories commands.csv > histories.csv
//! cargo run -- --mode concurrent --batch-size 2000 --worker-threads 8 commands.csv
//! ```
//!
//! Input columns are `type,user,amount` where `type` is `charge` or `use`.
//! Rejected commands are logged to stderr; set `RUST_LOG` to adjust verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use point_engine::cli;
use point_engine::strategy;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();
    let config = args.to_replay_config();

    tracing::info!(
        input = %args.input_file.display(),
        mode = ?args.mode,
        report = ?args.report,
        batch_size = config.batch_size,
        worker_threads = config.worker_threads,
        "replaying commands"
    );

    let strategy = strategy::create_strategy(args.mode, Some(config));

    let mut output = std::io::stdout();
    match strategy.replay(&args.input_file, args.report, &mut output) {
        Ok(summary) => tracing::info!(
            applied = summary.applied,
            rejected = summary.rejected,
            failed = summary.failed,
            "replay finished"
        ),
        Err(e) => {
            tracing::error!(error = %e, "replay failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
