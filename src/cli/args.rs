use crate::strategy::ReplayConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay point charge/use commands and report balances or histories
#[derive(Parser, Debug)]
#[command(name = "point-engine")]
#[command(about = "Replay point charge/use commands and report the resulting state", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing command records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (type,user,amount)")]
    pub input_file: PathBuf,

    /// How commands are driven through the service
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "concurrent",
        help = "Replay mode: 'sequential' awaits each command, 'concurrent' submits whole batches"
    )]
    pub mode: ReplayMode,

    /// Number of commands read and submitted together
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (concurrent mode only)
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Which report to print
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "balances",
        help = "Report to print: 'balances' or 'histories'"
    )]
    pub report: ReportKind,
}

/// Available replay modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReplayMode {
    Sequential,
    Concurrent,
}

/// Available reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// One row per user: user, amount
    Balances,
    /// One row per history record: user, type, amount
    Histories,
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced with
    /// defaults and a warning is logged.
    pub fn to_replay_config(&self) -> ReplayConfig {
        if self.batch_size.is_some() || self.worker_threads.is_some() {
            let default = ReplayConfig::default();
            ReplayConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.worker_threads.unwrap_or(default.worker_threads),
            )
        } else {
            ReplayConfig::default()
        }
    }
}
