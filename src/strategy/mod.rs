//! Replay strategy module
//!
//! A replay strategy reads a command file, drives every command through a
//! fresh `PointService`, and writes a report of the resulting state. This is
//! the caller side of the service: it only uses `charge`, `use_points`,
//! `get_balance` and `get_histories`.
//!
//! Two strategies are provided:
//! - `SequentialReplay` awaits each command before submitting the next one.
//! - `ConcurrentReplay` submits a whole batch at once and lets the service's
//!   per-user gate order the commands.
//!
//! Both produce the same report for the same input.

use crate::cli::{ReplayMode, ReportKind};
use crate::core::InMemoryPointService;
use crate::io::csv_format::{write_balances_csv, write_histories_csv, Command};
use crate::io::AsyncReader;
use crate::types::{Balance, PointError, UserId};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

pub mod concurrent;
pub mod sequential;

pub use concurrent::{ConcurrentReplay, ReplayConfig};
pub use sequential::SequentialReplay;

/// Replay strategy trait for complete command processing pipelines
pub trait ReplayStrategy: Send + Sync {
    /// Replay the commands in `input_path` and write the requested report
    ///
    /// Rejected commands are logged and counted but do not stop the replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened, the runtime cannot be
    /// built, a store fails while building the report, or output cannot be
    /// written.
    fn replay(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, PointError>;
}

/// Outcome counts of one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Commands that changed a balance
    pub applied: usize,
    /// Commands refused by a domain rule
    pub rejected: usize,
    /// Commands that hit a store failure or an aborted unit of work
    pub failed: usize,
}

impl ReplaySummary {
    /// Count one command outcome, logging anything that did not apply
    pub fn record(&mut self, command: &Command, result: &Result<Balance, PointError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(error) if error.is_rejection() => {
                self.rejected += 1;
                tracing::warn!(
                    user_id = command.user_id,
                    kind = %command.kind,
                    amount = command.amount,
                    %error,
                    "command rejected"
                );
            }
            Err(error) => {
                self.failed += 1;
                tracing::error!(
                    user_id = command.user_id,
                    kind = %command.kind,
                    amount = command.amount,
                    %error,
                    "command failed"
                );
            }
        }
    }

    pub fn total(&self) -> usize {
        self.applied + self.rejected + self.failed
    }
}

/// Create a replay strategy for the given mode
///
/// `config` defaults to [`ReplayConfig::default`] when absent.
pub fn create_strategy(mode: ReplayMode, config: Option<ReplayConfig>) -> Box<dyn ReplayStrategy> {
    let config = config.unwrap_or_default();
    match mode {
        ReplayMode::Sequential => Box::new(SequentialReplay::new(config.batch_size)),
        ReplayMode::Concurrent => Box::new(ConcurrentReplay::new(config)),
    }
}

/// Open the command file as a streaming CSV reader
pub(crate) async fn open_reader(
    input_path: &Path,
) -> Result<AsyncReader<Compat<tokio::fs::File>>, PointError> {
    let file = tokio::fs::File::open(input_path)
        .await
        .map_err(|e| PointError::IoError {
            message: format!("Failed to open file '{}': {}", input_path.display(), e),
        })?;

    Ok(AsyncReader::new(file.compat()))
}

/// Write the report for every user that appeared in the input
pub(crate) async fn write_report(
    service: &InMemoryPointService,
    users: &BTreeSet<UserId>,
    report: ReportKind,
    output: &mut dyn Write,
) -> Result<(), PointError> {
    match report {
        ReportKind::Balances => {
            let mut balances = Vec::with_capacity(users.len());
            for user_id in users {
                balances.push(service.get_balance(*user_id).await?);
            }
            write_balances_csv(&balances, output)
        }
        ReportKind::Histories => {
            let mut records = Vec::new();
            for user_id in users {
                records.extend(service.get_histories(*user_id).await?);
            }
            write_histories_csv(&records, output)
        }
    }
}
