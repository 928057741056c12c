//! Sequential replay strategy
//!
//! Runs on a single-threaded tokio runtime and awaits every command before
//! submitting the next, so at most one unit of work is in flight at any time.
//! This is the reference behavior the concurrent strategy must match.

use crate::cli::ReportKind;
use crate::core::InMemoryPointService;
use crate::strategy::{open_reader, write_report, ReplayStrategy, ReplaySummary};
use crate::types::PointError;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Sequential replay strategy
#[derive(Debug, Clone, Copy)]
pub struct SequentialReplay {
    /// Number of commands read from the file at a time
    batch_size: usize,
}

impl SequentialReplay {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}

impl ReplayStrategy for SequentialReplay {
    fn replay(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, PointError> {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;

        runtime.block_on(async {
            let service = InMemoryPointService::in_memory();
            let mut reader = open_reader(input_path).await?;
            let mut users = BTreeSet::new();
            let mut summary = ReplaySummary::default();

            loop {
                let batch = reader.read_batch(self.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for command in batch {
                    users.insert(command.user_id);
                    let result = service
                        .submit(command.kind, command.user_id, command.amount)
                        .await;
                    summary.record(&command, &result);
                }
            }

            write_report(&service, &users, report, output).await?;
            Ok(summary)
        })
    }
}
