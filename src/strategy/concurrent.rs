//! Concurrent replay strategy
//!
//! This module replays commands on a multi-threaded tokio runtime without
//! waiting for one command before submitting the next.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentReplay
//!     ├── ReplayConfig (batch_size, worker_threads)
//!     ├── AsyncReader (batch CSV reading)
//!     └── PointService (per-user gate + in-memory stores)
//! ```
//!
//! # Ordering
//!
//! Commands of a batch are submitted to the service in file order and only
//! then awaited, as spawned tasks. The service enqueues a command at
//! submission time, so each user's commands still apply in file order while
//! different users proceed in parallel. Batches are awaited one after another
//! to bound the number of in-flight commands.

use crate::cli::ReportKind;
use crate::core::InMemoryPointService;
use crate::strategy::{open_reader, write_report, ReplayStrategy, ReplaySummary};
use crate::types::PointError;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Configuration for concurrent replay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Number of commands submitted together
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub worker_threads: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a new ReplayConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            tracing::warn!(
                worker_threads,
                default = default.worker_threads,
                "invalid worker thread count, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
        }
    }
}

/// Concurrent replay strategy
#[derive(Debug, Clone)]
pub struct ConcurrentReplay {
    config: ReplayConfig,
}

impl ConcurrentReplay {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for ConcurrentReplay {
    fn replay(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, PointError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .build()?;

        runtime.block_on(async {
            let service = InMemoryPointService::in_memory();
            let mut reader = open_reader(input_path).await?;
            let mut users = BTreeSet::new();
            let mut summary = ReplaySummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Submit everything first; submission order is what the gate preserves.
                let pending: Vec<_> = batch
                    .into_iter()
                    .map(|command| {
                        users.insert(command.user_id);
                        let handle = tokio::spawn(service.submit(
                            command.kind,
                            command.user_id,
                            command.amount,
                        ));
                        (command, handle)
                    })
                    .collect();

                for (command, handle) in pending {
                    let result = handle.await.unwrap_or_else(|e| {
                        Err(PointError::work_aborted(command.user_id, &e.to_string()))
                    });
                    summary.record(&command, &result);
                }
            }

            write_report(&service, &users, report, output).await?;
            Ok(summary)
        })
    }
}
