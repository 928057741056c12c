//! Point Engine Library
//! # Overview
//!
//! This library keeps a point balance and an append-only transaction history
//! per user, and serves charge/use/query operations on them. Concurrent
//! requests for the same user are serialized so that reading the balance,
//! writing the new balance and appending the history record act as one
//! transaction; requests for different users run independently.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Balance, HistoryRecord, PointError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::gate`] - Per-user FIFO serialization of units of work
//!   - [`core::service`] - The four caller-facing operations
//!   - [`core::balance_store`] / [`core::history_store`] - In-memory stores
//! - [`io`] - CSV command input and report output
//! - [`strategy`] - Sequential and concurrent replay of command files
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **get_balance**: Current balance; zero for an unseen user
//! - **get_histories**: The user's history records in insertion order
//! - **charge**: Add points; records a `CHARGE` entry
//! - **use_points**: Spend points if the balance covers them; records a `USE` entry
//!
//! # Example
//!
//! ```no_run
//! use point_engine::InMemoryPointService;
//!
//! # async fn run() -> Result<(), point_engine::PointError> {
//! let service = InMemoryPointService::in_memory();
//! service.charge(1, 900).await?;
//! let balance = service.use_points(1, 500).await?;
//! assert_eq!(balance.amount, 400);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{
    BalanceStore, HistoryStore, InMemoryBalanceStore, InMemoryHistoryStore, InMemoryPointService,
    PointService, UserGate,
};
pub use io::{write_balances_csv, write_histories_csv};
pub use types::{Balance, HistoryId, HistoryRecord, PointError, TransactionType, UserId};
