//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Per-user point balance
//! - `history`: History records, transaction kinds and identifiers
//! - `error`: Error types for the point engine

pub mod balance;
pub mod error;
pub mod history;

pub use balance::Balance;
pub use error::PointError;
pub use history::{HistoryId, HistoryRecord, TransactionType, UserId};
