//! Core traits for balance and history storage
//!
//! These traits describe the storage collaborators the `PointService` drives.
//! Store calls are the only points where a unit of work may suspend, so the
//! traits are async. They are fallible so that a real backend can report
//! failures; the in-memory implementations never fail.

use async_trait::async_trait;

use crate::types::{Balance, HistoryRecord, PointError, TransactionType, UserId};

/// Storage for one balance record per user
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read the user's balance
    ///
    /// An unseen user gets a zero balance, which is kept so that repeated
    /// reads return the same record.
    async fn read(&self, user_id: UserId) -> Result<Balance, PointError>;

    /// Set the user's balance to `amount` and stamp a fresh timestamp
    async fn upsert(&self, user_id: UserId, amount: u64) -> Result<Balance, PointError>;

    /// Put a previously read record back exactly as it was
    ///
    /// Used to undo an upsert whose paired history append failed.
    async fn restore(&self, snapshot: Balance) -> Result<(), PointError>;
}

/// Append-only storage for history records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record and return it with its assigned id
    async fn append(
        &self,
        user_id: UserId,
        kind: TransactionType,
        amount: u64,
        timestamp_millis: i64,
    ) -> Result<HistoryRecord, PointError>;

    /// All records of `user_id` in insertion order
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, PointError>;
}
