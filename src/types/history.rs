//! History-related types for the point engine
//!
//! This module defines the transaction kinds and the immutable history record
//! appended for every successful charge or use.

use std::fmt;

/// User identifier
pub type UserId = u64;

/// History record identifier
///
/// Unique and increasing across the whole history store, not per user.
pub type HistoryId = u64;

/// Kinds of balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Points added to a balance
    Charge,

    /// Points spent from a balance
    ///
    /// Requires the balance to cover the full amount.
    Use,
}

impl TransactionType {
    /// Upper-case name used in reports and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Charge => "CHARGE",
            TransactionType::Use => "USE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed mutation of a user's balance
///
/// Records are never modified after they are appended. Ordered by `id`, the
/// records of one user replay that user's balance from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: HistoryId,

    pub user_id: UserId,

    pub kind: TransactionType,

    /// Magnitude of the transaction, never the resulting balance
    pub amount: u64,

    /// Same value as `Balance::updated_at_millis` written by this mutation
    pub timestamp_millis: i64,
}

impl HistoryRecord {
    /// Signed effect of this record on the balance
    pub fn signed_amount(&self) -> i128 {
        match self.kind {
            TransactionType::Charge => i128::from(self.amount),
            TransactionType::Use => -i128::from(self.amount),
        }
    }
}
