//! Balance-related types for the point engine
//!
//! This module defines the Balance structure holding a user's current points.

use super::history::UserId;

/// Current point balance of a single user
///
/// Exactly one record exists per user. It is created with a zero amount the
/// first time the user is seen and is only ever changed through the
/// `PointService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// The owning user
    pub user_id: UserId,

    /// Points currently held by the user
    ///
    /// Unsigned, so a negative balance cannot be represented.
    pub amount: u64,

    /// UTC milliseconds of the last successful mutation
    ///
    /// Never moves backwards for a given user. The history record produced by
    /// the same mutation carries the same value.
    pub updated_at_millis: i64,
}

impl Balance {
    /// Create a zero balance stamped at `updated_at_millis`
    pub fn zero(user_id: UserId, updated_at_millis: i64) -> Self {
        Balance {
            user_id,
            amount: 0,
            updated_at_millis,
        }
    }
}
