//! In-memory balance storage
//!
//! This module provides the `InMemoryBalanceStore`, a `DashMap`-backed
//! implementation of [`BalanceStore`].
//!
//! # Thread Safety
//!
//! DashMap shards its locks, so reads and writes for different users do not
//! contend. The store does not order mutations for the same user; that is the
//! job of the `UserGate` in front of it.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::traits::BalanceStore;
use crate::types::{Balance, PointError, UserId};

/// Balance store keeping every record in memory
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    /// Balance records by user ID
    balances: DashMap<UserId, Balance>,
}

impl InMemoryBalanceStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Number of users with a balance record
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether no user has been seen yet
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn read(&self, user_id: UserId) -> Result<Balance, PointError> {
        Ok(self
            .balances
            .entry(user_id)
            .or_insert_with(|| Balance::zero(user_id, now_millis()))
            .clone())
    }

    async fn upsert(&self, user_id: UserId, amount: u64) -> Result<Balance, PointError> {
        let now = now_millis();
        let mut entry = self
            .balances
            .entry(user_id)
            .or_insert_with(|| Balance::zero(user_id, now));

        let balance = entry.value_mut();
        balance.amount = amount;
        // Wall clock may step backwards; the record must not.
        balance.updated_at_millis = now.max(balance.updated_at_millis);

        Ok(balance.clone())
    }

    async fn restore(&self, snapshot: Balance) -> Result<(), PointError> {
        self.balances.insert(snapshot.user_id, snapshot);
        Ok(())
    }
}
