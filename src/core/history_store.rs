//! In-memory history storage
//!
//! Records are grouped per user so that listing one user's history does not
//! scan everyone else's. Ids come from a single store-wide counter, which keeps
//! them unique and increasing across users.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::HistoryStore;
use crate::types::{HistoryId, HistoryRecord, PointError, TransactionType, UserId};

/// Append-only history store kept in memory
#[derive(Debug)]
pub struct InMemoryHistoryStore {
    /// Records of each user in insertion order
    records: DashMap<UserId, Vec<HistoryRecord>>,

    /// Next id to hand out
    next_id: AtomicU64,
}

impl InMemoryHistoryStore {
    /// Create a new empty store; the first record gets id 1
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Total number of records across all users
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&self) -> HistoryId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(
        &self,
        user_id: UserId,
        kind: TransactionType,
        amount: u64,
        timestamp_millis: i64,
    ) -> Result<HistoryRecord, PointError> {
        let mut entry = self.records.entry(user_id).or_default();

        // Allocated under the user's entry lock so per-user order matches id order.
        let record = HistoryRecord {
            id: self.allocate_id(),
            user_id,
            kind,
            amount,
            timestamp_millis,
        };
        entry.push(record.clone());

        Ok(record)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, PointError> {
        Ok(self
            .records
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
