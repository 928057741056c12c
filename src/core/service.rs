//! Point balance operations
//!
//! This module provides the `PointService`, which exposes the four operations
//! callers may use: `get_balance`, `get_histories`, `charge` and `use_points`.
//!
//! # Design
//!
//! Reads go straight to the stores. Mutations validate their amount, then
//! submit a read-modify-write-append body to the `UserGate` keyed by user, so
//! no other mutation for that user can interleave between reading the balance
//! and appending the history record.
//!
//! ```text
//! PointService
//!     ├── Arc<B: BalanceStore>
//!     ├── Arc<H: HistoryStore>
//!     └── UserGate (one FIFO queue per active user)
//! ```
//!
//! # Consistency of reads
//!
//! Reads are not serialized. A read racing a mutation of the same user may see
//! the new balance before the matching history record exists. Callers that
//! need both to agree should read after the mutation's future has resolved.

use std::future::Future;
use std::sync::Arc;

use super::balance_store::InMemoryBalanceStore;
use super::gate::UserGate;
use super::history_store::InMemoryHistoryStore;
use super::traits::{BalanceStore, HistoryStore};
use crate::types::{Balance, HistoryRecord, PointError, TransactionType, UserId};

/// Balance operations over a pair of stores
///
/// Cheap to clone; clones share stores and gate.
#[derive(Debug)]
pub struct PointService<B, H> {
    balances: Arc<B>,
    histories: Arc<H>,
    gate: UserGate,
}

/// Service wired to the in-memory stores
pub type InMemoryPointService = PointService<InMemoryBalanceStore, InMemoryHistoryStore>;

impl<B, H> Clone for PointService<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            histories: Arc::clone(&self.histories),
            gate: self.gate.clone(),
        }
    }
}

impl InMemoryPointService {
    /// Create a service over fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        PointService::new(
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
        )
    }
}

impl<B, H> PointService<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    /// Create a service with its own gate
    pub fn new(balances: Arc<B>, histories: Arc<H>) -> Self {
        Self::with_gate(balances, histories, UserGate::new())
    }

    /// Create a service that serializes through an existing gate
    ///
    /// Anything else that mutates the same stores must submit through this
    /// gate as well.
    pub fn with_gate(balances: Arc<B>, histories: Arc<H>, gate: UserGate) -> Self {
        Self {
            balances,
            histories,
            gate,
        }
    }

    /// Gate serializing this service's mutations
    pub fn gate(&self) -> &UserGate {
        &self.gate
    }

    /// Current balance of `user_id`; zero for an unseen user
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, PointError> {
        self.balances.read(user_id).await
    }

    /// History of `user_id` in insertion order; empty for an unseen user
    pub async fn get_histories(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, PointError> {
        self.histories.list_by_user(user_id).await
    }

    /// Add `amount` points to the balance of `user_id`
    ///
    /// The charge is queued before this method returns; the future resolves to
    /// the updated balance.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `ArithmeticOverflow` - the balance would exceed `u64::MAX`
    /// * `Store` - a store failed; balance and history are left unchanged
    ///   unless the rollback itself fails, which is logged at error level
    pub fn charge(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> impl Future<Output = Result<Balance, PointError>> + Send + 'static {
        self.submit(TransactionType::Charge, user_id, amount)
    }

    /// Spend `amount` points from the balance of `user_id`
    ///
    /// The balance check and the write happen inside one unit of work, so
    /// concurrent uses can never overdraw the balance.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero or negative
    /// * `InsufficientBalance` - the balance is smaller than `amount`
    /// * `Store` - a store failed; balance and history are left unchanged
    ///   unless the rollback itself fails, which is logged at error level
    pub fn use_points(
        &self,
        user_id: UserId,
        amount: i64,
    ) -> impl Future<Output = Result<Balance, PointError>> + Send + 'static {
        self.submit(TransactionType::Use, user_id, amount)
    }

    /// Queue a mutation of the given kind
    ///
    /// An invalid amount is rejected here, without touching the stores or the
    /// user's queue.
    pub fn submit(
        &self,
        kind: TransactionType,
        user_id: UserId,
        amount: i64,
    ) -> impl Future<Output = Result<Balance, PointError>> + Send + 'static {
        let queued = validate_amount(amount).map(|amount| {
            let balances = Arc::clone(&self.balances);
            let histories = Arc::clone(&self.histories);
            self.gate.run(user_id, move || {
                apply(balances, histories, kind, user_id, amount)
            })
        });

        async move {
            match queued {
                Ok(pending) => pending.await,
                Err(error) => Err(error),
            }
        }
    }
}

/// Accept only strictly positive amounts
fn validate_amount(amount: i64) -> Result<u64, PointError> {
    u64::try_from(amount)
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or_else(|| PointError::invalid_amount(amount))
}

/// Body of one mutation; runs inside the user's queue
async fn apply<B, H>(
    balances: Arc<B>,
    histories: Arc<H>,
    kind: TransactionType,
    user_id: UserId,
    amount: u64,
) -> Result<Balance, PointError>
where
    B: BalanceStore,
    H: HistoryStore,
{
    let current = balances.read(user_id).await?;

    let next = match kind {
        TransactionType::Charge => current
            .amount
            .checked_add(amount)
            .ok_or_else(|| PointError::arithmetic_overflow("charge", user_id))?,
        TransactionType::Use => {
            if current.amount < amount {
                return Err(PointError::insufficient_balance(
                    user_id,
                    current.amount,
                    amount,
                ));
            }
            current.amount - amount
        }
    };

    let updated = balances.upsert(user_id, next).await?;

    if let Err(error) = histories
        .append(user_id, kind, amount, updated.updated_at_millis)
        .await
    {
        // The append error is what the caller must see, even when the
        // rollback fails and leaves the balance ahead of its history.
        let restored_balance = current.amount;
        if let Err(restore_error) = balances.restore(current).await {
            tracing::error!(
                user_id,
                balance = updated.amount,
                restored_balance,
                %error,
                %restore_error,
                "history append failed and balance rollback failed; balance has no matching history record"
            );
        }
        return Err(error);
    }

    Ok(updated)
}
