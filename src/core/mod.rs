//! Core business logic module
//!
//! This module contains the balance processing components:
//! - `traits` - Async store abstractions the service is generic over
//! - `balance_store` - In-memory balance storage
//! - `history_store` - In-memory append-only history storage
//! - `gate` - Per-user serialization of units of work
//! - `service` - Balance operations (query, charge, use)

pub mod balance_store;
pub mod gate;
pub mod history_store;
pub mod service;
pub mod traits;

pub use balance_store::InMemoryBalanceStore;
pub use gate::UserGate;
pub use history_store::InMemoryHistoryStore;
pub use service::{InMemoryPointService, PointService};
pub use traits::{BalanceStore, HistoryStore};
