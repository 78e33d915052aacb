//! Relational stores for the SweetJobs backend.
//!
//! This crate provides:
//! - Store contracts for parent rows, translation rows, languages, users and events
//! - A Postgres implementation over sqlx with embedded migrations
//! - An in-memory implementation with the same transactional behavior
//! - Query metrics

pub mod error;
pub mod memory;
pub mod metrics;
pub mod postgres;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PgStore, PgTx};
pub use traits::{
    EventStore, LanguageStore, ParentStore, Store, Transaction, TranslationStore, UserStore,
};
