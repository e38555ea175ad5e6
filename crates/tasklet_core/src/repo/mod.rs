//! Repository layer: data access contracts and SQLite implementations.
//!
//! # Invariants
//! - Repositories never open connections themselves; they receive a
//!   [`crate::db::ConnectionProvider`].
//! - Repository APIs report semantic outcomes (`Ok(false)` for no-match
//!   writes) separately from store-access errors.

pub mod task_repo;
