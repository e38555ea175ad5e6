//! Domain model for persisted task records.
//!
//! # Invariants
//! - Storage assigns every task id; callers never invent one.
//! - A task id never changes once assigned.

pub mod task;
