//! Domain model for the inventory collection.
//!
//! # Responsibility
//! - Define the canonical item record persisted in the document store.
//! - Own validation rules enforced before every write path.
//!
//! # Invariants
//! - Every item is identified by a stable, caller-assigned `id` string.
//! - The repository never generates identifiers on behalf of callers.

pub mod item;
