//! Repository layer over the document store.
//!
//! # Responsibility
//! - Define the use-case facing inventory data-access contract.
//! - Keep pagination and bulk-write mechanics out of calling services.
//!
//! # Invariants
//! - Repository writes enforce `Item::validate()` before touching the store.
//! - Paginated reads always sort ascending by `id`; page tokens are ids.
//! - Store failures surface as semantic errors, never as panics.

pub mod item_repo;
