//! Inventory data-access core.
//!
//! A stateless repository over a single logical "inventory" collection of
//! documents: cursor-paginated listing (whole collection or per owner),
//! primary-key and batch lookups, and bulk insert/upsert. Consumed as a
//! library by a surrounding service; this crate defines no CLI and no wire
//! protocol of its own.

pub mod ctx;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use ctx::{CancelHandle, Context, ContextError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemValidationError};
pub use repo::item_repo::{
    ItemPage, ItemPageQuery, ItemRepository, RepoError, RepoResult, StoreItemRepository,
    DEFAULT_PAGE_SIZE,
};
pub use store::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, Sort, SortDirection,
    SqliteDocumentStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
