//! Document-store collaborator contract and implementations.
//!
//! # Responsibility
//! - Define the narrow query/write surface the item repository consumes:
//!   filtered finds, batch insert, batch upsert, index creation.
//! - Keep backend details (SQL, JSON layout) behind the trait boundary.
//!
//! # Invariants
//! - Every operation honors the caller's [`Context`]; an expired context
//!   aborts with `StoreError::Canceled`.
//! - `bulk_upsert` replaces the whole document keyed on `id`, so repeating
//!   a batch is idempotent.

use crate::ctx::{Context, ContextError};
use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod filter;
mod sqlite;

pub use filter::Filter;
pub use sqlite::SqliteDocumentStore;

/// A stored document: one JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction for finds and index definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }
}

/// Options applied to a `find` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub limit: Option<i64>,
}

/// Secondary index definition applied at initialization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Backend-scoped index name.
    pub name: String,
    /// Document field the index covers.
    pub field: String,
    pub direction: SortDirection,
    pub unique: bool,
}

/// Failure raised by a document-store backend.
#[derive(Debug)]
pub enum StoreError {
    /// Transport/driver failure from the underlying database.
    Db(DbError),
    /// A write violated the unique-id constraint.
    DuplicateKey { id: String },
    /// A document is missing its `id` field or holds a non-string id.
    InvalidDocument(String),
    /// A filter, sort, or index referenced a field name the backend
    /// refuses to interpolate.
    InvalidField(String),
    /// The caller's context expired mid-call.
    Canceled(ContextError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey { id } => write!(f, "duplicate document id {id:?}"),
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
            Self::InvalidField(field) => write!(f, "invalid field name {field:?}"),
            Self::Canceled(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Canceled(err) => Some(err),
            Self::DuplicateKey { .. } | Self::InvalidDocument(_) | Self::InvalidField(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ContextError> for StoreError {
    fn from(value: ContextError) -> Self {
        Self::Canceled(value)
    }
}

/// Narrow document-store surface consumed by the item repository.
///
/// Implementations must drain or release any server-side cursor state
/// before returning, on success and on error alike.
pub trait DocumentStore {
    /// Returns documents matching `filter`, honoring sort and limit.
    fn find(&self, ctx: &Context, filter: &Filter, options: &FindOptions)
        -> StoreResult<Vec<Document>>;

    /// Returns the first document matching `filter`, if any.
    fn find_one(&self, ctx: &Context, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Inserts all documents as new, in one batch.
    fn insert_many(&self, ctx: &Context, docs: &[Document]) -> StoreResult<()>;

    /// Replace-or-insert each document keyed on its `id`, in one batch.
    fn bulk_upsert(&self, ctx: &Context, docs: &[Document]) -> StoreResult<()>;

    /// Ensures a secondary index exists. Safe to call repeatedly.
    fn create_index(&self, ctx: &Context, spec: &IndexSpec) -> StoreResult<()>;
}
