//! Inventory repository contract and document-store implementation.
//!
//! # Responsibility
//! - Provide paginated reads, batch lookups, and bulk writes over the
//!   inventory collection.
//! - Own the page-token protocol: tokens are the `id` of the last item of
//!   the previous page, consumed as a strictly-greater-than bound.
//!
//! # Invariants
//! - Paginated results are strictly ascending by `id`.
//! - An empty page carries no token and signals end of stream.
//! - `update_bulk` replaces whole documents keyed on `id`, so repeating a
//!   batch leaves the collection unchanged.

use crate::ctx::{Context, ContextError};
use crate::model::item::{Item, ItemValidationError};
use crate::store::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, Sort, SortDirection, StoreError,
};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Effective page size when a query asks for less than one row.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

const NAME_INDEX: &str = "idx_inventory_name_desc";
const INDEX_SETUP_TIMEOUT: Duration = Duration::from_secs(10);

pub type RepoResult<T> = Result<T, RepoError>;

/// Semantic error for inventory persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    NotFound { owner_id: String, id: String },
    QueryFailed { op: &'static str, filter: String, source: StoreError },
    InsertFailed(StoreError),
    DuplicateKey(String),
    UpdateFailed(StoreError),
    IndexFailed(StoreError),
    Canceled(ContextError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { owner_id, id } => {
                write!(f, "item {id:?} not found for owner {owner_id:?}")
            }
            Self::QueryFailed { op, filter, source } => {
                write!(f, "{op} query failed for filter [{filter}]: {source}")
            }
            Self::InsertFailed(err) => write!(f, "bulk insert failed: {err}"),
            Self::DuplicateKey(id) => write!(f, "item id {id:?} already exists"),
            Self::UpdateFailed(err) => write!(f, "bulk upsert failed: {err}"),
            Self::IndexFailed(err) => write!(f, "index setup failed: {err}"),
            Self::Canceled(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::QueryFailed { source, .. } => Some(source),
            Self::InsertFailed(err) | Self::UpdateFailed(err) | Self::IndexFailed(err) => Some(err),
            Self::Canceled(err) => Some(err),
            Self::NotFound { .. } | Self::DuplicateKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Query options for paginated item reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPageQuery {
    /// Requested rows per page. Values below 1 fall back to
    /// [`DEFAULT_PAGE_SIZE`].
    pub page_size: i64,
    /// Token from the previous page, or `None` for the first page.
    pub token: Option<String>,
}

impl ItemPageQuery {
    /// First-page query with the given page size.
    pub fn with_page_size(page_size: i64) -> Self {
        Self {
            page_size,
            token: None,
        }
    }

    /// Continuation of `self` using the token of a returned page.
    pub fn after(&self, token: impl Into<String>) -> Self {
        Self {
            page_size: self.page_size,
            token: Some(token.into()),
        }
    }
}

/// One page of items plus the continuation token, when any row was returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub next_token: Option<String>,
}

/// Repository interface for inventory read/write use-cases.
pub trait ItemRepository {
    /// Pages through the whole collection in ascending-id order.
    fn list(&self, ctx: &Context, query: &ItemPageQuery) -> RepoResult<ItemPage>;

    /// Owner-scoped primary-key lookup.
    fn get(&self, ctx: &Context, owner_id: &str, id: &str) -> RepoResult<Item>;

    /// Batch lookup; missing ids are absent from the result, result order
    /// is store-native.
    fn get_by_ids(&self, ctx: &Context, ids: &[String]) -> RepoResult<Vec<Item>>;

    /// Pages through one owner's items in ascending-id order.
    fn list_by_owner(
        &self,
        ctx: &Context,
        owner_id: &str,
        query: &ItemPageQuery,
    ) -> RepoResult<ItemPage>;

    /// Inserts all items as new documents in one batch.
    fn insert_bulk(&self, ctx: &Context, items: &[Item]) -> RepoResult<()>;

    /// Replace-or-insert each item keyed on its id, in one batch.
    fn update_bulk(&self, ctx: &Context, items: &[Item]) -> RepoResult<()>;
}

/// Inventory repository over any [`DocumentStore`] backend.
pub struct StoreItemRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> StoreItemRepository<S> {
    /// Wraps a store without touching it. Call [`Self::ensure_name_index`]
    /// separately when index setup should be observable.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Wraps a store and attempts best-effort index setup under a bounded
    /// deadline. Setup failure is logged and otherwise ignored; the
    /// repository stays usable with degraded name-query performance.
    pub fn new_with_index(store: S) -> Self {
        let repo = Self::new(store);
        let ctx = Context::with_timeout(INDEX_SETUP_TIMEOUT);
        if let Err(err) = repo.ensure_name_index(&ctx) {
            warn!("event=index_setup module=repo status=error index={NAME_INDEX} error={err}");
        }
        repo
    }

    /// Ensures the non-unique descending index on `name` exists.
    ///
    /// Surrounding services sort and search by name; the index only
    /// accelerates those paths, so callers may ignore the result.
    pub fn ensure_name_index(&self, ctx: &Context) -> RepoResult<()> {
        let spec = IndexSpec {
            name: NAME_INDEX.to_string(),
            field: "name".to_string(),
            direction: SortDirection::Descending,
            unique: false,
        };
        self.store.create_index(ctx, &spec).map_err(|err| match err {
            StoreError::Canceled(inner) => RepoError::Canceled(inner),
            other => RepoError::IndexFailed(other),
        })
    }

    /// Shared pagination path for [`ItemRepository::list`] and
    /// [`ItemRepository::list_by_owner`].
    fn page(
        &self,
        ctx: &Context,
        op: &'static str,
        owner_id: Option<&str>,
        query: &ItemPageQuery,
    ) -> RepoResult<ItemPage> {
        let mut clauses = Vec::new();
        if let Some(owner_id) = owner_id {
            clauses.push(Filter::equals("owner_id", owner_id));
        }
        if let Some(token) = &query.token {
            clauses.push(Filter::greater_than("id", token.clone()));
        }
        let filter = Filter::and(clauses);

        let options = FindOptions {
            sort: Some(Sort::ascending("id")),
            limit: Some(effective_page_size(query.page_size)),
        };

        let docs = self
            .store
            .find(ctx, &filter, &options)
            .map_err(|err| map_read_error(op, &filter, err))?;
        let items = decode_items(docs)?;

        // An empty page ends the stream and must not carry a token.
        let next_token = items.last().map(|item| item.id.clone());
        Ok(ItemPage { items, next_token })
    }
}

impl<S: DocumentStore> ItemRepository for StoreItemRepository<S> {
    fn list(&self, ctx: &Context, query: &ItemPageQuery) -> RepoResult<ItemPage> {
        self.page(ctx, "list", None, query)
    }

    fn get(&self, ctx: &Context, owner_id: &str, id: &str) -> RepoResult<Item> {
        let filter = Filter::and(vec![
            Filter::equals("id", id),
            Filter::equals("owner_id", owner_id),
        ]);

        let doc = self
            .store
            .find_one(ctx, &filter)
            .map_err(|err| map_read_error("get", &filter, err))?;

        match doc {
            Some(doc) => decode_item(doc),
            None => Err(RepoError::NotFound {
                owner_id: owner_id.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn get_by_ids(&self, ctx: &Context, ids: &[String]) -> RepoResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = Filter::is_in("id", ids.to_vec());
        let docs = self
            .store
            .find(ctx, &filter, &FindOptions::default())
            .map_err(|err| map_read_error("get_by_ids", &filter, err))?;
        decode_items(docs)
    }

    fn list_by_owner(
        &self,
        ctx: &Context,
        owner_id: &str,
        query: &ItemPageQuery,
    ) -> RepoResult<ItemPage> {
        self.page(ctx, "list_by_owner", Some(owner_id), query)
    }

    fn insert_bulk(&self, ctx: &Context, items: &[Item]) -> RepoResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let docs = encode_items(items)?;
        self.store.insert_many(ctx, &docs).map_err(|err| match err {
            StoreError::DuplicateKey { id } => RepoError::DuplicateKey(id),
            StoreError::Canceled(inner) => RepoError::Canceled(inner),
            other => RepoError::InsertFailed(other),
        })
    }

    fn update_bulk(&self, ctx: &Context, items: &[Item]) -> RepoResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let docs = encode_items(items)?;
        self.store.bulk_upsert(ctx, &docs).map_err(|err| match err {
            StoreError::Canceled(inner) => RepoError::Canceled(inner),
            other => RepoError::UpdateFailed(other),
        })
    }
}

fn effective_page_size(requested: i64) -> i64 {
    if requested < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        requested
    }
}

fn map_read_error(op: &'static str, filter: &Filter, err: StoreError) -> RepoError {
    match err {
        StoreError::Canceled(inner) => RepoError::Canceled(inner),
        StoreError::InvalidDocument(message) => RepoError::InvalidData(message),
        source => RepoError::QueryFailed {
            op,
            filter: filter.to_string(),
            source,
        },
    }
}

fn encode_items(items: &[Item]) -> RepoResult<Vec<Document>> {
    items
        .iter()
        .map(|item| {
            item.validate()?;
            match serde_json::to_value(item) {
                Ok(serde_json::Value::Object(doc)) => Ok(doc),
                Ok(_) => Err(RepoError::InvalidData(
                    "item did not serialize to a JSON object".to_string(),
                )),
                Err(err) => Err(RepoError::InvalidData(err.to_string())),
            }
        })
        .collect()
}

fn decode_items(docs: Vec<Document>) -> RepoResult<Vec<Item>> {
    docs.into_iter().map(decode_item).collect()
}

fn decode_item(doc: Document) -> RepoResult<Item> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|err| RepoError::InvalidData(err.to_string()))
}
