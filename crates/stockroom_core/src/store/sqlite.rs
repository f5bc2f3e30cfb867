//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist inventory documents as JSON rows in the `inventory` table.
//! - Translate [`Filter`] predicates into parameterized SQL.
//!
//! # Invariants
//! - `id` lives in its own primary-key column; every other field resolves
//!   through `json_extract` on the stored JSON body.
//! - Field names are whitelisted to `[A-Za-z0-9_]+` before they reach a SQL
//!   string; values always bind as parameters.
//! - Batch writes run inside a single transaction.

use super::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, SortDirection, StoreError,
    StoreResult,
};
use crate::ctx::Context;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};

const INVENTORY_TABLE: &str = "inventory";

/// Document store over a bootstrapped SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection previously opened via [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn find(
        &self,
        ctx: &Context,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        ctx.ensure_active()?;

        let (predicate, mut bind_values) = render_filter(filter)?;
        let mut sql = format!("SELECT doc FROM {INVENTORY_TABLE} WHERE {predicate}");

        if let Some(sort) = &options.sort {
            let column = field_expr(&sort.field)?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&column);
            sql.push_str(direction_sql(sort.direction));
        }
        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            ctx.ensure_active()?;
            documents.push(parse_doc_row(row.get::<_, String>(0)?)?);
        }

        Ok(documents)
    }

    fn find_one(&self, ctx: &Context, filter: &Filter) -> StoreResult<Option<Document>> {
        let options = FindOptions {
            sort: None,
            limit: Some(1),
        };
        Ok(self.find(ctx, filter, &options)?.into_iter().next())
    }

    fn insert_many(&self, ctx: &Context, docs: &[Document]) -> StoreResult<()> {
        ctx.ensure_active()?;

        let tx = self.conn.unchecked_transaction()?;
        for doc in docs {
            ctx.ensure_active()?;
            let id = doc_id(doc)?;
            let body = serde_json::to_string(doc)
                .map_err(|err| StoreError::InvalidDocument(err.to_string()))?;

            tx.execute(
                &format!("INSERT INTO {INVENTORY_TABLE} (id, doc) VALUES (?1, ?2);"),
                [id, body.as_str()],
            )
            .map_err(|err| map_write_error(err, id))?;
        }
        tx.commit()?;

        Ok(())
    }

    fn bulk_upsert(&self, ctx: &Context, docs: &[Document]) -> StoreResult<()> {
        ctx.ensure_active()?;

        let tx = self.conn.unchecked_transaction()?;
        for doc in docs {
            ctx.ensure_active()?;
            let id = doc_id(doc)?;
            let body = serde_json::to_string(doc)
                .map_err(|err| StoreError::InvalidDocument(err.to_string()))?;

            tx.execute(
                &format!(
                    "INSERT INTO {INVENTORY_TABLE} (id, doc) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET doc = excluded.doc;"
                ),
                [id, body.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    fn create_index(&self, ctx: &Context, spec: &IndexSpec) -> StoreResult<()> {
        ctx.ensure_active()?;

        validate_field_name(&spec.name)?;
        let expr = field_expr(&spec.field)?;
        let unique = if spec.unique { "UNIQUE " } else { "" };

        self.conn.execute_batch(&format!(
            "CREATE {unique}INDEX IF NOT EXISTS {name} ON {INVENTORY_TABLE} ({expr}{dir});",
            name = spec.name,
            dir = direction_sql(spec.direction),
        ))?;

        Ok(())
    }
}

/// Renders a filter into a SQL predicate plus its bind values.
fn render_filter(filter: &Filter) -> StoreResult<(String, Vec<Value>)> {
    match filter {
        Filter::All => Ok(("1 = 1".to_string(), Vec::new())),
        Filter::Equals { field, value } => Ok((
            format!("{} = ?", field_expr(field)?),
            vec![Value::Text(value.clone())],
        )),
        Filter::GreaterThan { field, value } => Ok((
            format!("{} > ?", field_expr(field)?),
            vec![Value::Text(value.clone())],
        )),
        Filter::In { field, values } => {
            if values.is_empty() {
                // An empty membership set matches nothing.
                return Ok(("1 = 0".to_string(), Vec::new()));
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            Ok((
                format!("{} IN ({placeholders})", field_expr(field)?),
                values.iter().cloned().map(Value::Text).collect(),
            ))
        }
        Filter::And(clauses) => {
            let mut parts = Vec::with_capacity(clauses.len());
            let mut bind_values = Vec::new();
            for clause in clauses {
                let (sql, values) = render_filter(clause)?;
                parts.push(format!("({sql})"));
                bind_values.extend(values);
            }
            if parts.is_empty() {
                return Ok(("1 = 1".to_string(), Vec::new()));
            }
            Ok((parts.join(" AND "), bind_values))
        }
    }
}

/// Maps a document field to its SQL expression: the dedicated `id` column,
/// or a `json_extract` over the JSON body for everything else.
fn field_expr(field: &str) -> StoreResult<String> {
    validate_field_name(field)?;
    if field == "id" {
        Ok("id".to_string())
    } else {
        Ok(format!("json_extract(doc, '$.{field}')"))
    }
}

fn validate_field_name(field: &str) -> StoreResult<()> {
    let well_formed = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => " ASC",
        SortDirection::Descending => " DESC",
    }
}

fn doc_id(doc: &Document) -> StoreResult<&str> {
    match doc.get("id").and_then(serde_json::Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id),
        Some(_) => Err(StoreError::InvalidDocument(
            "document id must not be empty".to_string(),
        )),
        None => Err(StoreError::InvalidDocument(
            "document is missing a string `id` field".to_string(),
        )),
    }
}

fn parse_doc_row(body: String) -> StoreResult<Document> {
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::InvalidDocument(
            "stored document is not a JSON object".to_string(),
        )),
        Err(err) => Err(StoreError::InvalidDocument(err.to_string())),
    }
}

fn map_write_error(err: rusqlite::Error, id: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return StoreError::DuplicateKey { id: id.to_string() };
        }
    }
    err.into()
}
