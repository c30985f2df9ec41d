//! Generic CRUD executors
//!
//! Generated handlers describe their table once in a [`TableSpec`], implement
//! [`Record`] for the entity message, and delegate every operation to the
//! functions here. Each executor validates its input before touching storage,
//! wraps storage failures with the entity and action, and returns the stored
//! row (not the request) after a write.

use crate::error::HandlerError;
use crate::filter;
use crate::identity::IdGenerator;
use crate::pagination::{ListQuery, Page};
use crate::store::{ColumnKind, Row, RowError, SqlValue, Store, StoreError};

/// Static description of a generated entity's table
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Lower-case entity name used in messages, e.g. `user`
    pub entity: &'static str,
    /// Table name
    pub table: &'static str,
    /// Comma-separated writable columns, in declaration order
    pub create_columns: &'static str,
    /// One `?` per writable column
    pub create_placeholders: &'static str,
    /// `id`, the writable columns, then the audit columns
    pub select_columns: &'static str,
    /// Storage shape of each selected column
    pub row_shape: &'static [ColumnKind],
    /// Columns a list request may filter or sort on
    pub filterable: &'static [&'static str],
}

/// An entity message that maps onto one row of its table
pub trait Record: Sized + Send {
    /// The entity's table
    const TABLE: TableSpec;

    /// Decode a row selected with [`TableSpec::select_columns`]
    fn from_row(row: Row) -> Result<Self, RowError>;
}

/// Values for a new row
#[derive(Debug, Clone, Default)]
pub struct NewRow {
    /// Required-field checks, `(field, present)`, run before anything else
    pub required: Vec<(&'static str, bool)>,
    /// One value per writable column, in column order
    pub values: Vec<SqlValue>,
    /// Value of the `created_by` audit column
    pub created_by: SqlValue,
}

/// Column assignments for an update
#[derive(Debug, Clone, Default)]
pub struct Changes {
    /// `(column, value)` pairs, in the order they were set
    pub assignments: Vec<(&'static str, SqlValue)>,
    /// Value of the `updated_by` audit column
    pub updated_by: SqlValue,
}

impl Changes {
    /// Assign `value` to `column`
    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) {
        self.assignments.push((column, value.into()));
    }
}

fn not_found(spec: &TableSpec) -> HandlerError {
    HandlerError::NotFound(format!("{} not found", spec.entity))
}

fn require_id(id: &str) -> Result<(), HandlerError> {
    if id.is_empty() {
        return Err(HandlerError::invalid_argument("id is required"));
    }
    Ok(())
}

fn storage_failure(spec: &TableSpec, action: &'static str, source: StoreError) -> HandlerError {
    tracing::error!(entity = spec.entity, action, error = %source, "storage failure");
    HandlerError::storage(spec.entity, action, source)
}

fn decode<R: Record>(row: Row) -> Result<R, HandlerError> {
    R::from_row(row).map_err(|source| {
        tracing::error!(entity = R::TABLE.entity, error = %source, "row decode failure");
        HandlerError::Scan {
            entity: R::TABLE.entity,
            source,
        }
    })
}

/// Insert a row and return it as stored
#[tracing::instrument(skip_all, fields(entity = R::TABLE.entity))]
pub async fn create<R: Record>(
    store: &dyn Store,
    ids: &dyn IdGenerator,
    row: NewRow,
) -> Result<R, HandlerError> {
    crate::error::require(&row.required)?;

    let spec = R::TABLE;
    let id = ids.next_id();

    let mut columns = vec!["id"];
    let mut placeholders = vec!["?"];
    if !spec.create_columns.is_empty() {
        columns.push(spec.create_columns);
        placeholders.push(spec.create_placeholders);
    }
    let query = format!(
        "INSERT INTO {} ({}, created_by, created_at, updated_at) VALUES ({}, ?, NOW(), NOW())",
        spec.table,
        columns.join(", "),
        placeholders.join(", "),
    );

    let mut args = Vec::with_capacity(row.values.len() + 2);
    args.push(SqlValue::Text(id.clone()));
    args.extend(row.values);
    args.push(row.created_by);

    match store.execute(&query, &args).await {
        Ok(_) => {}
        Err(StoreError::UniqueViolation(detail)) => {
            tracing::debug!(detail = %detail, "create rejected by unique constraint");
            return Err(HandlerError::AlreadyExists(format!(
                "{} already exists",
                spec.entity
            )));
        }
        Err(e) => return Err(storage_failure(&spec, "create", e)),
    }
    tracing::debug!(id = %id, "created");

    match get::<R>(store, &id).await {
        Err(HandlerError::NotFound(_)) => Err(storage_failure(
            &spec,
            "read back",
            StoreError::Backend("row missing after insert".to_string()),
        )),
        other => other,
    }
}

/// Fetch one row by id
#[tracing::instrument(skip_all, fields(entity = R::TABLE.entity, id = %id))]
pub async fn get<R: Record>(store: &dyn Store, id: &str) -> Result<R, HandlerError> {
    require_id(id)?;

    let spec = R::TABLE;
    let query = format!(
        "SELECT {} FROM {} WHERE id = ?",
        spec.select_columns, spec.table
    );
    let args = [SqlValue::Text(id.to_string())];

    let row = store
        .fetch_optional(&query, &args, spec.row_shape)
        .await
        .map_err(|e| storage_failure(&spec, "get", e))?
        .ok_or_else(|| not_found(&spec))?;

    decode(row)
}

/// Apply column assignments to a row and return it as stored
#[tracing::instrument(skip_all, fields(entity = R::TABLE.entity, id = %id))]
pub async fn update<R: Record>(
    store: &dyn Store,
    id: &str,
    changes: Changes,
) -> Result<R, HandlerError> {
    require_id(id)?;
    if changes.assignments.is_empty() {
        return Err(HandlerError::invalid_argument("no fields to update"));
    }

    let spec = R::TABLE;
    let mut set = Vec::with_capacity(changes.assignments.len() + 2);
    let mut args = Vec::with_capacity(changes.assignments.len() + 2);
    for (column, value) in changes.assignments {
        set.push(format!("{column} = ?"));
        args.push(value);
    }
    set.push("updated_by = ?".to_string());
    args.push(changes.updated_by);
    set.push("updated_at = NOW()".to_string());
    args.push(SqlValue::Text(id.to_string()));

    let query = format!("UPDATE {} SET {} WHERE id = ?", spec.table, set.join(", "));
    store
        .execute(&query, &args)
        .await
        .map_err(|e| storage_failure(&spec, "update", e))?;

    get::<R>(store, id).await
}

/// Delete a row by id
#[tracing::instrument(skip_all, fields(entity = R::TABLE.entity, id = %id))]
pub async fn delete<R: Record>(store: &dyn Store, id: &str) -> Result<(), HandlerError> {
    require_id(id)?;

    let spec = R::TABLE;
    let query = format!("DELETE FROM {} WHERE id = ?", spec.table);
    let affected = store
        .execute(&query, &[SqlValue::Text(id.to_string())])
        .await
        .map_err(|e| storage_failure(&spec, "delete", e))?;

    if affected == 0 {
        return Err(not_found(&spec));
    }
    Ok(())
}

/// List one page of rows matching the query's filters
///
/// The count and page queries share one compiled filter, so the total always
/// describes the same predicate as the page.
#[tracing::instrument(skip_all, fields(entity = R::TABLE.entity))]
pub async fn list<R: Record>(store: &dyn Store, query: &ListQuery) -> Result<Page<R>, HandlerError> {
    let spec = R::TABLE;
    let pagination = &query.pagination;

    let compiled = filter::compile(&query.filters, Some(spec.filterable));
    let mut from = spec.table.to_string();
    if !compiled.is_empty() {
        from = format!("{from} {}", compiled.where_clause());
    }
    let args: Vec<SqlValue> = compiled.args.into_iter().map(SqlValue::Text).collect();

    let count_query = format!("SELECT COUNT(*) FROM {from}");
    let total = match store
        .fetch_optional(&count_query, &args, &[ColumnKind::Int])
        .await
        .map_err(|e| storage_failure(&spec, "count", e))?
    {
        Some(row) => row.columns().take::<i64>().map_err(|source| HandlerError::Scan {
            entity: spec.entity,
            source,
        })?,
        None => 0,
    };

    let page_query = format!(
        "SELECT {} FROM {from} ORDER BY {} {} LIMIT ? OFFSET ?",
        spec.select_columns,
        pagination.sort_column(spec.filterable),
        pagination.direction(),
    );
    let mut page_args = args;
    page_args.push(SqlValue::Int(i64::from(pagination.page_size)));
    page_args.push(SqlValue::Int(pagination.offset()));

    let rows = store
        .fetch_all(&page_query, &page_args, spec.row_shape)
        .await
        .map_err(|e| storage_failure(&spec, "list", e))?;
    let items = rows.into_iter().map(decode).collect::<Result<Vec<R>, _>>()?;

    tracing::debug!(total, returned = items.len(), "listed");
    Ok(Page {
        items,
        total,
        page: pagination.page,
        page_size: pagination.page_size,
    })
}
