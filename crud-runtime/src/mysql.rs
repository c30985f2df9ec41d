//! MySQL [`Store`] backed by an sqlx connection pool

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::Row as _;

use crate::store::{ColumnKind, Row, SqlValue, Store, StoreError};

/// Pool size when `DATABASE_MAX_CONNECTIONS` is unset or unparsable
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Invalid or missing connection settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Connection settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `mysql://` connection URL
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Read `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            url,
            max_connections,
        })
    }
}

/// [`Store`] over a MySQL pool
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Store over an existing pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Open a pool with the given settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(map_error)?;
        tracing::info!(max_connections = config.max_connections, "connected to mysql");
        Ok(Self { pool })
    }

    /// The underlying pool, for queries outside the generated handlers
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn map_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(db.message().to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn timestamp_to_chrono(ts: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}

fn chrono_to_timestamp(dt: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        // subsec_nanos is always below 1e9
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

fn bind<'q>(sql: &'q str, args: &'q [SqlValue]) -> Query<'q, MySql, MySqlArguments> {
    let mut query = sqlx::query(sql);
    for arg in args {
        query = match arg {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::UInt(u) => query.bind(*u),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Bytes(b) => query.bind(b.as_slice()),
            SqlValue::Timestamp(ts) => query.bind(timestamp_to_chrono(ts)),
        };
    }
    query
}

fn decode_row(row: &MySqlRow, shape: &[ColumnKind]) -> Result<Row, StoreError> {
    let mut values = Vec::with_capacity(shape.len());
    for (index, kind) in shape.iter().enumerate() {
        let value = match kind {
            ColumnKind::Bool => row.try_get::<Option<bool>, _>(index).map(SqlValue::from),
            ColumnKind::Int => row.try_get::<Option<i64>, _>(index).map(SqlValue::from),
            ColumnKind::UInt => row.try_get::<Option<u64>, _>(index).map(SqlValue::from),
            ColumnKind::Float => row.try_get::<Option<f64>, _>(index).map(SqlValue::from),
            ColumnKind::Text => row.try_get::<Option<String>, _>(index).map(SqlValue::from),
            ColumnKind::Bytes => row.try_get::<Option<Vec<u8>>, _>(index).map(SqlValue::from),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(index)
                .map(|dt| SqlValue::from(dt.map(chrono_to_timestamp))),
        }
        .map_err(map_error)?;
        values.push(value);
    }
    Ok(Row::new(values))
}

#[async_trait]
impl Store for MySqlStore {
    async fn execute(&self, query: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        tracing::trace!(query, "execute");
        let result = bind(query, args)
            .execute(&self.pool)
            .await
            .map_err(map_error)?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Option<Row>, StoreError> {
        tracing::trace!(query, "fetch_optional");
        let row = bind(query, args)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_error)?;
        row.map(|row| decode_row(&row, shape)).transpose()
    }

    async fn fetch_all(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Vec<Row>, StoreError> {
        tracing::trace!(query, "fetch_all");
        let rows = bind(query, args)
            .fetch_all(&self.pool)
            .await
            .map_err(map_error)?;
        rows.iter().map(|row| decode_row(row, shape)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_conversion() {
        let ts = prost_types::Timestamp {
            seconds: 1_700_000_000,
            nanos: 500,
        };
        let dt = timestamp_to_chrono(&ts).unwrap();
        assert_eq!(chrono_to_timestamp(dt), ts);

        let negative_nanos = prost_types::Timestamp {
            seconds: 0,
            nanos: -1,
        };
        assert!(timestamp_to_chrono(&negative_nanos).is_none());
    }

    #[test]
    fn test_backend_errors_are_not_unique_violations() {
        let err = map_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
