//! Storage seam between generated handlers and a SQL backend
//!
//! Generated code speaks to storage only through [`Store`]: parameterized
//! queries with positional `?` placeholders, an affected-row count for
//! mutations, and `None` for "no rows" kept distinct from failures.

use async_trait::async_trait;

/// A positional query argument or a decoded column value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Any signed integer
    Int(i64),
    /// Any unsigned integer
    UInt(u64),
    /// Any floating point number
    Float(f64),
    /// Text, including enum storage strings
    Text(String),
    /// Binary
    Bytes(Vec<u8>),
    /// Date and time
    Timestamp(prost_types::Timestamp),
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

sql_value_from! {
    bool => Bool as bool,
    i32 => Int as i64,
    i64 => Int as i64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    Vec<u8> => Bytes as Vec<u8>,
    prost_types::Timestamp => Timestamp as prost_types::Timestamp,
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Storage shape of a selected column, used by backends to decode rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Decodes to [`SqlValue::Bool`]
    Bool,
    /// Decodes to [`SqlValue::Int`]
    Int,
    /// Decodes to [`SqlValue::UInt`]
    UInt,
    /// Decodes to [`SqlValue::Float`]
    Float,
    /// Decodes to [`SqlValue::Text`]
    Text,
    /// Decodes to [`SqlValue::Bytes`]
    Bytes,
    /// Decodes to [`SqlValue::Timestamp`]
    Timestamp,
}

/// Errors reported by a [`Store`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// Errors decoding a row into an entity
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// The row has fewer columns than the entity reads
    #[error("row has no column {0}")]
    MissingColumn(usize),

    /// A column holds a value of the wrong shape
    #[error("column {index}: expected {expected}, found {found:?}")]
    TypeMismatch {
        /// Zero-based column position
        index: usize,
        /// Rust type the entity reads
        expected: &'static str,
        /// Value the backend returned
        found: SqlValue,
    },
}

/// One result row, in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Row holding `values` in select-list order
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column at `index`, if the row is that wide
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Sequential typed reader over the columns
    pub fn columns(self) -> Columns {
        Columns {
            values: self.values.into_iter(),
            index: 0,
        }
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::new(values)
    }
}

/// Reads the columns of a [`Row`] left to right
pub struct Columns {
    values: std::vec::IntoIter<SqlValue>,
    index: usize,
}

impl Columns {
    /// Take the next column as `T`
    pub fn take<T: FromSqlValue>(&mut self) -> Result<T, RowError> {
        let index = self.index;
        let value = self.values.next().ok_or(RowError::MissingColumn(index))?;
        self.index += 1;
        T::from_sql_value(value).map_err(|found| RowError::TypeMismatch {
            index,
            expected: T::EXPECTED,
            found,
        })
    }
}

/// Conversion from a decoded column value
///
/// On mismatch the original value is handed back for error reporting.
pub trait FromSqlValue: Sized {
    /// Type name reported in [`RowError::TypeMismatch`]
    const EXPECTED: &'static str;

    /// Convert, or return the value unchanged
    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue>;
}

impl FromSqlValue for String {
    const EXPECTED: &'static str = "text";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Bytes(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(other),
        }
    }
}

impl FromSqlValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            // MySQL has no boolean column type; TINYINT(1) comes back as an integer
            SqlValue::Int(i) => Ok(i != 0),
            SqlValue::UInt(u) => Ok(u != 0),
            other => Err(other),
        }
    }
}

macro_rules! from_sql_integer {
    ($($ty:ty),*) => {
        $(
            impl FromSqlValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
                    match value {
                        SqlValue::Int(i) => <$ty>::try_from(i).map_err(|_| SqlValue::Int(i)),
                        SqlValue::UInt(u) => <$ty>::try_from(u).map_err(|_| SqlValue::UInt(u)),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

from_sql_integer!(i32, i64, u32, u64);

impl FromSqlValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(i) => Ok(i as f64),
            other => Err(other),
        }
    }
}

impl FromSqlValue for f32 {
    const EXPECTED: &'static str = "float";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        f64::from_sql_value(value).map(|f| f as f32)
    }
}

impl FromSqlValue for prost_types::Timestamp {
    const EXPECTED: &'static str = "timestamp";

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Timestamp(ts) => Ok(ts),
            other => Err(other),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_sql_value(value: SqlValue) -> Result<Self, SqlValue> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

/// A SQL backend reached through positional parameters
#[async_trait]
pub trait Store: Send + Sync {
    /// Run a statement, returning the number of affected rows
    async fn execute(&self, query: &str, args: &[SqlValue]) -> Result<u64, StoreError>;

    /// Fetch at most one row; `Ok(None)` when the query matched nothing
    async fn fetch_optional(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Option<Row>, StoreError>;

    /// Fetch every matching row
    async fn fetch_all(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Vec<Row>, StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn execute(&self, query: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        (**self).execute(query, args).await
    }

    async fn fetch_optional(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Option<Row>, StoreError> {
        (**self).fetch_optional(query, args, shape).await
    }

    async fn fetch_all(
        &self,
        query: &str,
        args: &[SqlValue],
        shape: &[ColumnKind],
    ) -> Result<Vec<Row>, StoreError> {
        (**self).fetch_all(query, args, shape).await
    }
}
