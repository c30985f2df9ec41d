//! Runtime support for handlers generated by `protoc-gen-crud`
//!
//! Generated code stays thin: it converts between request messages and the
//! types here, then delegates to the executors in [`crud`]. Everything that
//! touches SQL text lives in this crate, including the [`filter`] compiler that
//! turns search criteria into parameterized `WHERE` clauses.
//!
//! Storage is reached only through the [`Store`] trait. Enable the `mysql`
//! feature for a pooled MySQL implementation.

#![warn(missing_docs)]

pub mod codec;
pub mod crud;
pub mod error;
pub mod filter;
pub mod identity;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod pagination;
pub mod proto;
pub mod store;

pub use codec::EnumCodec;
pub use crud::{Changes, NewRow, Record, TableSpec};
pub use error::{HandlerError, require};
pub use filter::{CompiledFilter, FilterCriteria, FilterOperator, Logic, compile};
pub use identity::{IdGenerator, UuidGenerator};
pub use pagination::{ListQuery, Page, Pagination};
pub use store::{ColumnKind, Columns, Row, RowError, SqlValue, Store, StoreError};

// Re-exported so generated code does not need its own dependency on these
pub use async_trait::async_trait;
pub use prost_types;
pub use tonic;
