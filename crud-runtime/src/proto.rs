//! Wire types for `common.proto`
//!
//! These are the prost messages every generated service shares for list
//! queries. Services importing `common/common.proto` should map the package
//! onto this module, e.g. `extern_path(".common", "::crud_runtime::proto")`
//! in their `tonic-build` configuration.

#![allow(missing_docs)]

/// Comparison applied by a single filter condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FilterOperator {
    Equal = 0,
    NotEqual = 1,
    GreaterThan = 2,
    GreaterThanEqual = 3,
    LessThan = 4,
    LessThanEqual = 5,
    Like = 6,
    In = 7,
    NotIn = 8,
    IsNull = 9,
    IsNotNull = 10,
    Between = 11,
}

/// Boolean connective of a filter group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogicalCondition {
    And = 0,
    Or = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilterCondition {
    #[prost(string, tag = "1")]
    pub field: ::prost::alloc::string::String,
    #[prost(enumeration = "FilterOperator", tag = "2")]
    pub operator: i32,
    #[prost(string, repeated, tag = "3")]
    pub values: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilterGroup {
    #[prost(enumeration = "LogicalCondition", tag = "1")]
    pub logic: i32,
    #[prost(message, repeated, tag = "2")]
    pub filters: ::prost::alloc::vec::Vec<FilterCriteria>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilterCriteria {
    #[prost(oneof = "filter_criteria::Criteria", tags = "1, 2")]
    pub criteria: ::core::option::Option<filter_criteria::Criteria>,
}

/// Nested types for [`FilterCriteria`]
pub mod filter_criteria {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Criteria {
        #[prost(message, tag = "1")]
        Condition(super::FilterCondition),
        #[prost(message, tag = "2")]
        Group(super::FilterGroup),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Pagination {
    #[prost(int32, tag = "1")]
    pub page: i32,
    #[prost(int32, tag = "2")]
    pub page_size: i32,
    #[prost(string, tag = "3")]
    pub sort_by: ::prost::alloc::string::String,
    #[prost(bool, tag = "4")]
    pub descending: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchRequest {
    #[prost(message, repeated, tag = "1")]
    pub filters: ::prost::alloc::vec::Vec<FilterCriteria>,
    #[prost(message, optional, tag = "2")]
    pub pagination: ::core::option::Option<Pagination>,
}

/// Path of the bundled `common.proto`, for build scripts that compile it
pub const COMMON_PROTO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto/common.proto");
