//! protoc-gen-crud
//!
//! A protoc plugin that turns gRPC service definitions into SQL-backed CRUD
//! handlers. Methods named `Create<X>`, `Get<X>`, `Update<X>`, `Delete<X>`
//! and `List<X>s` are bound to the message `X`; each entity gets a handler
//! file delegating to `crud-runtime`, and each package a root file with the
//! tonic service impls.
//!
//! Usage:
//!   protoc --crud_out=proto_path=crate::pb::{package}:./gen proto/*.proto

#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod generator;
pub mod model;
pub mod options;
pub mod parser;
pub mod render;

pub use error::{GenerationFailure, GeneratorError};
pub use generator::{GenerationOutput, generate, generate_from_bytes, generate_response};
pub use options::Options;
