//! Rust source rendering
//!
//! Code is built with `quote!` and formatted with prettyplease. Generated
//! files refer to prost types through a `proto` alias for the package module
//! and to everything else through `crud_runtime`.

pub mod entity;
pub mod service;

use heck::ToSnakeCase;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::error::GeneratorError;
use crate::model::{ScalarType, TypeRef};
use crate::options::Options;

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized",
    "virtual", "yield", "try", "gen",
];

/// Identifier prost gives a field or method: snake case, keywords escaped
pub(crate) fn rust_ident(name: &str) -> Ident {
    let snake = name.to_snake_case();
    match snake.as_str() {
        // Not allowed as raw identifiers
        "self" | "super" | "crate" => format_ident!("{}_", snake),
        s if RUST_KEYWORDS.contains(&s) => format_ident!("r#{}", snake),
        _ => format_ident!("{}", snake),
    }
}

/// Rust type prost uses for a scalar
pub(crate) fn scalar_tokens(scalar: ScalarType) -> TokenStream {
    match scalar {
        ScalarType::Bool => quote!(bool),
        ScalarType::Int32 => quote!(i32),
        ScalarType::Int64 => quote!(i64),
        ScalarType::UInt32 => quote!(u32),
        ScalarType::UInt64 => quote!(u64),
        ScalarType::Float => quote!(f32),
        ScalarType::Double => quote!(f64),
        ScalarType::String => quote!(String),
        ScalarType::Bytes => quote!(Vec<u8>),
    }
}

fn parse_path(path: &str) -> Result<TokenStream, GeneratorError> {
    let path: syn::Path = syn::parse_str(path)
        .map_err(|e| GeneratorError::Parameter(format!("invalid type path `{path}`: {e}")))?;
    Ok(quote!(#path))
}

/// Rust path of a message type as seen from a handler of `local_package`
pub(crate) fn message_path(
    options: &Options,
    ty: &TypeRef,
    local_package: &str,
) -> Result<TokenStream, GeneratorError> {
    if ty.full_name == ".google.protobuf.Empty" {
        return Ok(quote!(()));
    }
    if ty.package == "google.protobuf" {
        return parse_path(&format!("crud_runtime::prost_types::{}", ty.rust_path));
    }
    if ty.package == local_package {
        return parse_path(&format!("proto::{}", ty.rust_path));
    }
    let module = options.proto_module(&ty.package)?;
    let module = quote!(#module).to_string().replace(' ', "");
    parse_path(&format!("{module}::{}", ty.rust_path))
}

/// Pretty-print a generated file
///
/// Falls back to the raw token text if it does not parse as a file.
pub(crate) fn format_code(tokens: TokenStream) -> String {
    let content = tokens.to_string();
    match syn::parse_file(&content) {
        Ok(parsed) => prettyplease::unparse(&parsed),
        Err(e) => {
            tracing::warn!(error = %e, "generated code did not parse, emitting it unformatted");
            content
        }
    }
}
