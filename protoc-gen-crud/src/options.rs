//! Plugin parameters
//!
//! protoc passes everything after `--crud_out=` and before the `:` as one
//! comma-separated string, e.g. `proto_path=crate::pb::{package},strict=true`.

use crate::error::GeneratorError;

/// Module path of the prost types when no `proto_path` is given
pub const DEFAULT_PROTO_PATH: &str = "crate::proto::{package}";

/// Proto package shipped with `crud-runtime`, mapped with `extern_path`
pub const RUNTIME_PACKAGE: &str = "common";

/// Parsed plugin parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Rust module path of the prost types; `{package}` expands to the proto
    /// package with `.` replaced by `::`
    pub proto_path: String,
    /// Fail the whole run when any entity fails
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            proto_path: DEFAULT_PROTO_PATH.to_string(),
            strict: false,
        }
    }
}

impl Options {
    /// Parse the protoc parameter string
    pub fn parse(param: &str) -> Result<Self, GeneratorError> {
        let mut options = Self::default();

        for part in param.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, "true"));
            match key {
                "proto_path" => options.proto_path = value.to_string(),
                "strict" => {
                    options.strict = value.parse().map_err(|_| {
                        GeneratorError::Parameter(format!("strict expects true or false, got `{value}`"))
                    })?;
                }
                other => {
                    return Err(GeneratorError::Parameter(format!("unknown parameter `{other}`")));
                }
            }
        }

        options.proto_module("example")?;
        Ok(options)
    }

    /// Rust path of the module holding the prost types of `package`
    pub fn proto_module(&self, package: &str) -> Result<syn::Path, GeneratorError> {
        if package == RUNTIME_PACKAGE {
            return Ok(syn::parse_quote!(::crud_runtime::proto));
        }
        let path = self
            .proto_path
            .replace("{package}", &package.replace('.', "::"));
        let path = path.trim_end_matches("::");
        syn::parse_str(path)
            .map_err(|e| GeneratorError::Parameter(format!("invalid proto_path `{path}`: {e}")))
    }
}
