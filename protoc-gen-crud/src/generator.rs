//! Code generation orchestration
//!
//! Parses the requested files into entities, classifies each entity's fields
//! and renders one handler file per entity plus one root file per package.
//! An entity that cannot be generated is reported and skipped; the rest of
//! the run continues unless `strict` is set.

use std::collections::{BTreeMap, BTreeSet};

use heck::ToSnakeCase;
use prost::Message;
use prost_types::FileDescriptorProto;
use prost_types::compiler::code_generator_response::File;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

use crate::classify::classify;
use crate::error::{GenerationFailure, GeneratorError};
use crate::model::{Entity, Service};
use crate::options::Options;
use crate::{parser, render};

/// `FEATURE_PROTO3_OPTIONAL`
const SUPPORTED_FEATURES: u64 = 1;

/// Files produced by one run, keyed by output path
#[derive(Debug, Default)]
pub struct GenerationOutput {
    /// Source per path, e.g. `user/handler/mod.rs`
    pub files: BTreeMap<String, String>,
    /// Entities that were skipped, with the reason
    pub failures: Vec<GenerationFailure>,
}

/// Output directory for a package, e.g. `acme/billing/handler/`
fn handler_dir(package: &str) -> String {
    if package.is_empty() {
        "handler/".to_string()
    } else {
        format!("{}/handler/", package.replace('.', "/"))
    }
}

fn log_completeness(entity: &Entity) {
    if entity.is_crud_complete() {
        tracing::info!(entity = %entity.name, "generating full CRUD handler");
    } else {
        let missing: Vec<&str> = entity.missing_methods().iter().map(|k| k.prefix()).collect();
        tracing::warn!(
            entity = %entity.name,
            missing = %missing.join(", "),
            "entity does not declare every CRUD method, generating the declared ones"
        );
    }
}

/// Generate handler sources for the given files
pub fn generate(
    proto_file: &[FileDescriptorProto],
    file_to_generate: &[String],
    options: &Options,
) -> Result<GenerationOutput, GeneratorError> {
    let schema = parser::parse(proto_file, file_to_generate)?;
    let mut output = GenerationOutput {
        files: BTreeMap::new(),
        failures: schema.failures,
    };

    for failure in &output.failures {
        tracing::warn!(entity = %failure.entity, reason = %failure.reason, "skipping entity");
    }
    if options.strict && !output.failures.is_empty() {
        return Err(GeneratorError::Strict(output.failures));
    }

    let packages: BTreeSet<&str> = schema
        .entities
        .iter()
        .map(|e| e.package.as_str())
        .collect();

    for package in packages {
        let entities: Vec<&Entity> = schema
            .entities
            .iter()
            .filter(|e| e.package == package)
            .collect();
        let services: Vec<&Service> = schema
            .services
            .iter()
            .filter(|s| s.package == package)
            .collect();
        let dir = handler_dir(package);

        for entity in &entities {
            log_completeness(entity);
            let classification = classify(entity);
            let code = render::entity::render(entity, &classification, options)?;
            output
                .files
                .insert(format!("{dir}{}.rs", entity.name.to_snake_case()), code);
        }

        let root = render::service::render(package, &entities, &services, options)?;
        output.files.insert(format!("{dir}mod.rs"), root);
        tracing::debug!(package, entities = entities.len(), "package rendered");
    }

    Ok(output)
}

/// Answer a plugin request; failures travel in the response's `error` field
pub fn generate_response(request: CodeGeneratorRequest) -> CodeGeneratorResponse {
    let result = Options::parse(request.parameter())
        .and_then(|options| generate(&request.proto_file, &request.file_to_generate, &options));

    match result {
        Ok(output) => CodeGeneratorResponse {
            file: output
                .files
                .into_iter()
                .map(|(name, content)| File {
                    name: Some(name),
                    content: Some(content),
                    ..Default::default()
                })
                .collect(),
            error: None,
            supported_features: Some(SUPPORTED_FEATURES),
        },
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                supported_features: Some(SUPPORTED_FEATURES),
                ..Default::default()
            }
        }
    }
}

/// Decode a serialized `CodeGeneratorRequest` and answer it
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    let request = CodeGeneratorRequest::decode(bytes)?;
    Ok(generate_response(request))
}
