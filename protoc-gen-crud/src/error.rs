//! Error types for code generation

/// Failure of the whole run
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Failed to decode the plugin request
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A file named in `file_to_generate` has no descriptor
    #[error("file descriptor not found: {0}")]
    MissingFile(String),

    /// Invalid plugin parameter
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// Entity failures surfaced under `strict=true`
    #[error("{} entit{} failed to generate: {}", .0.len(), if .0.len() == 1 { "y" } else { "ies" }, join_failures(.0))]
    Strict(Vec<GenerationFailure>),
}

fn join_failures(failures: &[GenerationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An entity whose schema could not be resolved
///
/// Fatal to that entity's output only; the rest of the run continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity}: {reason}")]
pub struct GenerationFailure {
    /// Message name of the entity
    pub entity: String,
    /// What could not be resolved
    pub reason: String,
}

impl GenerationFailure {
    /// Failure of `entity` for `reason`
    pub fn new(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}
