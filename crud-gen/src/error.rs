//! Error types for crud-gen

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to create a scratch directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to run protoc: {0}")]
    ProtocSpawn(#[source] std::io::Error),

    #[error("protoc exited with {status}: {stderr}")]
    Protoc { status: String, stderr: String },

    #[error("failed to read descriptor set {path}: {source}")]
    ReadDescriptorSet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid descriptor set: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("no input files and no descriptor set given")]
    NoInput,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Generate(#[from] protoc_gen_crud::GeneratorError),
}
