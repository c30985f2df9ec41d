//! Descriptor loading
//!
//! Runs `protoc --include_imports --descriptor_set_out` over the inputs, or
//! reads a descriptor set produced elsewhere, and works out which files in
//! the set were asked for.

use std::path::{Component, Path, PathBuf};
use std::process::Command;

use prost::Message;
use prost_types::FileDescriptorSet;

use crate::error::CliError;

/// Compile `inputs` with protoc and return the resulting descriptor set
pub fn run_protoc(inputs: &[PathBuf], includes: &[PathBuf]) -> Result<FileDescriptorSet, CliError> {
    // Removed with the directory when it goes out of scope
    let scratch = tempfile::Builder::new()
        .prefix("crud-gen-")
        .tempdir()
        .map_err(CliError::TempDir)?;
    let out = scratch.path().join("descriptor_set.desc");
    let protoc = std::env::var_os("PROTOC").unwrap_or_else(|| "protoc".into());

    let mut command = Command::new(&protoc);
    command.arg("--include_imports").arg("--descriptor_set_out").arg(&out);
    if includes.is_empty() {
        command.arg("-I.");
    }
    for include in includes {
        command.arg(format!("-I{}", include.display()));
    }
    command.args(inputs);

    tracing::debug!(?command, "running protoc");
    let output = command.output().map_err(CliError::ProtocSpawn)?;
    if !output.status.success() {
        return Err(CliError::Protoc {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    read_descriptor_set(&out)
}

/// Read a serialized `FileDescriptorSet`
pub fn read_descriptor_set(path: &Path) -> Result<FileDescriptorSet, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadDescriptorSet {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FileDescriptorSet::decode(bytes.as_slice())?)
}

/// Forward-slash path without `.` components, the way protoc names files
fn proto_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Names of the files to generate
///
/// Inputs are made relative to the first include path that contains them.
/// Without inputs every file in the set is generated except the well-known
/// `google/protobuf` types.
pub fn files_to_generate(
    set: &FileDescriptorSet,
    inputs: &[PathBuf],
    includes: &[PathBuf],
) -> Vec<String> {
    if inputs.is_empty() {
        return set
            .file
            .iter()
            .map(|f| f.name().to_string())
            .filter(|name| !name.starts_with("google/protobuf/"))
            .collect();
    }

    inputs
        .iter()
        .map(|input| {
            let relative = includes
                .iter()
                .find_map(|include| input.strip_prefix(include).ok())
                .unwrap_or(input);
            proto_name(relative)
        })
        .collect()
}
