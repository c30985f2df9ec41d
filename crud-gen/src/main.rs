//! crud-gen: generate CRUD handler sources from proto files
//!
//! Runs the same generator as the protoc plugin, without going through
//! protoc's plugin protocol, and writes the handler tree to a directory:
//!
//!   crud-gen -I proto -o src/gen proto/user/user.proto

use std::path::PathBuf;

use clap::Parser;
use protoc_gen_crud::Options;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod compile;
mod error;

use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "crud-gen")]
#[command(about = "Generate CRUD gRPC handlers from proto service definitions")]
struct Args {
    /// Proto files to generate handlers for
    input: Vec<PathBuf>,

    /// Proto include paths for imports
    #[arg(short = 'I', long = "proto-path")]
    proto_paths: Vec<PathBuf>,

    /// Read a FileDescriptorSet (built with --include_imports) instead of running protoc
    #[arg(long)]
    descriptor_set: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "gen")]
    out: PathBuf,

    /// Rust module path of the prost types; `{package}` expands to the proto package
    #[arg(long, default_value = protoc_gen_crud::options::DEFAULT_PROTO_PATH)]
    proto_path_template: String,

    /// Fail when any entity cannot be generated
    #[arg(long)]
    strict: bool,

    /// List the files that would be written without writing them
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let set = match (&args.descriptor_set, args.input.is_empty()) {
        (Some(path), _) => compile::read_descriptor_set(path)?,
        (None, false) => compile::run_protoc(&args.input, &args.proto_paths)?,
        (None, true) => return Err(CliError::NoInput),
    };
    let files = compile::files_to_generate(&set, &args.input, &args.proto_paths);

    let options = Options {
        proto_path: args.proto_path_template,
        strict: args.strict,
    };
    let output = protoc_gen_crud::generate(&set.file, &files, &options)?;

    for (name, content) in &output.files {
        let path = args.out.join(name);
        if args.dry_run {
            println!("{}", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CliError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, content).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "wrote");
    }

    tracing::info!(
        files = output.files.len(),
        skipped = output.failures.len(),
        out = %args.out.display(),
        "generation finished"
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    run(Args::parse())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "crud-gen",
            "-I",
            "proto",
            "--out",
            "src/gen",
            "--strict",
            "proto/user.proto",
        ])
        .unwrap();
        assert_eq!(args.input, vec![PathBuf::from("proto/user.proto")]);
        assert_eq!(args.proto_paths, vec![PathBuf::from("proto")]);
        assert_eq!(args.out, PathBuf::from("src/gen"));
        assert_eq!(args.proto_path_template, "crate::proto::{package}");
        assert!(args.strict);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_requires_some_input() {
        let args = Args::try_parse_from(["crud-gen"]).unwrap();
        assert!(matches!(run(args), Err(CliError::NoInput)));
    }
}
