//! protoc-gen-crud plugin entry point
//!
//! Reads a `CodeGeneratorRequest` from stdin and writes the response to
//! stdout. Logs go to stderr; set `RUST_LOG` to change the level.

#![deny(missing_docs)]

use std::io::{self, Read, Write};

use prost::Message;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;

    let response = protoc_gen_crud::generate_from_bytes(&input)?;

    let mut output = Vec::new();
    response.encode(&mut output)?;
    io::stdout().write_all(&output)?;

    Ok(())
}
