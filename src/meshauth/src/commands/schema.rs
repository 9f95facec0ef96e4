use crate::lib::error::MeshAuthResult;
use anyhow::Context;
use clap::Parser;
use meshauth_core::config::BackendConfig;
use schemars::schema_for;
use std::path::PathBuf;

/// Prints the schema for the backend configuration file.
#[derive(Parser)]
pub struct SchemaOpts {
    /// Outputs the schema to the specified file.
    #[arg(long)]
    outfile: Option<PathBuf>,
}

pub fn exec(opts: SchemaOpts) -> MeshAuthResult {
    let schema = schema_for!(BackendConfig);
    let nice_schema =
        serde_json::to_string_pretty(&schema).context("Failed to produce pretty schema.")?;
    if let Some(outfile) = opts.outfile {
        std::fs::write(&outfile, nice_schema)
            .with_context(|| format!("Failed to write schema to {}.", outfile.to_string_lossy()))?;
    } else {
        println!("{}", nice_schema);
    }
    Ok(())
}
