use crate::lib::environment::Environment;
use crate::lib::error::MeshAuthResult;
use clap::Parser;
use meshauth_core::backend::AuthableBackend;
use meshauth_core::oracle::CannedOracle;
use std::sync::Arc;

/// Lists the paths the backend serves and which of them need no token.
#[derive(Parser)]
pub struct PathsOpts {}

pub fn exec(env: &Environment, _opts: PathsOpts) -> MeshAuthResult {
    // Listing paths never performs a lookup.
    let backend = meshauth_core::backend::MeshAuthBackend::new(
        Arc::new(CannedOracle::new()),
        env.get_logger(),
    );

    println!("{} ({:?} backend)", backend.help(), backend.backend_type());
    for spec in backend.paths() {
        println!("{}", spec.pattern.as_str());
        for (operation, op) in &spec.operations {
            println!("    {:<8}{}", operation.to_string(), op.summary);
        }
    }
    println!("unauthenticated: {}", backend.special_paths().unauthenticated.join(", "));
    Ok(())
}
