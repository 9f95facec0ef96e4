use crate::lib::environment::Environment;
use crate::lib::error::MeshAuthResult;
use anyhow::Context;
use clap::Parser;
use meshauth_core::resolver::{PeerResolver, RequestContext};
use std::path::PathBuf;
use tokio::runtime::Runtime;

/// Shows the identity the mesh reports for a peer.
#[derive(Parser)]
pub struct WhoIsOpts {
    /// IP address or hostname of the peer.
    host: String,

    /// Port of the peer's connection.
    port: u16,

    /// Answer from a JSON file mapping `host:port` to identities instead of asking the mesh daemon.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

pub fn exec(env: &Environment, opts: WhoIsOpts) -> MeshAuthResult {
    let resolver = PeerResolver::new(env.new_oracle(opts.fixture.as_deref())?, env.get_logger());
    let ctx = RequestContext::background().with_timeout(env.get_config().oracle.lookup_timeout);

    let runtime = Runtime::new().context("Unable to create a runtime")?;
    let identity = runtime.block_on(resolver.resolve_peer(&ctx, &opts.host, opts.port))?;

    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}
