use crate::lib::environment::Environment;
use crate::lib::error::MeshAuthResult;
use anyhow::Context;
use clap::Parser;
use meshauth_core::backend::{AuthableBackend, Operation, Request, LOGIN_PATH};
use meshauth_core::resolver::RequestContext;
use slog::warn;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Performs a login as the host would for a connection from the given peer,
/// and prints the response the host would receive.
#[derive(Parser)]
pub struct LoginOpts {
    /// Remote address of the connection.
    #[arg(long)]
    remote_addr: String,

    /// Remote port of the connection.
    #[arg(long)]
    remote_port: u16,

    /// Answer lookups from a JSON file mapping `host:port` to identities instead of asking the mesh daemon.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Abandon the login after this long, e.g. "5s". Defaults to the configured lookup timeout.
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
}

pub fn exec(env: &Environment, opts: LoginOpts) -> MeshAuthResult {
    let backend = env.new_backend(opts.fixture.as_deref())?;
    let timeout = opts
        .timeout
        .unwrap_or(env.get_config().oracle.lookup_timeout);
    let request =
        Request::new(Operation::Update, LOGIN_PATH).with_connection(&opts.remote_addr, opts.remote_port);

    let runtime = Runtime::new().context("Unable to create a runtime")?;
    let response = runtime.block_on(async {
        let (ctx, cancel) = RequestContext::background().with_cancel();
        let ctx = ctx.with_timeout(timeout);

        let log = env.get_logger().clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(log, "Interrupted, cancelling login.");
                cancel.cancel();
            }
        });

        let response = backend.handle(&ctx, &request).await;
        interrupt.abort();
        response
    })?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
