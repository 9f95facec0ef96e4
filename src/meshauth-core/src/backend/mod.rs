//! The credential backend a host mounts to let mesh peers log in.
//!
//! A login request carries no credentials, only the connection the host
//! observed. The backend resolves the peer behind that connection and answers
//! with the grant derived from its identity, or refuses outright.
use crate::config::BackendConfig;
use crate::error::configuration::ConfigurationError;
use crate::error::configuration::ConfigurationError::MissingConfiguration;
use crate::error::handle_request::HandleRequestError;
use crate::error::handle_request::HandleRequestError::{
    LoginFailed, MissingConnection, NotConfigured, UnsupportedOperation, UnsupportedPath,
};
use crate::oracle::{IdentityOracle, LocalApiOracle};
use crate::policy::PolicyDeriver;
use crate::resolver::{PeerResolver, RequestContext};
use paths::{Callback, PathOperation, PathSpec, SpecialPaths};
use regex::Regex;
use serde::{Deserialize, Serialize};
use slog::{info, o, warn, Logger};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub mod paths;
pub mod request;
pub mod response;

pub use request::{Connection, Request};
pub use response::{Auth, AuthAlias, Response};

pub const LOGIN_PATH: &str = "login";
pub const HELP: &str = "Authenticate using a Tailscale mesh";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendType {
    Credential,
}

/// What the host hands a backend at mount time.
#[derive(Clone, Debug, Default)]
pub struct SetupContext {
    pub config: Option<BackendConfig>,
}

#[async_trait::async_trait]
pub trait AuthableBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    fn help(&self) -> &str;

    fn paths(&self) -> &[PathSpec];

    fn special_paths(&self) -> &SpecialPaths;

    fn configure(&mut self, ctx: &SetupContext) -> Result<(), ConfigurationError>;

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
    ) -> Result<Response, HandleRequestError>;
}

pub struct MeshAuthBackend {
    resolver: PeerResolver,
    deriver: Option<PolicyDeriver>,
    paths: Vec<PathSpec>,
    special_paths: SpecialPaths,
    log: Logger,
}

/// Builds and configures a backend resolving peers through `oracle`.
pub fn factory(
    ctx: &SetupContext,
    oracle: Arc<dyn IdentityOracle>,
    log: &Logger,
) -> Result<MeshAuthBackend, ConfigurationError> {
    let mut backend = MeshAuthBackend::new(oracle, log);
    backend.configure(ctx)?;
    Ok(backend)
}

/// Like [`factory`], with an oracle talking to the mesh daemon described in the configuration.
pub fn local_api_factory(
    ctx: &SetupContext,
    log: &Logger,
) -> Result<MeshAuthBackend, ConfigurationError> {
    let config = ctx.config.as_ref().ok_or(MissingConfiguration())?;
    let oracle = LocalApiOracle::new(&config.oracle)?;
    factory(ctx, Arc::new(oracle), log)
}

fn login_path() -> PathSpec {
    PathSpec {
        pattern: Regex::new(&format!("^{}$", LOGIN_PATH)).unwrap(),
        operations: BTreeMap::from([(
            Operation::Update,
            PathOperation {
                callback: Callback::Login,
                summary: "Log in using tailscale",
            },
        )]),
    }
}

impl MeshAuthBackend {
    /// An unconfigured backend; it refuses every request until [`AuthableBackend::configure`] succeeds.
    pub fn new(oracle: Arc<dyn IdentityOracle>, log: &Logger) -> Self {
        let log = log.new(o!("backend" => "meshauth"));
        Self {
            resolver: PeerResolver::new(oracle, &log),
            deriver: None,
            paths: vec![login_path()],
            special_paths: SpecialPaths {
                unauthenticated: vec![LOGIN_PATH],
            },
            log,
        }
    }

    async fn handle_login(
        &self,
        ctx: &RequestContext,
        deriver: &PolicyDeriver,
        connection: Option<&Connection>,
    ) -> Result<Response, HandleRequestError> {
        let connection = connection.ok_or(MissingConnection())?;

        let identity = self
            .resolver
            .resolve_peer(ctx, &connection.remote_addr, connection.remote_port)
            .await
            .map_err(|err| {
                warn!(
                    self.log,
                    "Login rejected";
                    "remote_addr" => &connection.remote_addr,
                    "remote_port" => connection.remote_port,
                    "cause" => ErrorChain(&err).to_string()
                );
                LoginFailed(err)
            })?;

        let grant = deriver.derive_grant(&identity);
        info!(
            self.log,
            "Login granted";
            "remote_addr" => &connection.remote_addr,
            "remote_port" => connection.remote_port,
            "name" => &identity.computed_name,
            "policies" => grant.policies.join(","),
            "alias" => grant.alias.as_ref().map(|a| a.name.clone()).unwrap_or_default()
        );

        Ok(Response {
            auth: Some(grant.into_auth()),
        })
    }
}

#[async_trait::async_trait]
impl AuthableBackend for MeshAuthBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Credential
    }

    fn help(&self) -> &str {
        HELP
    }

    fn paths(&self) -> &[PathSpec] {
        &self.paths
    }

    fn special_paths(&self) -> &SpecialPaths {
        &self.special_paths
    }

    fn configure(&mut self, ctx: &SetupContext) -> Result<(), ConfigurationError> {
        self.deriver = None;
        let config = ctx.config.as_ref().ok_or(MissingConfiguration())?;
        config.validate()?;
        self.deriver = Some(PolicyDeriver::new(&config.policy_prefix, config.lease_ttl));
        Ok(())
    }

    async fn handle(
        &self,
        ctx: &RequestContext,
        request: &Request,
    ) -> Result<Response, HandleRequestError> {
        let deriver = self.deriver.as_ref().ok_or(NotConfigured())?;
        let spec = self
            .paths
            .iter()
            .find(|spec| spec.is_match(&request.path))
            .ok_or_else(|| UnsupportedPath(request.path.clone()))?;
        let operation = spec
            .operation(request.operation)
            .ok_or_else(|| UnsupportedOperation {
                path: request.path.clone(),
                operation: request.operation,
            })?;

        match operation.callback {
            Callback::Login => {
                self.handle_login(ctx, deriver, request.connection.as_ref())
                    .await
            }
        }
    }
}

/// Renders an error followed by all of its causes.
struct ErrorChain<'a>(&'a dyn std::error::Error);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {}", cause)?;
            source = cause.source();
        }
        Ok(())
    }
}
