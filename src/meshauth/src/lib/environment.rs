use crate::lib::error::MeshAuthResult;
use anyhow::Context;
use meshauth_core::backend::{factory, MeshAuthBackend, SetupContext};
use meshauth_core::config::BackendConfig;
use meshauth_core::oracle::{CannedOracle, IdentityOracle, LocalApiOracle};
use slog::{debug, Logger};
use std::path::Path;
use std::sync::Arc;

pub struct Environment {
    config: BackendConfig,
    logger: Logger,
}

impl Environment {
    /// Loads the configuration file if one is given, otherwise uses the defaults.
    pub fn new(config_path: Option<&Path>, logger: Logger) -> MeshAuthResult<Self> {
        let config = match config_path {
            Some(path) => {
                debug!(logger, "Loading configuration"; "path" => %path.display());
                BackendConfig::load(path).with_context(|| {
                    format!("Failed to load configuration from {}.", path.display())
                })?
            }
            None => BackendConfig::default(),
        };
        Ok(Self { config, logger })
    }

    pub fn get_logger(&self) -> &Logger {
        &self.logger
    }

    pub fn get_config(&self) -> &BackendConfig {
        &self.config
    }

    /// The oracle answering lookups: a fixture file when given, the mesh daemon otherwise.
    pub fn new_oracle(&self, fixture: Option<&Path>) -> MeshAuthResult<Arc<dyn IdentityOracle>> {
        let oracle: Arc<dyn IdentityOracle> = match fixture {
            Some(path) => {
                debug!(self.logger, "Answering lookups from fixture"; "path" => %path.display());
                Arc::new(CannedOracle::load(path).with_context(|| {
                    format!("Failed to load identity fixture {}.", path.display())
                })?)
            }
            None => Arc::new(LocalApiOracle::new(&self.config.oracle)?),
        };
        Ok(oracle)
    }

    pub fn new_backend(&self, fixture: Option<&Path>) -> MeshAuthResult<MeshAuthBackend> {
        let ctx = SetupContext {
            config: Some(self.config.clone()),
        };
        Ok(factory(&ctx, self.new_oracle(fixture)?, &self.logger)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshauth_core::backend::{AuthableBackend, Operation, Request, LOGIN_PATH};
    use meshauth_core::resolver::RequestContext;
    use std::io::Write;
    use std::time::Duration;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn defaults_without_config_file() {
        let env = Environment::new(None, logger()).unwrap();
        assert_eq!(env.get_config(), &BackendConfig::default());
    }

    #[test]
    fn reports_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"policy_prefix": ""}}"#).unwrap();

        let err = Environment::new(Some(file.path()), logger())
            .err()
            .expect("empty prefix must be rejected");
        assert!(err.to_string().starts_with("Failed to load configuration from"));
    }

    #[tokio::test]
    async fn fixture_backed_login() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"policy_prefix": "mesh", "lease_ttl": "90s"}}"#).unwrap();
        let mut fixture = tempfile::NamedTempFile::new().unwrap();
        write!(
            fixture,
            r#"{{"100.64.0.1:41641": {{"tags": ["tag:web"], "computed_name": "node1"}}}}"#
        )
        .unwrap();

        let env = Environment::new(Some(config.path()), logger()).unwrap();
        let backend = env.new_backend(Some(fixture.path())).unwrap();
        let request =
            Request::new(Operation::Update, LOGIN_PATH).with_connection("100.64.0.1", 41641);

        let auth = backend
            .handle(&RequestContext::background(), &request)
            .await
            .unwrap()
            .auth
            .unwrap();
        assert_eq!(auth.policies, vec!["mesh/web"]);
        assert_eq!(auth.lease_options.max_ttl, Duration::from_secs(90));
    }
}
