use crate::error::configuration::ConfigurationError;
use crate::error::configuration::ConfigurationError::{
    EmptyPolicyPrefix, InvalidPolicyPrefix, LoadConfigFailed, UnsupportedLocalApiUrl, ZeroLeaseTtl,
    ZeroLookupTimeout,
};
use crate::json::load_json_file;
use crate::policy::{DEFAULT_LEASE_TTL, DEFAULT_POLICY_PREFIX};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOCAL_API_URL: &str = "http://127.0.0.1:41112";
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// # Backend Configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BackendConfig {
    /// # Policy Prefix
    /// Prepended to every tag name when mapping tags to policies, e.g. `tag:web` becomes `tailscale/web`.
    pub policy_prefix: String,

    /// # Lease TTL
    /// Lifetime of every grant. Used for both the ttl and the max ttl, so grants are never renewed.
    /// Valid inputs are strings parsable by humantime (e.g. "2m", "90s").
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub lease_ttl: Duration,

    /// # Identity Oracle
    pub oracle: OracleConfig,
}

/// # Identity Oracle Configuration
/// How to reach the mesh daemon's local API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OracleConfig {
    /// # Local API URL
    /// Base URL the daemon's local API is served on.
    #[schemars(with = "String")]
    pub local_api_url: Url,

    /// # Local API Password
    /// Sent as the basic-auth password when the daemon requires one.
    pub password: Option<String>,

    /// # Lookup Timeout
    /// Upper bound for a single WhoIs round trip.
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub lookup_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            policy_prefix: DEFAULT_POLICY_PREFIX.to_string(),
            lease_ttl: DEFAULT_LEASE_TTL,
            oracle: OracleConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            // The literal is a valid URL.
            local_api_url: Url::parse(DEFAULT_LOCAL_API_URL).unwrap(),
            password: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl BackendConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let config: BackendConfig = load_json_file(path).map_err(LoadConfigFailed)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.policy_prefix.is_empty() {
            return Err(EmptyPolicyPrefix());
        }
        if self
            .policy_prefix
            .chars()
            .any(|c| c == '/' || c.is_whitespace())
        {
            return Err(InvalidPolicyPrefix(self.policy_prefix.clone()));
        }
        if self.lease_ttl.is_zero() {
            return Err(ZeroLeaseTtl());
        }
        self.oracle.validate()
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let url = &self.local_api_url;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(UnsupportedLocalApiUrl(url.to_string()));
        }
        if self.lookup_timeout.is_zero() {
            return Err(ZeroLookupTimeout());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = BackendConfig::default();
        config.validate().unwrap();
        assert_eq!(config.policy_prefix, "tailscale");
        assert_eq!(config.lease_ttl, Duration::from_secs(120));
    }

    #[test]
    fn load_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"policy_prefix": "mesh", "oracle": {{"lookup_timeout": "3s"}}}}"#
        )
        .unwrap();

        let config = BackendConfig::load(file.path()).unwrap();
        assert_eq!(config.policy_prefix, "mesh");
        assert_eq!(config.lease_ttl, DEFAULT_LEASE_TTL);
        assert_eq!(config.oracle.lookup_timeout, Duration::from_secs(3));
        assert_eq!(config.oracle.local_api_url.as_str(), "http://127.0.0.1:41112/");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lease_ttl": "0s"}}"#).unwrap();

        assert!(matches!(
            BackendConfig::load(file.path()),
            Err(ConfigurationError::ZeroLeaseTtl())
        ));
    }

    #[test]
    fn load_reports_unreadable_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            BackendConfig::load(file.path()),
            Err(ConfigurationError::LoadConfigFailed(_))
        ));
    }

    #[test]
    fn prefix_must_be_a_single_segment() {
        let mut config = BackendConfig::default();
        config.policy_prefix = String::new();
        assert!(matches!(config.validate(), Err(EmptyPolicyPrefix())));

        config.policy_prefix = "a/b".to_string();
        assert!(matches!(config.validate(), Err(InvalidPolicyPrefix(_))));

        config.policy_prefix = "a b".to_string();
        assert!(matches!(config.validate(), Err(InvalidPolicyPrefix(_))));
    }

    #[test]
    fn zero_lookup_timeout_is_rejected() {
        let mut config = BackendConfig::default();
        config.oracle.lookup_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ZeroLookupTimeout())));
    }

    #[test]
    fn local_api_url_must_be_http() {
        for url in [
            "unix:/var/run/tailscale/tailscaled.sock",
            "file:///var/run/tailscale/tailscaled.sock",
            "ftp://127.0.0.1:41112",
        ] {
            let mut config = BackendConfig::default();
            config.oracle.local_api_url = Url::parse(url).unwrap();
            assert!(
                matches!(config.validate(), Err(UnsupportedLocalApiUrl(_))),
                "{url} should be rejected"
            );
        }

        let mut config = BackendConfig::default();
        config.oracle.local_api_url = Url::parse("https://localapi.example/base/").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn load_rejects_unix_socket_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"oracle": {{"local_api_url": "unix:/var/run/tailscale/tailscaled.sock"}}}}"#
        )
        .unwrap();

        assert!(matches!(
            BackendConfig::load(file.path()),
            Err(ConfigurationError::UnsupportedLocalApiUrl(_))
        ));
    }
}
