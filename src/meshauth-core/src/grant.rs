use crate::backend::response::{Auth, AuthAlias};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metadata key carrying the peer's canonical name on every grant.
pub const METADATA_NAME: &str = "name";

/// Alias metadata key carrying a user's display name.
pub const ALIAS_METADATA_DISPLAY_NAME: &str = "display_name";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseOptions {
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
}

impl LeaseOptions {
    /// A lease that cannot be renewed past its initial lifetime.
    pub fn non_renewable(ttl: Duration) -> Self {
        Self { ttl, max_ttl: ttl }
    }
}

/// Stable identity linkage for a human principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub metadata: BTreeMap<String, String>,
}

/// The authorization decision for one login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub policies: Vec<String>,
    pub alias: Option<Alias>,
    pub metadata: BTreeMap<String, String>,
    pub lease: LeaseOptions,
}

impl AuthorizationGrant {
    /// Shapes the grant into the host's auth record.
    pub fn into_auth(self) -> Auth {
        Auth {
            internal_data: BTreeMap::new(),
            policies: self.policies,
            metadata: self.metadata,
            lease_options: self.lease,
            alias: self.alias.map(|alias| AuthAlias {
                name: alias.name,
                custom_metadata: alias.metadata,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_auth_keeps_every_field() {
        let grant = AuthorizationGrant {
            policies: vec![],
            alias: Some(Alias {
                name: "alice@example.com".to_string(),
                metadata: BTreeMap::from([(
                    ALIAS_METADATA_DISPLAY_NAME.to_string(),
                    "Alice".to_string(),
                )]),
            }),
            metadata: BTreeMap::from([(METADATA_NAME.to_string(), "alices-laptop".to_string())]),
            lease: LeaseOptions::non_renewable(Duration::from_secs(120)),
        };

        let auth = grant.into_auth();
        assert!(auth.internal_data.is_empty());
        assert!(auth.policies.is_empty());
        assert_eq!(auth.metadata[METADATA_NAME], "alices-laptop");
        assert_eq!(auth.lease_options.ttl, Duration::from_secs(120));
        assert_eq!(auth.lease_options.max_ttl, Duration::from_secs(120));
        let alias = auth.alias.unwrap();
        assert_eq!(alias.name, "alice@example.com");
        assert_eq!(alias.custom_metadata[ALIAS_METADATA_DISPLAY_NAME], "Alice");
    }

    #[test]
    fn lease_serializes_as_human_durations() {
        let lease = LeaseOptions::non_renewable(Duration::from_secs(120));
        assert_eq!(
            serde_json::to_value(&lease).unwrap(),
            serde_json::json!({"ttl": "2m", "max_ttl": "2m"})
        );
    }
}
