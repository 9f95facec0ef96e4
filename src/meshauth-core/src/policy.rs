//! Turns a verified peer identity into an authorization grant.
//!
//! Tagged peers receive one policy per tag, `tag:<name>` becoming
//! `<prefix>/<name>`, and no alias. User peers receive no policies and an
//! alias keyed by their login name. Both carry the peer's computed name as
//! metadata and a lease whose ttl equals its max ttl, so the host has to
//! resolve the peer again instead of renewing.
use crate::grant::{
    Alias, AuthorizationGrant, LeaseOptions, ALIAS_METADATA_DISPLAY_NAME, METADATA_NAME,
};
use crate::identity::{IdentityMode, PeerIdentity, TAG_PREFIX};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_POLICY_PREFIX: &str = "tailscale";
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(2 * 60);

/// Maps a single tag onto a policy name. Tags lacking the `tag:` prefix are
/// passed through as they are.
pub fn tag_to_policy(prefix: &str, tag: &str) -> String {
    format!("{}/{}", prefix, tag.strip_prefix(TAG_PREFIX).unwrap_or(tag))
}

#[derive(Clone, Debug)]
pub struct PolicyDeriver {
    prefix: String,
    lease_ttl: Duration,
}

impl Default for PolicyDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_PREFIX, DEFAULT_LEASE_TTL)
    }
}

impl PolicyDeriver {
    pub fn new(prefix: &str, lease_ttl: Duration) -> Self {
        Self {
            prefix: prefix.to_string(),
            lease_ttl,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lease_ttl(&self) -> Duration {
        self.lease_ttl
    }

    pub fn derive_grant(&self, identity: &PeerIdentity) -> AuthorizationGrant {
        let (policies, alias): (Vec<String>, Option<Alias>) = match identity.mode() {
            IdentityMode::Tagged(tags) => (
                tags.iter()
                    .map(|tag| tag_to_policy(&self.prefix, tag))
                    .collect(),
                None,
            ),
            IdentityMode::User {
                login_name,
                display_name,
            } => (
                vec![],
                Some(Alias {
                    name: login_name.to_string(),
                    metadata: BTreeMap::from([(
                        ALIAS_METADATA_DISPLAY_NAME.to_string(),
                        display_name.to_string(),
                    )]),
                }),
            ),
        };

        AuthorizationGrant {
            policies,
            alias,
            metadata: BTreeMap::from([(
                METADATA_NAME.to_string(),
                identity.computed_name.clone(),
            )]),
            lease: LeaseOptions::non_renewable(self.lease_ttl),
        }
    }
}
