//! Verified peer identities as reported by the mesh.
//!
//! A peer is either tagged (a non-human principal carrying one or more
//! `tag:<name>` labels) or a user (a human principal with a login name and a
//! display name). The two modes never mix: a peer with any tag is treated as
//! tagged even if the mesh also reports profile fields for it.
use serde::{Deserialize, Serialize};

/// Prefix carried by every mesh tag.
pub const TAG_PREFIX: &str = "tag:";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerIdentity {
    /// Tags of the node, each formatted `tag:<name>`. Empty for user peers.
    pub tags: Vec<String>,

    /// Stable account identifier. Only meaningful when `tags` is empty.
    pub login_name: String,

    /// Human readable label. Only meaningful when `tags` is empty.
    pub display_name: String,

    /// Canonical name of the node.
    pub computed_name: String,
}

/// Which branch of policy derivation applies to a peer.
#[derive(Debug, PartialEq, Eq)]
pub enum IdentityMode<'a> {
    Tagged(&'a [String]),
    User {
        login_name: &'a str,
        display_name: &'a str,
    },
}

impl PeerIdentity {
    pub fn tagged<T, S>(tags: T, computed_name: &str) -> Self
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            computed_name: computed_name.to_string(),
            ..Default::default()
        }
    }

    pub fn user(login_name: &str, display_name: &str, computed_name: &str) -> Self {
        Self {
            tags: vec![],
            login_name: login_name.to_string(),
            display_name: display_name.to_string(),
            computed_name: computed_name.to_string(),
        }
    }

    pub fn mode(&self) -> IdentityMode<'_> {
        if self.tags.is_empty() {
            IdentityMode::User {
                login_name: &self.login_name,
                display_name: &self.display_name,
            }
        } else {
            IdentityMode::Tagged(&self.tags)
        }
    }
}
