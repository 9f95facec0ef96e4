use crate::error::structured_file::StructuredFileError;
use crate::error::who_is::WhoIsError;
use crate::identity::PeerIdentity;
use crate::json::load_json_file;
use crate::oracle::IdentityOracle;
use std::collections::BTreeMap;
use std::path::Path;

/// An oracle answering from a fixed table of identities, keyed by `host:port`.
///
/// Used in tests and for running the CLI without a mesh daemon.
#[derive(Clone, Debug, Default)]
pub struct CannedOracle {
    peers: BTreeMap<String, PeerIdentity>,
}

impl CannedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peer(mut self, address: &str, identity: PeerIdentity) -> Self {
        self.peers.insert(address.to_string(), identity);
        self
    }

    /// Loads a JSON object mapping addresses to identities.
    pub fn load(path: &Path) -> Result<Self, StructuredFileError> {
        let peers = load_json_file(path)?;
        Ok(Self { peers })
    }
}

#[async_trait::async_trait]
impl IdentityOracle for CannedOracle {
    async fn who_is(&self, address: &str) -> Result<PeerIdentity, WhoIsError> {
        self.peers
            .get(address)
            .cloned()
            .ok_or_else(|| WhoIsError::UnknownPeer(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn answers_known_peers_only() {
        let oracle =
            CannedOracle::new().with_peer("100.64.0.1:41641", PeerIdentity::tagged(["tag:web"], "node1"));

        let identity = oracle.who_is("100.64.0.1:41641").await.unwrap();
        assert_eq!(identity.computed_name, "node1");

        assert!(matches!(
            oracle.who_is("100.64.0.2:41641").await,
            Err(WhoIsError::UnknownPeer(address)) if address == "100.64.0.2:41641"
        ));
    }

    #[tokio::test]
    async fn loads_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"[fd7a:115c:a1e0::1]:443": {{"login_name": "alice@example.com", "display_name": "Alice", "computed_name": "alices-laptop"}}}}"#
        )
        .unwrap();

        let oracle = CannedOracle::load(file.path()).unwrap();
        let identity = oracle.who_is("[fd7a:115c:a1e0::1]:443").await.unwrap();
        assert_eq!(
            identity,
            PeerIdentity::user("alice@example.com", "Alice", "alices-laptop")
        );
    }
}
