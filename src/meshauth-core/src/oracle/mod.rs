//! Identity oracles answer "who is behind this address" for the mesh.
use crate::error::who_is::WhoIsError;
use crate::identity::PeerIdentity;

pub mod canned;
pub mod local_api;

pub use canned::CannedOracle;
pub use local_api::LocalApiOracle;

#[async_trait::async_trait]
pub trait IdentityOracle: Send + Sync {
    /// Looks up the verified identity of the peer at `address` (`host:port`).
    async fn who_is(&self, address: &str) -> Result<PeerIdentity, WhoIsError>;
}
