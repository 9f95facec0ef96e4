use crate::error::reqwest::WrappedReqwestError;
use thiserror::Error;

/// Failure reported by an identity oracle for a single lookup.
#[derive(Error, Debug)]
pub enum WhoIsError {
    #[error("no peer is known at {0}")]
    UnknownPeer(String),

    #[error("peer at {0} is not authenticated")]
    Unauthenticated(String),

    #[error("identity oracle returned status {status} for {address}: {body}")]
    UnexpectedStatus {
        address: String,
        status: u16,
        body: String,
    },

    #[error("failed to reach the identity oracle")]
    Transport(#[source] WrappedReqwestError),

    #[error("identity oracle returned an unreadable response")]
    InvalidResponse(#[source] WrappedReqwestError),

    #[error("identity oracle response for {0} has no node")]
    MissingNode(String),

    #[error("identity oracle response for {0} has no computed name")]
    MissingComputedName(String),
}
