use crate::error::who_is::WhoIsError;
use thiserror::Error;

/// The peer behind a connection could not be resolved or authenticated.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("'{0}' is not a valid IP address or hostname")]
    InvalidHost(String),

    #[error("failed WhoIs lookup for {address}")]
    WhoIsFailed {
        address: String,
        source: WhoIsError,
    },

    #[error("WhoIs lookup for {address} was cancelled")]
    Cancelled { address: String },

    #[error("WhoIs lookup for {address} exceeded its deadline")]
    DeadlineExceeded { address: String },
}

impl LookupError {
    /// Whether the lookup stopped because the caller gave up, as opposed to
    /// the oracle refusing or failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            LookupError::Cancelled { .. } | LookupError::DeadlineExceeded { .. }
        )
    }
}
