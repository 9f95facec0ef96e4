use crate::backend::Operation;
use crate::error::lookup::LookupError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandleRequestError {
    #[error("backend has not been configured")]
    NotConfigured(),

    #[error("unsupported path '{0}'")]
    UnsupportedPath(String),

    #[error("unsupported operation {operation} on path '{path}'")]
    UnsupportedOperation { path: String, operation: Operation },

    #[error("request carries no connection metadata")]
    MissingConnection(),

    // The lookup cause stays attached for audit logging but is kept out of
    // the message, so callers cannot tell an unknown peer from a failed lookup.
    #[error("permission denied")]
    LoginFailed(#[source] LookupError),
}
