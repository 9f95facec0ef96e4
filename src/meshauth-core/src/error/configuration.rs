use crate::error::structured_file::StructuredFileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("configuration passed into backend is missing")]
    MissingConfiguration(),

    #[error("policy prefix must not be empty")]
    EmptyPolicyPrefix(),

    #[error("policy prefix '{0}' must not contain '/' or whitespace")]
    InvalidPolicyPrefix(String),

    #[error("lease ttl must be greater than zero")]
    ZeroLeaseTtl(),

    #[error("local API url '{0}' must be an http or https base url")]
    UnsupportedLocalApiUrl(String),

    #[error("oracle lookup timeout must be greater than zero")]
    ZeroLookupTimeout(),

    #[error("Failed to load backend configuration")]
    LoadConfigFailed(#[source] StructuredFileError),

    #[error("Failed to build the identity oracle client")]
    BuildOracleClientFailed(#[source] crate::error::reqwest::WrappedReqwestError),
}
