use crate::grant::LeaseOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alias in the shape the host links identities with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAlias {
    pub name: String,
    pub custom_metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub internal_data: BTreeMap<String, serde_json::Value>,
    pub policies: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub lease_options: LeaseOptions,
    pub alias: Option<AuthAlias>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub auth: Option<Auth>,
}
