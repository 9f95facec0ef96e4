use crate::backend::Operation;
use serde::{Deserialize, Serialize};

/// Connection metadata the host observed for a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub remote_addr: String,
    pub remote_port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub operation: Operation,
    pub path: String,
    pub connection: Option<Connection>,
}

impl Request {
    pub fn new(operation: Operation, path: &str) -> Self {
        Self {
            operation,
            path: path.to_string(),
            connection: None,
        }
    }

    pub fn with_connection(mut self, remote_addr: &str, remote_port: u16) -> Self {
        self.connection = Some(Connection {
            remote_addr: remote_addr.to_string(),
            remote_port,
        });
        self
    }
}
