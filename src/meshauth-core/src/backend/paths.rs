use crate::backend::Operation;
use regex::Regex;
use std::collections::BTreeMap;

/// Handlers a path operation can be routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Callback {
    Login,
}

#[derive(Clone, Debug)]
pub struct PathOperation {
    pub callback: Callback,
    pub summary: &'static str,
}

/// One routable path of a backend and the operations it accepts.
#[derive(Clone, Debug)]
pub struct PathSpec {
    pub pattern: Regex,
    pub operations: BTreeMap<Operation, PathOperation>,
}

impl PathSpec {
    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn operation(&self, operation: Operation) -> Option<&PathOperation> {
        self.operations.get(&operation)
    }
}

/// Paths that receive special treatment from the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialPaths {
    /// Reachable without a token, since they are how a token is obtained.
    pub unauthenticated: Vec<&'static str>,
}

impl SpecialPaths {
    pub fn is_unauthenticated(&self, path: &str) -> bool {
        self.unauthenticated.iter().any(|p| *p == path)
    }
}
