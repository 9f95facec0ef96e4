pub mod backend;
pub mod config;
pub mod error;
pub mod fs;
pub mod grant;
pub mod identity;
pub mod json;
pub mod oracle;
pub mod policy;
pub mod resolver;
