//! Dirlookup Core Library
//!
//! Configuration, error taxonomy and data model shared by the directory
//! resolver and its command-line front end.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DirectoryConfig, DirlookupConfig, LoggingConfig};
pub use error::{Error, Result};
pub use types::{DirectoryEntry, UserRecord};

/// Dirlookup version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default plain LDAP port
pub const DEFAULT_LDAP_PORT: u16 = 389;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "DIRLOOKUP_";
