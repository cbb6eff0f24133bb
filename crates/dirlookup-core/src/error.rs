//! Error types for Dirlookup

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// What kind of directory object a lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    User,
    Group,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::User => f.write_str("user"),
            LookupKind::Group => f.write_str("group"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // Session Errors
    #[error("Directory bind rejected: {0}")]
    Auth(String),

    #[error("Directory error: {0}")]
    Directory(String),

    // Lookup Errors
    #[error("No {kind} found for '{name}'")]
    NotFound { kind: LookupKind, name: String },

    #[error("Group '{name}' matched {count} entries")]
    AmbiguousGroup { name: String, count: usize },

    // Input Errors
    #[error("Malformed DN or filter input: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn user_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: LookupKind::User,
            name: name.into(),
        }
    }

    pub fn group_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: LookupKind::Group,
            name: name.into(),
        }
    }

    /// Whether the error is the expected "nothing matched" outcome rather
    /// than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Auth(_) => "AuthError",
            Error::Directory(_) => "DirectoryError",
            Error::NotFound { .. } => "NotFoundError",
            Error::AmbiguousGroup { .. } => "AmbiguousGroup",
            Error::Parse(_) => "ParseError",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::Io(_) => "InternalError",
        }
    }

    /// Process exit code used by the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } => 2,
            Error::Parse(_) | Error::InvalidConfig(_) => 3,
            Error::Auth(_) => 4,
            Error::AmbiguousGroup { .. } => 5,
            _ => 1,
        }
    }
}
