//! Directory access traits
//!
//! The resolver only talks to these traits. [`crate::LdapDirectory`] is the
//! network implementation; tests use an in-memory one.

use async_trait::async_trait;
use dirlookup_core::{DirectoryConfig, DirectoryEntry, Result};

/// Search breadth relative to the base DN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

/// An authenticated directory session
#[async_trait]
pub trait DirectorySession: Send {
    /// Search below `base`.
    ///
    /// `filter` must already be a valid filter with untrusted values escaped.
    /// A search that matches nothing returns an empty list, never
    /// `Error::NotFound`.
    async fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>>;

    /// Release the session. Failures are logged, not returned.
    async fn unbind(&mut self);
}

/// Opens bound sessions
#[async_trait]
pub trait Directory: Send + Sync {
    type Session: DirectorySession;

    /// Connect and bind with the configured credentials.
    ///
    /// Fails with `Error::Auth` when the bind is rejected and
    /// `Error::Directory` on transport failure.
    async fn open(&self, config: &DirectoryConfig) -> Result<Self::Session>;
}

/// One-shot search: open a session, search, and unbind on every exit path
pub async fn search<D: Directory>(
    directory: &D,
    config: &DirectoryConfig,
    base: &str,
    filter: &str,
    scope: Scope,
    attributes: &[&str],
) -> Result<Vec<DirectoryEntry>> {
    let mut session = directory.open(config).await?;
    let result = session.search(base, scope, filter, attributes).await;
    session.unbind().await;
    result
}
