//! Directory lookups for Dirlookup
//!
//! Resolves users and group memberships from an LDAP directory:
//! - user lookup by login name, DN or inline entry
//! - recursive group expansion with cycle protection
//! - RFC 4515 filter escaping and lenient DN parsing

mod client;
pub mod directory;
pub mod dn;
pub mod filter;
mod resolver;

#[cfg(test)]
mod testing;

pub use client::{LdapDirectory, LdapSession};
pub use directory::{Directory, DirectorySession, Scope};
pub use dn::Dn;
pub use resolver::DirectoryResolver;

use dirlookup_core::{DirectoryConfig, Result, UserRecord};
use std::collections::BTreeSet;

/// Find a user by login name on the configured LDAP server
pub async fn get_user(config: &DirectoryConfig, login: &str) -> Result<UserRecord> {
    DirectoryResolver::new(LdapDirectory::new())
        .get_user(config, login)
        .await
}

/// Find a user by login name, DN or inline entry on the configured LDAP server
pub async fn get_ldap_user(config: &DirectoryConfig, reference: &str) -> Result<UserRecord> {
    DirectoryResolver::new(LdapDirectory::new())
        .get_ldap_user(config, reference)
        .await
}

/// Login IDs of all direct and nested members of a group on the configured
/// LDAP server
pub async fn get_user_ids(config: &DirectoryConfig, group: &str) -> Result<BTreeSet<String>> {
    DirectoryResolver::new(LdapDirectory::new())
        .get_user_ids(config, group)
        .await
}
