//! LDAP client implementation
//!
//! Handles connection setup, the service-account bind and searches against a
//! real directory server. Supports LDAP, LDAPS and STARTTLS connections.

use crate::directory::{Directory, DirectorySession, Scope};
use async_trait::async_trait;
use dirlookup_core::{DirectoryConfig, DirectoryEntry, Error, Result};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, SearchEntry, SearchResult};
use std::time::Duration;
use tracing::{debug, warn};

/// LDAP result code for a search base that does not exist
const RC_NO_SUCH_OBJECT: u32 = 32;

/// Directory backed by an LDAP server
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapDirectory;

impl LdapDirectory {
    pub fn new() -> Self {
        Self
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self, config: &DirectoryConfig) -> Result<(LdapConnAsync, Ldap)> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(config.timeout_seconds))
            .set_starttls(config.start_tls)
            .set_no_tls_verify(config.insecure_skip_verify);

        let url = config.url();
        debug!("Connecting to LDAP server: {}", url);

        LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| Error::Directory(format!("Failed to connect to LDAP server: {}", e)))
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    type Session = LdapSession;

    async fn open(&self, config: &DirectoryConfig) -> Result<LdapSession> {
        let (conn, mut ldap) = self.create_connection(config).await?;

        ldap3::drive!(conn);

        let result = ldap
            .simple_bind(&config.bind_dn, &config.bind_password)
            .await
            .map_err(|e| Error::Directory(format!("Bind failed: {}", e)))?;

        if result.rc != 0 {
            let _ = ldap.unbind().await;
            return Err(Error::Auth(format!(
                "bind as '{}' failed with code {}: {}",
                config.bind_dn, result.rc, result.text
            )));
        }

        debug!("Bound as {}", config.bind_dn);
        Ok(LdapSession { ldap })
    }
}

/// A bound LDAP connection
pub struct LdapSession {
    ldap: Ldap,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        debug!("Searching {} with filter: {}", base, filter);

        let SearchResult(rs, res) = self
            .ldap
            .search(base, scope.into(), filter, attributes.to_vec())
            .await
            .map_err(|e| Error::Directory(format!("Search failed: {}", e)))?;

        match res.rc {
            0 => {}
            RC_NO_SUCH_OBJECT => {
                debug!("Search base {} does not exist", base);
                return Ok(Vec::new());
            }
            rc => {
                return Err(Error::Directory(format!(
                    "Search under '{}' failed with code {}: {}",
                    base, rc, res.text
                )))
            }
        }

        let entries: Vec<DirectoryEntry> = rs
            .into_iter()
            .map(|result| {
                let entry = SearchEntry::construct(result);
                DirectoryEntry {
                    dn: entry.dn,
                    attrs: entry.attrs.into_iter().collect(),
                }
            })
            .collect();

        debug!("Search returned {} entries", entries.len());
        Ok(entries)
    }

    async fn unbind(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            warn!("LDAP unbind failed: {}", e);
        }
    }
}

impl From<Scope> for ldap3::Scope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Base => ldap3::Scope::Base,
            Scope::OneLevel => ldap3::Scope::OneLevel,
            Scope::Subtree => ldap3::Scope::Subtree,
        }
    }
}
