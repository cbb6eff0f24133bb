//! User types

use super::DirectoryEntry;
use serde::{Deserialize, Serialize};

/// A user resolved from the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub user_dn: String,
    /// Empty when the entry has no mail attribute
    pub email: String,
}

impl UserRecord {
    /// Build a record from a search entry.
    ///
    /// Returns `None` when the entry has no DN or no login value, since a
    /// record never carries an empty ID or DN.
    pub fn from_entry(
        entry: &DirectoryEntry,
        login_attribute: &str,
        mail_attribute: &str,
    ) -> Option<Self> {
        if entry.dn.trim().is_empty() {
            return None;
        }

        let user_id = entry.login(login_attribute)?;

        Some(Self {
            user_id: user_id.to_string(),
            user_dn: entry.dn.clone(),
            email: entry.mail(mail_attribute).unwrap_or_default().to_string(),
        })
    }
}
