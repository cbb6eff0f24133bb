//! User and group resolution
//!
//! Every public operation opens one bound session, runs all of its searches
//! on it, and unbinds before returning, whether it succeeded or not.

use crate::directory::{Directory, DirectorySession, Scope};
use crate::dn::{self, Dn};
use crate::filter;
use dirlookup_core::{DirectoryConfig, DirectoryEntry, Error, Result, UserRecord};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Resolves users and group memberships against a [`Directory`]
pub struct DirectoryResolver<D> {
    directory: D,
}

impl<D: Directory> DirectoryResolver<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Find a user by login name
    pub async fn get_user(&self, config: &DirectoryConfig, login: &str) -> Result<UserRecord> {
        let mut session = self.directory.open(config).await?;
        let result = find_user(&mut session, config, login.trim()).await;
        session.unbind().await;
        result
    }

    /// Find a user by login name, DN, or inline entry.
    ///
    /// Input containing `=` is parsed as a DN and must match an entry's DN
    /// exactly; anything else is treated as a login name.
    pub async fn get_ldap_user(
        &self,
        config: &DirectoryConfig,
        reference: &str,
    ) -> Result<UserRecord> {
        let mut session = self.directory.open(config).await?;
        let result = resolve_reference(&mut session, config, reference).await;
        session.unbind().await;
        result
    }

    /// Login IDs of every direct and nested member of a group
    pub async fn get_user_ids(
        &self,
        config: &DirectoryConfig,
        group: &str,
    ) -> Result<BTreeSet<String>> {
        let mut session = self.directory.open(config).await?;
        let result = expand_group(&mut session, config, group).await;
        session.unbind().await;

        if let Ok(ids) = &result {
            info!("Group '{}' resolved to {} users", group, ids.len());
        }
        result
    }
}

async fn search_users<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    attribute: &str,
    value: &str,
) -> Result<Vec<UserRecord>> {
    if value.is_empty() {
        return Err(Error::Parse("empty user name".to_string()));
    }

    let filter =
        filter::equality_with_class(attribute, value, config.user_object_class.as_deref());
    let attributes = [
        config.user_name_attribute.as_str(),
        config.user_mail_attribute.as_str(),
    ];

    let entries = session
        .search(&config.user_search_base, Scope::Subtree, &filter, &attributes)
        .await?;

    // Entries without a login value (groups sharing the search base, say)
    // are not users.
    Ok(entries
        .iter()
        .filter_map(|entry| {
            UserRecord::from_entry(entry, &config.user_name_attribute, &config.user_mail_attribute)
        })
        .collect())
}

async fn find_user<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    login: &str,
) -> Result<UserRecord> {
    let users = search_users(session, config, &config.user_name_attribute, login).await?;

    let mut users = users.into_iter();
    let user = users.next().ok_or_else(|| Error::user_not_found(login))?;

    let extra = users.count();
    if extra > 0 {
        warn!(
            "{} users matched login {}, using the first: {}",
            extra + 1,
            login,
            user.user_dn
        );
    }

    debug!("Resolved {} to {}", login, user.user_dn);
    Ok(user)
}

/// Whether an entry DN names the same object as `dn`
fn same_dn(entry_dn: &str, dn: &Dn) -> bool {
    Dn::parse(entry_dn)
        .map(|parsed| parsed.normalized() == dn.normalized())
        .unwrap_or(false)
}

/// Find the user whose DN is exactly `dn`.
///
/// The search narrows by the leading RDN; the full DN then has to match,
/// so same-named entries in other subtrees never stand in for it.
async fn find_user_by_dn<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    dn: &Dn,
) -> Result<UserRecord> {
    let rdn = dn.leading();
    let users = search_users(session, config, rdn.attribute(), rdn.value()).await?;

    let user = users
        .into_iter()
        .find(|user| same_dn(&user.user_dn, dn))
        .ok_or_else(|| Error::user_not_found(dn.to_string()))?;

    debug!("Resolved {} to {}", dn, user.user_id);
    Ok(user)
}

async fn resolve_reference<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    reference: &str,
) -> Result<UserRecord> {
    if !dn::is_dn_like(reference) {
        return find_user(session, config, reference.trim()).await;
    }

    let dn = Dn::parse(dn::reference_dn(reference)?)?;
    find_user_by_dn(session, config, &dn).await
}

/// A group to expand: the requested name, or a nested member's DN
enum GroupRef {
    Name(String),
    Dn(Dn),
}

impl GroupRef {
    fn from_member(reference: &str) -> Result<Self> {
        if !dn::is_dn_like(reference) {
            return Ok(GroupRef::Name(reference.trim().to_string()));
        }
        Ok(GroupRef::Dn(Dn::parse(dn::reference_dn(reference)?)?))
    }
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupRef::Name(name) => f.write_str(name),
            GroupRef::Dn(dn) => write!(f, "{}", dn),
        }
    }
}

async fn find_group<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    group: &GroupRef,
) -> Result<DirectoryEntry> {
    let (attribute, value) = match group {
        GroupRef::Name(name) => (config.group_name_attribute.as_str(), name.as_str()),
        GroupRef::Dn(dn) => (dn.leading().attribute(), dn.leading().value()),
    };

    let filter =
        filter::equality_with_class(attribute, value, config.group_object_class.as_deref());
    let attributes = [
        config.group_attribute.as_str(),
        config.group_name_attribute.as_str(),
    ];

    let mut entries = session
        .search(&config.group_search_base, Scope::Subtree, &filter, &attributes)
        .await?;

    if let GroupRef::Dn(dn) = group {
        entries.retain(|entry| same_dn(&entry.dn, dn));
    }

    match entries.len() {
        0 => Err(Error::group_not_found(group.to_string())),
        1 => Ok(entries.remove(0)),
        count => Err(Error::AmbiguousGroup {
            name: group.to_string(),
            count,
        }),
    }
}

fn visited_key(dn: &str) -> String {
    Dn::parse(dn)
        .map(|dn| dn.normalized())
        .unwrap_or_else(|_| dn.to_lowercase())
}

async fn expand_group<S: DirectorySession>(
    session: &mut S,
    config: &DirectoryConfig,
    group: &str,
) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending: VecDeque<(GroupRef, bool)> = VecDeque::new();
    pending.push_back((GroupRef::Name(group.trim().to_string()), false));

    while let Some((group, nested)) = pending.pop_front() {
        let entry = match find_group(session, config, &group).await {
            Ok(entry) => entry,
            Err(e) if nested && e.is_not_found() => {
                warn!("Member reference '{}' is neither a user nor a group, skipping", group);
                continue;
            }
            Err(e) => return Err(e),
        };

        if !visited.insert(visited_key(&entry.dn)) {
            debug!("Group {} already expanded, skipping", entry.dn);
            continue;
        }

        debug!("Expanding group {}", entry.dn);

        for reference in entry.members(&config.group_attribute) {
            match resolve_reference(session, config, reference).await {
                Ok(user) => {
                    ids.insert(user.user_id);
                }
                Err(e) if e.is_not_found() => {
                    let nested_group = GroupRef::from_member(reference)?;
                    if let GroupRef::Dn(dn) = &nested_group {
                        if visited.contains(&dn.normalized()) {
                            warn!("Group {} is a member of itself through {}", dn, entry.dn);
                            continue;
                        }
                    }
                    pending.push_back((nested_group, true));
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(ids)
}
