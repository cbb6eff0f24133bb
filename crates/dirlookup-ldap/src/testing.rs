//! In-memory directory used by the unit tests
//!
//! Understands the filters this crate builds: equality terms and `(&...)`
//! conjunctions, with RFC 4515 hex escapes in values.

use crate::directory::{Directory, DirectorySession, Scope};
use crate::dn::Dn;
use async_trait::async_trait;
use dirlookup_core::{DirectoryConfig, DirectoryEntry, Error, Result};
use std::sync::{Arc, Mutex};

pub const BIND_DN: &str = "cn=admin,dc=pivotal,dc=org";
pub const BIND_PASSWORD: &str = "password";

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub opened: usize,
    pub unbound: usize,
    pub filters: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MemoryDirectory {
    entries: Arc<Vec<DirectoryEntry>>,
    fail_on: Option<String>,
    stats: Arc<Mutex<Stats>>,
}

impl MemoryDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
            ..Default::default()
        }
    }

    /// Fail any search whose filter contains `needle` with a directory error
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn stats(&self) -> Stats {
        self.stats.lock().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<String> {
        self.stats().filters
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    type Session = MemorySession;

    async fn open(&self, config: &DirectoryConfig) -> Result<MemorySession> {
        if config.bind_dn != BIND_DN || config.bind_password != BIND_PASSWORD {
            return Err(Error::Auth(format!("bind as '{}' failed with code 49", config.bind_dn)));
        }

        self.stats.lock().unwrap().opened += 1;
        Ok(MemorySession {
            directory: self.clone(),
            open: true,
        })
    }
}

pub struct MemorySession {
    directory: MemoryDirectory,
    open: bool,
}

#[async_trait]
impl DirectorySession for MemorySession {
    async fn search(
        &mut self,
        base: &str,
        scope: Scope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryEntry>> {
        assert!(self.open, "search on an unbound session");
        self.directory
            .stats
            .lock()
            .unwrap()
            .filters
            .push(filter.to_string());

        if let Some(needle) = &self.directory.fail_on {
            if filter.contains(needle.as_str()) {
                return Err(Error::Directory("connection reset by peer".to_string()));
            }
        }

        let parsed = parse_filter(filter)
            .and_then(|(f, rest)| rest.is_empty().then_some(f))
            .ok_or_else(|| Error::Directory(format!("invalid filter: {}", filter)))?;

        Ok(self
            .directory
            .entries
            .iter()
            .filter(|entry| in_scope(&entry.dn, base, scope))
            .filter(|entry| parsed.matches(entry))
            .map(|entry| project(entry, attributes))
            .collect())
    }

    async fn unbind(&mut self) {
        if self.open {
            self.open = false;
            self.directory.stats.lock().unwrap().unbound += 1;
        }
    }
}

enum Filter {
    And(Vec<Filter>),
    Equal(String, String),
}

impl Filter {
    fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Filter::And(terms) => terms.iter().all(|t| t.matches(entry)),
            Filter::Equal(attr, value) => entry
                .values(attr)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
        }
    }
}

fn parse_filter(input: &str) -> Option<(Filter, &str)> {
    let body = input.strip_prefix('(')?;

    if let Some(mut rest) = body.strip_prefix('&') {
        let mut terms = Vec::new();
        while rest.starts_with('(') {
            let (term, after) = parse_filter(rest)?;
            terms.push(term);
            rest = after;
        }
        return Some((Filter::And(terms), rest.strip_prefix(')')?));
    }

    let close = body.find(')')?;
    let (attr, value) = body[..close].split_once('=')?;
    Some((
        Filter::Equal(attr.to_string(), unescape(value)?),
        &body[close + 1..],
    ))
}

fn unescape(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = value.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            // Unescaped specials mean the caller forgot to escape
            if matches!(bytes[i], b'(' | b')' | b'*') {
                return None;
            }
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn in_scope(dn: &str, base: &str, scope: Scope) -> bool {
    let (Ok(dn), Ok(base)) = (Dn::parse(dn), Dn::parse(base)) else {
        return false;
    };
    let dn_key = dn.normalized();
    let base_key = base.normalized();
    let below = dn_key.ends_with(&format!(",{}", base_key));

    match scope {
        Scope::Base => dn_key == base_key,
        Scope::OneLevel => below && dn.rdns().len() == base.rdns().len() + 1,
        Scope::Subtree => below || dn_key == base_key,
    }
}

fn project(entry: &DirectoryEntry, attributes: &[&str]) -> DirectoryEntry {
    let mut projected = DirectoryEntry::new(entry.dn.clone());
    for attr in attributes {
        let values = entry.values(attr);
        if !values.is_empty() {
            projected = projected.with_attr(*attr, values.iter().cloned());
        }
    }
    projected
}

pub fn fixture_config() -> DirectoryConfig {
    DirectoryConfig {
        bind_dn: BIND_DN.to_string(),
        bind_password: BIND_PASSWORD.to_string(),
        user_search_base: "dc=pivotal,dc=org".to_string(),
        user_name_attribute: "uid".to_string(),
        user_mail_attribute: "mail".to_string(),
        group_search_base: "ou=groups,dc=pivotal,dc=org".to_string(),
        group_attribute: "member".to_string(),
        ..Default::default()
    }
}

fn user(dn: &str, cn: &str, uid: &str, mail: &str) -> DirectoryEntry {
    DirectoryEntry::new(dn)
        .with_attr("objectClass", ["top", "inetOrgPerson"])
        .with_attr("cn", [cn])
        .with_attr("uid", [uid])
        .with_attr("mail", [mail])
}

fn group(cn: &str, dn: &str, members: &[&str]) -> DirectoryEntry {
    DirectoryEntry::new(dn)
        .with_attr("objectClass", ["top", "groupOfNames"])
        .with_attr("cn", [cn])
        .with_attr("member", members.iter().copied())
}

const CWASHBURN: &str = "cn=cwashburn,ou=users,dc=pivotal,dc=org";
const CWASHBURN1: &str = "cn=Washburn\\, Caleb,ou=users,dc=pivotal,dc=org";
const CWASHBURN2: &str = "cn=Caleb A. Washburn,ou=users,dc=pivotal,dc=org";
const CWASHBURN3: &str = "cn=cwashburn3,ou=users,dc=pivotal,dc=org";
const CWASHBURN4: &str = "cn=cwashburn4,ou=users,dc=pivotal,dc=org";
const CWASHBURN5: &str = "cn=cwashburn5,ou=users,dc=pivotal,dc=org";

/// Users and groups modelled on a small OpenLDAP test tree
pub fn fixture_directory() -> MemoryDirectory {
    MemoryDirectory::new(vec![
        user(CWASHBURN, "cwashburn", "cwashburn", "cwashburn+cfmt@testdomain.com"),
        user(CWASHBURN1, "Washburn, Caleb", "cwashburn1", "cwashburn+cfmt1@testdomain.com"),
        user(CWASHBURN2, "Caleb A. Washburn", "cwashburn2", "cwashburn+cfmt2@testdomain.com"),
        user(CWASHBURN3, "cwashburn3", "cwashburn3", "cwashburn+cfmt3@testdomain.com"),
        user(CWASHBURN4, "cwashburn4", "cwashburn4", "cwashburn+cfmt4@testdomain.com"),
        user(CWASHBURN5, "cwashburn5", "cwashburn5", ""),
        user("cn=dupe one,ou=users,dc=pivotal,dc=org", "dupe one", "dupe", "dupe1@testdomain.com"),
        user("cn=dupe two,ou=users,dc=pivotal,dc=org", "dupe two", "dupe", "dupe2@testdomain.com"),
        user("cn=jsmith,ou=users,dc=pivotal,dc=org", "jsmith", "jsmith", "jsmith@testdomain.com"),
        user(
            "cn=jsmith,ou=contractors,dc=pivotal,dc=org",
            "jsmith",
            "jsmith-c",
            "jsmith@contractor.example.com",
        ),
        user("cn=alice,ou=users,dc=pivotal,dc=org", "alice", "alice", "alice@testdomain.com"),
        user("cn=ops,ou=users,dc=pivotal,dc=org", "ops", "ops-bot", "ops@testdomain.com"),
        DirectoryEntry::new("cn=svc-account,ou=services,dc=pivotal,dc=org")
            .with_attr("objectClass", ["top", "account"])
            .with_attr("cn", ["svc-account"])
            .with_attr("uid", ["svc-account"]),
        group(
            "space_developers",
            "cn=space_developers,ou=groups,dc=pivotal,dc=org",
            &[
                CWASHBURN,
                CWASHBURN1,
                CWASHBURN2,
                CWASHBURN3,
                CWASHBURN4,
                "CN=cwashburn,OU=users,DC=pivotal,DC=org",
            ],
        ),
        group(
            "special (char) group,name",
            "cn=special (char) group\\,name,ou=groups,dc=pivotal,dc=org",
            &[
                CWASHBURN,
                "cn=Washburn, Caleb,ou=users,dc=pivotal,dc=org",
                CWASHBURN2,
                CWASHBURN5,
            ],
        ),
        group(
            "platform",
            "cn=platform,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN, "cn=sre,ou=groups,dc=pivotal,dc=org"],
        ),
        group(
            "sre",
            "cn=sre,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN3, CWASHBURN4, "cn=oncall,ou=groups,dc=pivotal,dc=org"],
        ),
        group(
            "oncall",
            "cn=oncall,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN5, CWASHBURN],
        ),
        group(
            "cycle-a",
            "cn=cycle-a,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN, "cn=cycle-b,ou=groups,dc=pivotal,dc=org"],
        ),
        group(
            "cycle-b",
            "cn=cycle-b,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN1, "cn=cycle-a,ou=groups,dc=pivotal,dc=org"],
        ),
        group(
            "self-loop",
            "cn=self-loop,ou=groups,dc=pivotal,dc=org",
            &["cn=self-loop,ou=groups,dc=pivotal,dc=org", CWASHBURN2],
        ),
        group(
            "dangling",
            "cn=dangling,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN, "cn=ghost,ou=groups,dc=pivotal,dc=org"],
        ),
        group(
            "ops",
            "cn=ops,ou=groups,dc=pivotal,dc=org",
            &["cn=alice,ou=users,dc=pivotal,dc=org"],
        ),
        group(
            "top",
            "cn=top,ou=groups,dc=pivotal,dc=org",
            &["cn=ops,ou=groups,dc=pivotal,dc=org"],
        ),
        group("twins", "cn=twins,ou=groups,dc=pivotal,dc=org", &[CWASHBURN]),
        group(
            "twins",
            "cn=twins,ou=legacy,ou=groups,dc=pivotal,dc=org",
            &[CWASHBURN1],
        ),
    ])
}
