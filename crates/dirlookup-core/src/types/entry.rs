//! Directory entry types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single entry returned by a directory search.
///
/// Attributes are kept as a generic multimap; only the handful this crate
/// needs get typed accessors. LDAP attribute names are case-insensitive, so
/// lookups fall back to an ASCII case-insensitive match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry DN as returned by the directory
    pub dn: String,

    /// Attribute name to values
    #[serde(default)]
    pub attrs: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style helper that appends values to an attribute
    pub fn with_attr<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attrs
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// All values of an attribute, empty if absent
    pub fn values(&self, name: &str) -> &[String] {
        if let Some(values) = self.attrs.get(name) {
            return values;
        }

        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// First non-empty value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name)
            .iter()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    /// Login name under the configured login attribute
    pub fn login(&self, attribute: &str) -> Option<&str> {
        self.first(attribute)
    }

    /// Email under the configured mail attribute
    pub fn mail(&self, attribute: &str) -> Option<&str> {
        self.first(attribute)
    }

    /// Group membership references under the configured membership attribute
    pub fn members(&self, attribute: &str) -> impl Iterator<Item = &str> {
        self.values(attribute)
            .iter()
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}
