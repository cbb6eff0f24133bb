//! Configuration for Dirlookup
//!
//! Example config file:
//! ```toml
//! [directory]
//! ldap_host = "ldap.example.org"
//! ldap_port = 389
//! bind_dn = "cn=admin,dc=example,dc=org"
//! bind_password = "password"
//! user_search_base = "dc=example,dc=org"
//! user_name_attribute = "uid"
//! user_mail_attribute = "mail"
//! group_search_base = "ou=groups,dc=example,dc=org"
//! group_attribute = "member"
//! user_object_class = "inetOrgPerson"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirlookupConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirlookupConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        toml::from_str(&content).map_err(|e| {
            crate::Error::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `DIRLOOKUP_*` environment variables onto this configuration
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(format!("{}{}", crate::ENV_PREFIX, name)).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let dir = &mut self.directory;

        if let Some(host) = var("LDAP_HOST") {
            dir.ldap_host = host;
        }
        if let Some(port) = var("LDAP_PORT") {
            match port.parse() {
                Ok(p) => dir.ldap_port = p,
                Err(_) => tracing::warn!("Ignoring invalid LDAP port: {}", port),
            }
        }
        if let Some(v) = var("BIND_DN") {
            dir.bind_dn = v;
        }
        if let Some(v) = var("BIND_PASSWORD") {
            dir.bind_password = v;
        }
        if let Some(v) = var("USER_SEARCH_BASE") {
            dir.user_search_base = v;
        }
        if let Some(v) = var("USER_NAME_ATTRIBUTE") {
            dir.user_name_attribute = v;
        }
        if let Some(v) = var("USER_MAIL_ATTRIBUTE") {
            dir.user_mail_attribute = v;
        }
        if let Some(v) = var("USER_OBJECT_CLASS") {
            dir.user_object_class = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = var("GROUP_SEARCH_BASE") {
            dir.group_search_base = v;
        }
        if let Some(v) = var("GROUP_ATTRIBUTE") {
            dir.group_attribute = v;
        }
        if let Some(v) = var("USE_TLS") {
            dir.use_tls = v == "true";
        }
        if let Some(v) = var("START_TLS") {
            dir.start_tls = v == "true";
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Directory server and schema mapping configuration.
///
/// Immutable for the lifetime of a resolution; every resolver operation takes
/// it by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory host name or address
    #[serde(default = "default_ldap_host")]
    pub ldap_host: String,

    /// Directory port
    #[serde(default = "default_ldap_port")]
    pub ldap_port: u16,

    /// Connect with ldaps:// instead of ldap://
    #[serde(default)]
    pub use_tls: bool,

    /// Upgrade a plain connection with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Bind DN (service account)
    /// Example: "cn=admin,dc=example,dc=org"
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Base DN for user searches
    #[serde(default)]
    pub user_search_base: String,

    /// Attribute holding the login name
    #[serde(default = "default_user_name_attr")]
    pub user_name_attribute: String,

    /// Attribute holding the email address
    #[serde(default = "default_user_mail_attr")]
    pub user_mail_attribute: String,

    /// Restrict user searches to this object class
    #[serde(default)]
    pub user_object_class: Option<String>,

    /// Base DN for group searches
    #[serde(default)]
    pub group_search_base: String,

    /// Membership attribute on group entries
    #[serde(default = "default_group_attr")]
    pub group_attribute: String,

    /// Naming attribute group names are matched against
    #[serde(default = "default_group_name_attr")]
    pub group_name_attribute: String,

    /// Restrict group searches to this object class
    #[serde(default)]
    pub group_object_class: Option<String>,
}

fn default_ldap_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ldap_port() -> u16 {
    crate::DEFAULT_LDAP_PORT
}

fn default_timeout() -> u64 {
    10
}

fn default_user_name_attr() -> String {
    "uid".to_string()
}

fn default_user_mail_attr() -> String {
    "mail".to_string()
}

fn default_group_attr() -> String {
    "member".to_string()
}

fn default_group_name_attr() -> String {
    "cn".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            ldap_host: default_ldap_host(),
            ldap_port: default_ldap_port(),
            use_tls: false,
            start_tls: false,
            insecure_skip_verify: false,
            timeout_seconds: default_timeout(),
            bind_dn: String::new(),
            bind_password: String::new(),
            user_search_base: String::new(),
            user_name_attribute: default_user_name_attr(),
            user_mail_attribute: default_user_mail_attr(),
            user_object_class: None,
            group_search_base: String::new(),
            group_attribute: default_group_attr(),
            group_name_attribute: default_group_name_attr(),
            group_object_class: None,
        }
    }
}

impl DirectoryConfig {
    /// Connection URL derived from host, port and TLS mode
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.ldap_host, self.ldap_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        let required = [
            ("ldap_host", &self.ldap_host),
            ("bind_dn", &self.bind_dn),
            ("user_search_base", &self.user_search_base),
            ("user_name_attribute", &self.user_name_attribute),
            ("user_mail_attribute", &self.user_mail_attribute),
            ("group_search_base", &self.group_search_base),
            ("group_attribute", &self.group_attribute),
            ("group_name_attribute", &self.group_name_attribute),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(crate::Error::InvalidConfig(format!("{} is required", name)));
            }
        }

        if self.ldap_port == 0 {
            return Err(crate::Error::InvalidConfig("ldap_port must be non-zero".into()));
        }

        if self.use_tls && self.start_tls {
            return Err(crate::Error::InvalidConfig(
                "use_tls and start_tls are mutually exclusive".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
