//! Configuration loading for the Dirlookup CLI
//!
//! Precedence, lowest first: config file (`--config`), `DIRLOOKUP_*`
//! environment variables (a `.env` file is loaded first), command-line flags.

use crate::Cli;
use anyhow::{Context, Result};
use dirlookup_core::{DirectoryConfig, DirlookupConfig};

pub fn load(cli: &Cli) -> Result<DirlookupConfig> {
    let mut config = match &cli.config {
        Some(path) => DirlookupConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => DirlookupConfig::default(),
    };

    config.apply_env();
    apply_overrides(&mut config, cli);

    Ok(config)
}

fn apply_overrides(config: &mut DirlookupConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.directory.ldap_host = host.clone();
    }
    if let Some(port) = cli.port {
        config.directory.ldap_port = port;
    }
    if let Some(bind_dn) = &cli.bind_dn {
        config.directory.bind_dn = bind_dn.clone();
    }
    if let Some(password) = &cli.bind_password {
        config.directory.bind_password = password.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

/// Effective settings as displayable key/value pairs, secrets masked
pub fn describe(config: &DirectoryConfig) -> Vec<(&'static str, String)> {
    let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());

    vec![
        ("url", config.url()),
        ("start_tls", config.start_tls.to_string()),
        ("insecure_skip_verify", config.insecure_skip_verify.to_string()),
        ("timeout_seconds", config.timeout_seconds.to_string()),
        ("bind_dn", config.bind_dn.clone()),
        (
            "bind_password",
            if config.bind_password.is_empty() {
                "(not set)".to_string()
            } else {
                "***".to_string()
            },
        ),
        ("user_search_base", config.user_search_base.clone()),
        ("user_name_attribute", config.user_name_attribute.clone()),
        ("user_mail_attribute", config.user_mail_attribute.clone()),
        ("user_object_class", optional(&config.user_object_class)),
        ("group_search_base", config.group_search_base.clone()),
        ("group_attribute", config.group_attribute.clone()),
        ("group_name_attribute", config.group_name_attribute.clone()),
        ("group_object_class", optional(&config.group_object_class)),
    ]
}
