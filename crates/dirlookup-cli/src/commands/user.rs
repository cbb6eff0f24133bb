//! user and dn commands - resolve a single user

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use dirlookup_core::UserRecord;
use std::path::Path;

pub async fn execute(ctx: &CommandContext, login: &str) -> Result<()> {
    ctx.config.validate()?;

    let user = dirlookup_ldap::get_user(&ctx.config, login).await?;
    print_user(ctx, &user)
}

pub async fn execute_dn(
    ctx: &CommandContext,
    reference: Option<&str>,
    file: Option<&Path>,
) -> Result<()> {
    ctx.config.validate()?;

    let reference = match (reference, file) {
        (Some(reference), _) => reference.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("A DN or --file is required"),
    };

    let user = dirlookup_ldap::get_ldap_user(&ctx.config, &reference).await?;
    print_user(ctx, &user)
}

fn print_user(ctx: &CommandContext, user: &UserRecord) -> Result<()> {
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("{}", user.user_id.blue().bold());
        println!("  {}: {}", "DN".cyan(), user.user_dn);
        if user.email.is_empty() {
            println!("  {}: {}", "Email".cyan(), "(none)".dimmed());
        } else {
            println!("  {}: {}", "Email".cyan(), user.email);
        }
    }

    Ok(())
}
