//! group command - list the members of a group

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct GroupMembers<'a> {
    group: &'a str,
    user_ids: Vec<&'a str>,
}

pub async fn execute(ctx: &CommandContext, name: &str) -> Result<()> {
    ctx.config.validate()?;

    let ids = dirlookup_ldap::get_user_ids(&ctx.config, name).await?;

    if ctx.is_json() {
        let result = GroupMembers {
            group: name,
            user_ids: ids.iter().map(String::as_str).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} ({} users)", name.blue().bold(), ids.len());
        for id in &ids {
            println!("  {}", id);
        }
    }

    Ok(())
}
