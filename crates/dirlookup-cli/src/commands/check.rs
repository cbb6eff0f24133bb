//! check-config command - validate and show the effective configuration

use super::CommandContext;
use crate::config::describe;
use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let validation = ctx.config.validate();
    let settings = describe(&ctx.config);

    if ctx.is_json() {
        let settings: BTreeMap<&str, &str> =
            settings.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let result = serde_json::json!({
            "valid": validation.is_ok(),
            "error": validation.as_ref().err().map(|e| e.to_string()),
            "settings": settings,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", "Effective configuration:".bold());
        println!();
        for (key, value) in &settings {
            println!("  {}: {}", key.cyan(), value);
        }
        println!();
        match &validation {
            Ok(()) => println!("{}", "Configuration is valid".green()),
            Err(e) => println!("{} {}", "Configuration is invalid:".red(), e),
        }
    }

    validation.map_err(Into::into)
}
