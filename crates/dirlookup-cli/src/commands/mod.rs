//! CLI command implementations

pub mod check;
pub mod group;
pub mod user;

use crate::OutputFormat;
use dirlookup_core::DirectoryConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirectoryConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}
