//! Dirlookup - resolve users and group memberships from an LDAP directory

mod commands;
mod config;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use dirlookup_core::LoggingConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirlookup")]
#[command(author = "Dirlookup Team")]
#[command(version = dirlookup_core::VERSION)]
#[command(about = "Resolve users and group memberships from an LDAP directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRLOOKUP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Directory port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Bind DN
    #[arg(long, global = true)]
    bind_dn: Option<String>,

    /// Bind password
    #[arg(long, global = true)]
    bind_password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a user by login name
    User {
        /// Login name
        login: String,
    },

    /// Look up a user by DN, login name or inline entry
    Dn {
        /// DN such as "cn=Washburn\, Caleb,ou=users,dc=example,dc=org"
        #[arg(required_unless_present = "file")]
        reference: Option<String>,

        /// Read the DN or inline entry from a file
        #[arg(short, long, conflicts_with = "reference")]
        file: Option<PathBuf>,
    },

    /// List the login IDs of all direct and nested members of a group
    Group {
        /// Group name
        name: String,
    },

    /// Validate and print the effective configuration
    CheckConfig,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(3);
        }
    };

    init_logging(&config.logging);

    let ctx = CommandContext {
        config: config.directory,
        output_format: cli.output,
    };

    let result = match cli.command {
        Commands::User { login } => commands::user::execute(&ctx, &login).await,
        Commands::Dn { reference, file } => {
            commands::user::execute_dn(&ctx, reference.as_deref(), file.as_deref()).await
        }
        Commands::Group { name } => commands::group::execute(&ctx, &name).await,
        Commands::CheckConfig => commands::check::execute(&ctx),
    };

    if let Err(e) = result {
        ctx.error(&format!("Error: {:#}", e));
        let code = e
            .downcast_ref::<dirlookup_core::Error>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}
