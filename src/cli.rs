//! # Command Line Interface
//!
//! Entry point of the `watson` binary: serve the registry API or manage the
//! database schema.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::start_api_server;
use crate::cipher::CipherFactory;
use crate::client::{ClientConfig, WatsonClient};
use crate::config::AppConfig;
use crate::errors::{Result, WatsonError};
use crate::observability::{init_logging, log_config_info};
use crate::services::Registry;
use crate::storage::{
    create_pool, get_migration_version, list_applied_migrations, run_migrations,
    validate_migrations, DbPool,
};
use crate::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "watson")]
#[command(about = "Registry for infrastructure-as-code stack outputs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Database URL override
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the registry API server (default)
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind to
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Database management commands
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },

    /// Read outputs from a running Watson server
    Outputs {
        #[command(subcommand)]
        command: OutputsCommands,
    },
}

#[derive(Subcommand)]
pub enum OutputsCommands {
    /// Print the outputs of a stack as JSON
    Get {
        /// Stack to read, as `project/stack`
        stack: String,

        /// Print only this output
        key: Option<String>,

        /// Server address (defaults to WATSON_ADDRESS)
        #[arg(long)]
        address: Option<String>,

        /// Stack to record the read for (defaults to WATSON_STACK)
        #[arg(long)]
        caller: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DatabaseCommands {
    /// Run pending migrations
    Migrate,

    /// Show migration status
    Status,

    /// List all applied migrations
    List,

    /// Validate database schema
    Validate,
}

/// Run CLI commands
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    match cli.command.unwrap_or(Commands::Serve { port: None, addr: None }) {
        Commands::Serve { port, addr } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(addr) = addr {
                config.server.host = addr;
            }

            config.validate()?;
            init_logging(&config.observability)?;
            run_server(config).await
        }

        Commands::Database { command } => {
            // Migrations are applied explicitly by `database migrate`
            config.database.auto_migrate = false;
            config.validate()?;
            init_logging(&config.observability)?;

            let pool = create_pool(&config.database).await?;
            handle_database_command(command, &pool).await
        }

        Commands::Outputs { command } => {
            init_logging(&config.observability)?;
            handle_outputs_command(command).await
        }
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!(app_name = APP_NAME, version = VERSION, "Starting Watson output registry");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;

    let ciphers = Arc::new(CipherFactory::new(config.cipher.clone()));
    // Fail fast on unusable key material instead of on the first sensitive write
    ciphers.cipher().await?;

    let registry = Registry::new(pool.clone(), ciphers);
    start_api_server(&config.server, registry).await?;

    pool.close().await;
    Ok(())
}

async fn handle_database_command(command: DatabaseCommands, pool: &DbPool) -> Result<()> {
    match command {
        DatabaseCommands::Migrate => {
            run_migrations(pool).await?;
            println!("Migrations applied; schema version {}", get_migration_version(pool).await?);
        }

        DatabaseCommands::Status => {
            let version = get_migration_version(pool).await?;
            let valid = validate_migrations(pool).await?;
            println!("Schema version: {}", version);
            println!("Migrations up to date: {}", if valid { "yes" } else { "no" });
        }

        DatabaseCommands::List => {
            let migrations = list_applied_migrations(pool).await?;
            if migrations.is_empty() {
                println!("No migrations applied");
            }
            for migration in migrations {
                println!(
                    "{:>16}  {}  {}  ({} ms)",
                    migration.version,
                    migration.installed_on.format("%Y-%m-%d %H:%M:%S"),
                    migration.description,
                    migration.execution_time
                );
            }
        }

        DatabaseCommands::Validate => {
            if !validate_migrations(pool).await? {
                return Err(crate::errors::WatsonError::validation(
                    "Database schema does not match the embedded migrations",
                ));
            }
            println!("Database schema is valid");
        }
    }

    Ok(())
}

async fn handle_outputs_command(command: OutputsCommands) -> Result<()> {
    match command {
        OutputsCommands::Get { stack, key, address, caller } => {
            let mut config = ClientConfig::from_env();
            if let Some(address) = address {
                config.address = address;
            }
            if caller.is_some() {
                config.stack = caller;
            }

            println!("{}", fetch_outputs(&config, &stack, key.as_deref()).await?);
        }
    }

    Ok(())
}

/// Fetch a stack's outputs (or a single one) and render them as pretty JSON
pub async fn fetch_outputs(config: &ClientConfig, stack: &str, key: Option<&str>) -> Result<String> {
    let client = WatsonClient::new(config)?;
    let outputs = client
        .get_outputs(stack)
        .await?
        .ok_or_else(|| WatsonError::not_found("Stack", stack))?;

    let rendered = match key {
        Some(key) => {
            let output = outputs.get(key).ok_or_else(|| WatsonError::output_not_found(key))?;
            serde_json::to_string_pretty(output)?
        }
        None => serde_json::to_string_pretty(&outputs)?,
    };

    Ok(rendered)
}
