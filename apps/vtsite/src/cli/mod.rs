//! # vtsite CLI Module
//!
//! Command-line interface for running and editing the site.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create the settings database and a starter `vtsite.toml`
//! - `settings` - List, read, write or reset settings
//! - `achievements` - Edit the achievements lists
//! - `render` - Write the public pages as static HTML
//! - `schema` - Show every settings key with its kind and default

mod commands;

use crate::config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;
use vtsite_core::SiteError;

pub use commands::*;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// vtsite - VTuber promotional site server
///
/// Serves the public site and an admin API, and edits the site settings
/// from the command line.
#[derive(Parser, Debug)]
#[command(name = "vtsite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Server configuration file (default: vtsite.toml, optional)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings database (overrides `storage.database`)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Keep settings in memory only (nothing is read from or written to the database)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides `server.host`)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides `server.port`)
        #[arg(short, long)]
        port: Option<u16>,

        /// Static assets directory (overrides `server.assets_dir`)
        #[arg(long)]
        assets: Option<PathBuf>,
    },

    /// Create the settings database and a starter config file
    Init {
        /// Recreate the database and overwrite the config file
        #[arg(short, long)]
        force: bool,
    },

    /// Read and write settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Edit an achievements list (personal or business)
    Achievements {
        #[command(subcommand)]
        action: AchievementsAction,
    },

    /// Write the public pages as static HTML files
    Render {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the settings schema
    Schema,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Every setting with its effective value
    List,

    /// One setting's stored text (or default)
    Get { key: String },

    /// Sanitize and store a value
    Set { key: String, value: String },

    /// Remove the stored value so the default applies
    Reset { key: String },
}

#[derive(Subcommand, Debug)]
pub enum AchievementsAction {
    /// Show the list
    List { category: String },

    /// Append an empty record
    Add { category: String },

    /// Delete the record at INDEX (0-based)
    Remove { category: String, index: usize },

    /// Set one field (icon, date, title, description) of one record
    Update {
        category: String,
        index: usize,
        field: String,
        value: String,
    },

    /// Move the record at FROM so it ends up at TO
    Move {
        category: String,
        from: usize,
        to: usize,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Load the server configuration, applying `--database` and `--ephemeral`.
fn load_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let (path, required) = match &cli.config {
        Some(path) => (path.as_path(), true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };
    let mut config = AppConfig::load(path, required)?;
    if let Some(database) = &cli.database {
        config.storage.database.clone_from(database);
    }
    if cli.ephemeral {
        config.storage.ephemeral = true;
    }
    Ok(config)
}

/// Default log filter when `RUST_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "vtsite=debug,vtsite_core=debug,tower_http=debug"
    } else {
        "vtsite=info,vtsite_core=info,tower_http=debug"
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(&cli)?;
    let json_mode = cli.json_mode;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match cli.command {
        Some(Commands::Server { host, port, assets }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(assets) = assets {
                config.server.assets_dir = assets;
            }
            cmd_server(&config).await?;
        }
        Some(Commands::Init { force }) => cmd_init(&config, &config_path, force)?,
        Some(Commands::Settings { action }) => match action {
            SettingsAction::List => cmd_settings_list(&config, json_mode)?,
            SettingsAction::Get { key } => cmd_settings_get(&config, json_mode, &key)?,
            SettingsAction::Set { key, value } => {
                cmd_settings_set(&config, json_mode, &key, &value)?;
            }
            SettingsAction::Reset { key } => cmd_settings_reset(&config, json_mode, &key)?,
        },
        Some(Commands::Achievements { action }) => cmd_achievements(&config, json_mode, action)?,
        Some(Commands::Render { output }) => cmd_render(&config, &output)?,
        Some(Commands::Schema) => cmd_schema(json_mode),
        None => cmd_settings_list(&config, json_mode)?,
    }
    Ok(())
}
