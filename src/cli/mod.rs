//! Command-line interface.
//!
//! With no subcommand (or `serve`) the binary runs the HTTP server. The other
//! subcommands work directly against the local database:
//! - `user add` / `user list` - manage login accounts
//! - `report export` - write the stock report to a file
//! - `config check` - validate and print the effective configuration

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Role;
use crate::report::{render_pdf, render_print_view, StockReport};
use crate::store::{InventoryStore, SqliteStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(author, version, about = "Campus stationery inventory and request tracking", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "STOCKROOM_CONFIG", default_value = "stockroom.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// True when the invocation should start the HTTP server
    pub fn is_serve(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// User account management
    #[command(subcommand)]
    User(UserCommands),

    /// Stock report commands
    #[command(subcommand)]
    Report(ReportCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a login account
    Add {
        #[arg(long)]
        email: String,
        /// lecturer or staff
        #[arg(long)]
        role: String,
        /// Password (prefer the environment variable)
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List login accounts
    List,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Write the current stock report to a file
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,
        /// Output path (default: Stock-Report-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Html,
    Json,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
        }
    }
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a non-server CLI command
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::User(UserCommands::Add {
            email,
            role,
            password,
        })) => cmd_user_add(config, email, role, password).await,
        Some(Commands::User(UserCommands::List)) => cmd_user_list(config).await,
        Some(Commands::Report(ReportCommands::Export { format, output })) => {
            cmd_report_export(config, *format, output.as_deref()).await
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli, config),
        // Handled in main.rs
        Some(Commands::Serve) | None => Ok(()),
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn InventoryStore>> {
    let pool = crate::db::init(&config.server.data_dir, &config.database).await?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

async fn cmd_user_add(config: &Config, email: &str, role: &str, password: &str) -> Result<()> {
    let role = Role::from_str(role)
        .with_context(|| format!("Unknown role '{}' (expected lecturer or staff)", role))?;

    let store = open_store(config).await?;
    crate::api::auth::register_user(store.as_ref(), email, password, role).await?;

    println!("[OK] Created {} account for {}", role.label(), email.trim().to_lowercase());
    Ok(())
}

async fn cmd_user_list(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!();
    println!("{:<40}  {:<24}  {:<24}", "EMAIL", "ROLE", "CREATED");
    println!("{}", "-".repeat(92));
    for user in users {
        println!(
            "{:<40}  {:<24}  {:<24}",
            user.email,
            user.role().label(),
            user.created_at
        );
    }
    println!();
    Ok(())
}

async fn cmd_report_export(
    config: &Config,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let store = open_store(config).await?;
    let items = store.list_items().await?;
    let report = StockReport::build(&items, Utc::now());

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_export_path(&report, format));

    let bytes = match format {
        ExportFormat::Pdf => render_pdf(&report)?,
        ExportFormat::Html => render_print_view(&report)?.into_bytes(),
        ExportFormat::Json => serde_json::to_vec_pretty(&report)?,
    };

    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    println!(
        "[OK] Wrote {} ({} items, {} bytes)",
        path.display(),
        report.total_items,
        bytes.len()
    );
    Ok(())
}

fn default_export_path(report: &StockReport, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", report.title, format.extension()))
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli, config: &Config) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if config_path.exists() {
        println!("[OK] Configuration file is valid!");
    } else {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!("Defaults are used when starting the server.");
    }

    println!();
    println!("=== Effective Configuration ===");
    println!();
    println!("Server:");
    println!("  Listen:       {}", config.listen_addr());
    println!("  Data Dir:     {}", config.server.data_dir.display());
    println!(
        "  Static Dir:   {}",
        config
            .server
            .static_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!();
    println!("Database:");
    println!("  File:         {}", config.database.filename);
    println!("  Connections:  {}", config.database.max_connections);
    println!();
    println!("Auth:");
    println!("  Session TTL:  {}h", config.auth.session_ttl_hours);
    println!(
        "  Bootstrap:    {}",
        config.auth.bootstrap_email.as_deref().unwrap_or("-")
    );
    println!(
        "  Secure Cookie: {}",
        if config.auth.secure_cookie { "Enabled" } else { "Disabled" }
    );
    println!();
    println!("Logging:");
    println!("  Level:        {}", config.logging.level);
    println!();

    if config.auth.bootstrap_email.is_some() != config.auth.bootstrap_password.is_some() {
        println!("[!!] auth.bootstrap_email and auth.bootstrap_password must be set together");
    }

    Ok(())
}
