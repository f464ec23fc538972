//! Thala CLI - admin directory and SQL console tools.
//!
//! # Usage
//!
//! ```bash
//! # List admins and their roles
//! thala-cli admin list --file admins.yaml
//!
//! # Check a permission (exit status 1 if denied)
//! thala-cli admin check --file admins.yaml -e ops@thala.app -p delete_videos
//!
//! # Run a read-only query through the admin service
//! THALA_ADMIN_SESSION=... thala-cli sql run "select count(*) from users"
//! ```
//!
//! # Commands
//!
//! - `admin list|check|roles` - Inspect the admin directory and role table
//! - `sql run|history` - SQL console with persisted history

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use thala_core::console::ViewMode;

use commands::sql::{ExportFormat, RunOptions};

mod commands;

#[derive(Parser)]
#[command(name = "thala-cli")]
#[command(author, version, about = "Thala admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the admin directory
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Query the database through the admin service
    Sql {
        #[command(subcommand)]
        action: SqlAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List configured admins
    List {
        /// Admin directory file (YAML)
        #[arg(short, long, env = "ADMIN_USERS_FILE")]
        file: PathBuf,
    },
    /// Check whether an admin holds a permission
    Check {
        /// Admin directory file (YAML)
        #[arg(short, long, env = "ADMIN_USERS_FILE")]
        file: PathBuf,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Permission name (e.g. `view_audit_logs`)
        #[arg(short, long)]
        permission: String,
    },
    /// Print every role and its permissions
    Roles,
}

#[derive(Subcommand)]
enum SqlAction {
    /// Run a SELECT query
    Run {
        /// Query text
        query: String,

        /// Admin service base URL
        #[arg(long, env = "THALA_ADMIN_URL", default_value = "http://127.0.0.1:3001")]
        admin_url: String,

        /// Session cookie value
        #[arg(long, env = "THALA_ADMIN_SESSION", hide_env_values = true)]
        session: Option<String>,

        /// Result view (`table`, `bar`, `line`, `pie`)
        #[arg(long, default_value = "table")]
        view: ViewMode,

        /// Export format (`csv`, `json`) instead of a view
        #[arg(long)]
        export: Option<ExportFormat>,

        /// Write the export to a file instead of stdout
        #[arg(short, long, requires = "export")]
        output: Option<PathBuf>,
    },
    /// Show the query history
    History {
        /// Remove all history entries
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thala_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::List { file } => commands::admin::list(&file, &mut stdout)?,
            AdminAction::Check {
                file,
                email,
                permission,
            } => {
                if !commands::admin::check(&file, &email, &permission)? {
                    return Err(format!("{email} does not hold {permission}").into());
                }
            }
            AdminAction::Roles => commands::admin::roles(&mut stdout)?,
        },
        Commands::Sql { action } => match action {
            SqlAction::Run {
                query,
                admin_url,
                session,
                view,
                export,
                output,
            } => {
                let options = RunOptions {
                    admin_url,
                    session: session.map(SecretString::from),
                    view,
                    export,
                    output,
                };
                commands::sql::run(&query, &options, &mut stdout).await?;
            }
            SqlAction::History { clear } => commands::sql::history(clear, &mut stdout)?,
        },
    }
    Ok(())
}
