//! LoThone operator command line
//!
//! Drives the account engine directly against the configured collection files,
//! supervisor command, Gotify server and SSTP admin API. Results are printed to
//! stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lothone_app::config::AppConfig;
use lothone_app::AppState;
use lothone_core::types::{AccountForm, DeleteForm, RequestContext};
use lothone_core::Protocol;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Config file read when `--config` is not given, if it exists
const DEFAULT_CONFIG_FILE: &str = "lothone.toml";

#[derive(Parser, Debug)]
#[command(name = "lothone")]
#[command(about = "LoThone VPN account management", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "LOTHONE_CONFIG")]
    config: Option<PathBuf>,

    /// Actor address recorded in notifications
    #[arg(long, env = "LOTHONE_ACTOR", default_value = "127.0.0.1")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the accounts of a protocol
    List {
        #[arg(short = 't', long = "type")]
        protocol: Protocol,
    },
    /// Show one account by its protocol key
    Show {
        #[arg(short = 't', long = "type")]
        protocol: Protocol,
        /// Identifier (VMess) or credential (Shadowsocks)
        key: String,
    },
    /// Create an account
    Create(AccountArgs),
    /// Replace an account in place
    Edit(AccountArgs),
    /// Delete an account
    Delete(DeleteArgs),
    /// Print the plain and device-locked connection strings of an account
    Uri {
        #[arg(short = 't', long = "type")]
        protocol: Protocol,
        key: String,
    },
    /// Per-protocol account counts
    Summary,
    /// Create missing collection files
    Init,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[arg(short = 't', long = "type")]
    account_type: String,
    /// VMess identifier (UUID)
    #[arg(long, default_value = "")]
    identifier: String,
    /// Shadowsocks or SSTP credential (UUID)
    #[arg(long, default_value = "")]
    credential: String,
    /// Account owner; `-` for the default
    #[arg(short, long)]
    username: String,
    /// Device the locked connection string is bound to (UUID)
    #[arg(long)]
    device_id: String,
    /// First valid day, YYYY-MM-DD
    #[arg(long)]
    start_date: String,
    /// Last valid day, YYYY-MM-DD
    #[arg(long)]
    expire_date: String,
    /// SSTP user note
    #[arg(long, default_value = "")]
    description: String,
}

impl From<AccountArgs> for AccountForm {
    fn from(args: AccountArgs) -> Self {
        Self {
            account_type: args.account_type,
            identifier: args.identifier,
            credential: args.credential,
            username: args.username,
            device_id: args.device_id,
            start_date: args.start_date,
            expire_date: args.expire_date,
            description: args.description,
        }
    }
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[arg(short = 't', long = "type")]
    account_type: String,
    /// Identifier (VMess) or credential (Shadowsocks)
    #[arg(long, default_value = "")]
    identifier: String,
    #[arg(long)]
    device_id: String,
    /// SSTP account name
    #[arg(short, long, default_value = "")]
    username: String,
}

impl From<DeleteArgs> for DeleteForm {
    fn from(args: DeleteArgs) -> Self {
        Self {
            account_type: args.account_type,
            identifier: args.identifier,
            device_id: args.device_id,
            username: args.username,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(AppConfig::load(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => {
            tracing::info!("No config file, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let state = AppState::from_config(&config).context("Failed to initialize")?;
    let actor = RequestContext::new(cli.actor);

    match cli.command {
        Command::List { protocol } => {
            print_json(&state.query_service.list(protocol).await?)?;
        }
        Command::Show { protocol, key } => {
            print_json(&state.query_service.find(protocol, &key).await?)?;
        }
        Command::Create(args) => {
            let outcome = state
                .lifecycle_service
                .create_account(&actor, &args.into())
                .await?;
            print_json(&outcome)?;
        }
        Command::Edit(args) => {
            let outcome = state
                .lifecycle_service
                .edit_account(&actor, &args.into())
                .await?;
            print_json(&outcome)?;
        }
        Command::Delete(args) => {
            let outcome = state
                .lifecycle_service
                .delete_account(&actor, &args.into())
                .await?;
            print_json(&outcome)?;
        }
        Command::Uri { protocol, key } => {
            print_json(&state.query_service.connection_info(protocol, &key).await?)?;
        }
        Command::Summary => {
            let summary = state.query_service.summary().await;
            print_json(&json!({
                "vmess": summary.vmess,
                "shadowsocks": summary.shadowsocks,
                "sstp": summary.sstp,
                "total": summary.total(),
            }))?;
        }
        Command::Init => {
            for (protocol, created) in state.initialize_collections().await? {
                let path = config
                    .collection_path(protocol)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                if created {
                    println!("{protocol}: created {path}");
                } else {
                    println!("{protocol}: kept existing {path}");
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs to stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
