use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tgnncp_worker::TransportConfig;

pub const DEFAULT_DB_PATH: &str = "./messages.db";

/// Relay Telegram chats to a node of the NNCP store-and-forward network.
///
/// Run at most one relaying instance against a given database: two instances
/// would both pick up and deliver the same queued messages.
#[derive(Parser, Debug)]
#[command(name = "tgnncp", version)]
pub struct Cli {
    /// Initialize (and clear) the database, then exit
    #[arg(long)]
    pub init: bool,

    /// Only ingest messages, never run nncp-file
    #[arg(long = "dryrun")]
    pub dry_run: bool,

    /// Enable debug logging and keep nncp-file output
    #[arg(long)]
    pub debug: bool,

    /// Enable debug logging for the Telegram bot
    #[arg(long = "botdebug")]
    pub bot_debug: bool,

    /// Path to the messages database
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db: String,

    /// Seconds to wait for one nncp-file run before giving up on it
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub transport_timeout: u64,

    #[arg(long, env = "TG_BOT_SECRET", hide_env_values = true)]
    pub bot_secret: Option<String>,

    /// nncp-file binary, looked up in PATH by default
    #[arg(long, env = "NNCP_PATH")]
    pub nncp_path: Option<PathBuf>,

    /// NNCP configuration file passed to nncp-file with -cfg
    #[arg(long, env = "NNCP_CFG_PATH")]
    pub nncp_cfg_path: Option<PathBuf>,

    /// Destination node for relayed messages
    pub node: Option<String>,
}

impl Cli {
    pub fn db_path(&self) -> Result<&str> {
        if self.db.is_empty() {
            return Err(eyre!("path to db was not provided"));
        }
        Ok(&self.db)
    }

    pub fn bot_secret(&self) -> Result<&str> {
        match self.bot_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(eyre!(
                "Need to set the Telegram bot secret in envar TG_BOT_SECRET, got empty string"
            )),
        }
    }

    /// Destination node, `None` in dry-run mode where no relaying happens.
    pub fn relay_node(&self) -> Result<Option<&str>> {
        if self.dry_run {
            return Ok(None);
        }
        match self.node.as_deref() {
            Some(node) if !node.is_empty() => Ok(Some(node)),
            _ => Err(eyre!("Need a destination node to send messages to")),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        let defaults = TransportConfig::default();

        let binary = non_empty(&self.nncp_path)
            .map(|path| absolute(path, "nncp-file path"))
            .unwrap_or(defaults.binary);
        let cfg_path = non_empty(&self.nncp_cfg_path).map(|path| absolute(path, "config path"));

        TransportConfig {
            binary,
            cfg_path,
            verbose: self.debug,
            timeout: Duration::from_secs(self.transport_timeout),
        }
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

fn absolute(path: &Path, what: &str) -> PathBuf {
    match std::path::absolute(path) {
        Ok(abs) => abs,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "error canonicalizing {}", what);
            path.to_path_buf()
        }
    }
}
