use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::Transport;
use crate::error::{Result, TransportError};
use crate::process::run_with_stdin;

pub const DEFAULT_BINARY: &str = "nncp-file";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Marker telling `nncp-file` to read the file body from stdin.
const STDIN_MARKER: &str = "-";

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub binary: PathBuf,
    pub cfg_path: Option<PathBuf>,
    /// Keep the process output for diagnostics.
    pub verbose: bool,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            cfg_path: None,
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Delivers payloads by running `nncp-file [-cfg <cfg>] - <destination>`.
pub struct NncpFile {
    config: TransportConfig,
}

impl NncpFile {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn command_args(&self, destination: &str) -> Vec<OsString> {
        let mut args = Vec::with_capacity(4);
        if let Some(cfg) = &self.config.cfg_path {
            args.push(OsString::from("-cfg"));
            args.push(cfg.clone().into_os_string());
        }
        args.push(OsString::from(STDIN_MARKER));
        args.push(OsString::from(destination));
        args
    }
}

#[async_trait]
impl Transport for NncpFile {
    async fn deliver(&self, payload: &[u8], destination: &str) -> Result<()> {
        let args = self.command_args(destination);

        let result = run_with_stdin(
            &self.config.binary,
            &args,
            payload,
            self.config.verbose,
            self.config.timeout,
        )
        .await?;

        if result.status.success() {
            if self.config.verbose && !result.output.is_empty() {
                tracing::debug!(output = %result.output.trim_end(), "nncp-file output");
            }
            return Ok(());
        }

        Err(TransportError::Exited {
            code: result.status.code(),
            output: result.output,
        })
    }
}
