use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn {binary}: {source}")]
    SpawnFailed {
        binary: String,
        source: std::io::Error,
    },

    #[error("Transport exited with {}", exit_label(.code))]
    Exited { code: Option<i32>, output: String },

    #[error("Transport did not finish within {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Diagnostic output captured from the process, if any was kept.
    pub fn output(&self) -> Option<&str> {
        match self {
            TransportError::Exited { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
