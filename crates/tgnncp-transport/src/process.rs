use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, TransportError};

pub(crate) struct ProcessOutput {
    pub status: ExitStatus,
    pub output: String,
}

/// Runs `binary` once, feeding `input` on stdin, and waits for it to exit.
///
/// stdout and stderr are only kept when `capture` is set. The child is killed
/// if it outlives `timeout`.
pub(crate) async fn run_with_stdin<S: AsRef<OsStr>>(
    binary: &Path,
    args: &[S],
    input: &[u8],
    capture: bool,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let (stdout, stderr) = if capture {
        (Stdio::piped(), Stdio::piped())
    } else {
        (Stdio::null(), Stdio::null())
    };

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TransportError::SpawnFailed {
            binary: binary.display().to_string(),
            source,
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| std::io::Error::new(ErrorKind::BrokenPipe, "child stdin unavailable"))?;

    let write = async move {
        let result = stdin.write_all(input).await;
        // closing stdin signals end of payload
        drop(stdin);
        result
    };

    // Dropping the joined future on timeout drops the child, which kills it.
    let (written, output) = tokio::time::timeout(timeout, async {
        tokio::join!(write, child.wait_with_output())
    })
    .await
    .map_err(|_| TransportError::Timeout(timeout))?;

    let output = output?;

    match written {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("transport closed stdin before reading the full payload");
        }
        Err(e) => return Err(TransportError::Io(e)),
        Ok(()) => {}
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }

    Ok(ProcessOutput {
        status: output.status,
        output: text,
    })
}
