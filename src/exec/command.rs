// src/exec/command.rs

//! Production command backend: runs each command with `sh -c` via
//! `tokio::process`, echoing its output while capturing it for
//! diagnostics.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::backend::{CommandBackend, CommandOutput, CommandSpec};

/// Runs commands as OS processes, one at a time.
#[derive(Debug, Clone, Default)]
pub struct RealCommandBackend {
    timeout: Option<Duration>,
}

impl RealCommandBackend {
    /// `timeout` bounds each process; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandBackend for RealCommandBackend {
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>> {
        let timeout = self.timeout;
        Box::pin(async move { run_command(spec, timeout).await })
    }
}

async fn run_command(spec: CommandSpec, timeout: Option<Duration>) -> Result<CommandOutput> {
    info!(
        collaborator = %spec.collaborator,
        cwd = ?spec.cwd,
        cmd = %spec.command,
        "running command"
    );

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&spec.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&spec.command);
        c
    };

    cmd.current_dir(&spec.cwd)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {} command '{}'", spec.collaborator, spec.command))?;

    let stdout = child.stdout.take().map(|s| tee_lines(s, false));
    let stderr = child.stderr.take().map(|s| tee_lines(s, true));

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(
                    collaborator = %spec.collaborator,
                    timeout = ?limit,
                    "command timed out; killing process"
                );
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "failed to kill timed-out process");
                }
                return Err(anyhow!(
                    "{} command timed out after {:?}: {}",
                    spec.collaborator,
                    limit,
                    spec.command
                )
                .into());
            }
        },
        None => child.wait().await,
    }
    .with_context(|| format!("waiting for {} command '{}'", spec.collaborator, spec.command))?;

    let output = CommandOutput {
        code: status.code(),
        stdout: collect(stdout).await,
        stderr: collect(stderr).await,
    };

    debug!(
        collaborator = %spec.collaborator,
        exit_code = ?output.code,
        success = output.is_success(),
        "command exited"
    );
    Ok(output)
}

/// Forward every line to our own stdout/stderr and keep a copy.
fn tee_lines<R>(reader: R, is_stderr: bool) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut captured = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
            captured.push_str(&line);
            captured.push('\n');
        }
        captured
    })
}

async fn collect(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h.await.unwrap_or_default(),
        None => String::new(),
    }
}
