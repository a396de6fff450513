// src/exec/backend.rs

//! Pluggable command backend abstraction.
//!
//! The executor talks to a `CommandBackend` instead of spawning processes
//! itself. Production code uses [`super::command::RealCommandBackend`];
//! tests provide a fake that records command lines and scripts outcomes.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;

/// External collaborator a command belongs to. Used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    /// Interpreter version probe.
    Runtime,
    Linter,
    Tox,
    TestRunner,
    ImportTest,
    CliTest,
    TestScript,
    Backport,
    Builder,
    InstallClient,
    Signer,
    Uploader,
    Container,
    /// Command from a config-defined target.
    Shell,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Collaborator::Runtime => "runtime probe",
            Collaborator::Linter => "linter",
            Collaborator::Tox => "tox",
            Collaborator::TestRunner => "test runner",
            Collaborator::ImportTest => "import test",
            Collaborator::CliTest => "cli test",
            Collaborator::TestScript => "test script",
            Collaborator::Backport => "backport transformer",
            Collaborator::Builder => "package builder",
            Collaborator::InstallClient => "install client",
            Collaborator::Signer => "signer",
            Collaborator::Uploader => "repository client",
            Collaborator::Container => "container runtime",
            Collaborator::Shell => "shell",
        };
        f.write_str(s)
    }
}

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub collaborator: Collaborator,
    /// Shell command line (run with `sh -c`).
    pub command: String,
    pub cwd: PathBuf,
    /// Extra environment for the child, on top of the inherited one.
    pub env: Vec<(String, String)>,
}

/// What a finished command reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short diagnostic for error reports: the last few non-empty lines of
    /// stderr, falling back to stdout, then to the exit code.
    pub fn diagnostic(&self) -> String {
        const MAX_LINES: usize = 5;
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return match self.code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
        }
        lines[lines.len().saturating_sub(MAX_LINES)..].join("\n")
    }
}

/// Trait abstracting how collaborator commands are executed.
///
/// `Err` means the command could not be run to completion at all (spawn
/// failure, timeout); a command that ran and failed is an `Ok` output with
/// a non-zero code.
pub trait CommandBackend: Send {
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_prefers_stderr_tail() {
        let out = CommandOutput {
            code: Some(1),
            stdout: "noise".into(),
            stderr: "a\nb\n\nc\nd\ne\nf\n".into(),
        };
        assert_eq!(out.diagnostic(), "b\nc\nd\ne\nf");
    }

    #[test]
    fn diagnostic_falls_back_to_exit_code() {
        assert_eq!(CommandOutput::failure(2, "").diagnostic(), "exit code 2");
    }
}
