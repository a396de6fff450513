// src/exec/probe.rs

//! Ask the active interpreter which major version it is.

use std::path::Path;

use tracing::{debug, warn};

use crate::exec::backend::{Collaborator, CommandBackend, CommandSpec};
use crate::exec::toolchain::Toolchain;
use crate::types::RuntimeTag;

const PROBE_SCRIPT: &str = "import sys; sys.stdout.write(str(sys.version_info.major))";

/// Probe the configured interpreter for its major version.
///
/// Any failure is logged and yields `None`, so the caller keeps its default.
pub async fn probe_runtime<B: CommandBackend + ?Sized>(
    backend: &mut B,
    toolchain: &Toolchain,
    cwd: &Path,
) -> Option<RuntimeTag> {
    let spec = CommandSpec {
        collaborator: Collaborator::Runtime,
        command: format!("{} -c '{}'", toolchain.python, PROBE_SCRIPT),
        cwd: cwd.to_path_buf(),
        env: Vec::new(),
    };

    let output = match backend.run(spec).await {
        Ok(output) => output,
        Err(e) => {
            warn!(python = %toolchain.python, error = %e, "runtime probe failed; using default runtime");
            return None;
        }
    };

    if !output.is_success() {
        warn!(
            python = %toolchain.python,
            diagnostic = %output.diagnostic(),
            "runtime probe exited with failure; using default runtime"
        );
        return None;
    }

    match output.stdout.trim().parse::<RuntimeTag>() {
        Ok(tag) => {
            debug!(runtime = %tag, "probed runtime version");
            Some(tag)
        }
        Err(e) => {
            warn!(output = %output.stdout.trim(), error = %e, "unexpected runtime probe output");
            None
        }
    }
}
