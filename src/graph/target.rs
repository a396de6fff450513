// src/graph/target.rs

//! Target declarations: name, prerequisites, freshness rule and action.

use std::path::PathBuf;

use crate::config::model::TargetConfig;
use crate::context::Context;
use crate::types::Repository;

/// Canonical target name type.
pub type TargetName = String;

/// A path whose location depends on the resolved [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRef {
    SetupDir,
    BackportDir,
    DistDir,
    /// Relative to the project root.
    Relative(PathBuf),
}

impl PathRef {
    pub fn resolve(&self, ctx: &Context) -> PathBuf {
        match self {
            PathRef::SetupDir => ctx.setup_dir.clone(),
            PathRef::BackportDir => ctx.backport_dir.clone(),
            PathRef::DistDir => ctx.dist_dir.clone(),
            PathRef::Relative(p) => ctx.cwd.join(p),
        }
    }
}

/// When a reached target actually runs its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Run every time the target is reached.
    Always,
    /// Run only if the path is missing, a file-backed prerequisite was
    /// rebuilt in this invocation, or a source file is newer than it.
    IfStale(PathRef),
}

/// Built-in action bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckSources,
    PrintVars,
    Lint,
    Tox,
    BaseTest,
    ScriptTest,
    Clean,
    Backport,
    PrepareSetupDir,
    DevInstall,
    Dist,
    DistInstall,
    Uninstall,
    DistBaseTest,
    BuildAllDists,
    Sign,
    Upload(Repository),
    DockerTest,
    Scaffold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Aggregate target; only its prerequisites do work.
    Noop,
    Step(Step),
    /// Shell commands from the project config, run in order.
    Shell(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: TargetName,
    pub freshness: Freshness,
    /// Prerequisites in declared (and execution) order.
    pub prerequisites: Vec<TargetName>,
    pub action: Action,
}

impl Target {
    /// A target that runs whenever it is reached.
    pub fn phony(name: &str, prerequisites: &[&str], action: Action) -> Self {
        Self {
            name: name.to_string(),
            freshness: Freshness::Always,
            prerequisites: prerequisites.iter().map(|s| s.to_string()).collect(),
            action,
        }
    }

    /// A target backed by a path on disk, skipped while that path is fresh.
    pub fn file(name: &str, output: PathRef, prerequisites: &[&str], action: Action) -> Self {
        Self {
            freshness: Freshness::IfStale(output),
            ..Self::phony(name, prerequisites, action)
        }
    }

    /// Build a target from a `[target.<name>]` config section.
    pub fn from_config(name: &str, cfg: &TargetConfig) -> Self {
        let cmds = cfg.cmd.clone().into_vec();
        let action = if cmds.is_empty() {
            Action::Noop
        } else {
            Action::Shell(cmds)
        };
        let freshness = match &cfg.output {
            Some(path) => Freshness::IfStale(PathRef::Relative(PathBuf::from(path))),
            None => Freshness::Always,
        };
        Self {
            name: name.to_string(),
            freshness,
            prerequisites: cfg.after.clone(),
            action,
        }
    }

    /// File-backed targets count as "rebuilt" for their dependents when
    /// their action runs.
    pub fn is_file_backed(&self) -> bool {
        matches!(self.freshness, Freshness::IfStale(_))
    }
}
