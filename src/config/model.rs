// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::RuntimeTag;

/// Project configuration as read from `Projmk.toml`.
///
/// ```toml
/// [project]
/// package = "widget"
/// dist_tags = ["2", "3"]
///
/// [tools]
/// linter = "${PYTHON} -m flake8 ${SETUP_DIR}"
///
/// [vars]
/// AUTHOR = "Jane Doe"
///
/// [target.docker-test]
/// after = ["docker-base-test"]
/// cmd = ["echo extra checks"]
/// ```
///
/// Every section is optional; a project without a config file gets
/// `RawConfigFile::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub tools: ToolsSection,

    /// Extra template bindings.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Additional or overriding targets from `[target.<name>]`.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub tools: ToolsSection,
    pub vars: BTreeMap<String, String>,
    pub target: BTreeMap<String, TargetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        tools: ToolsSection,
        vars: BTreeMap<String, String>,
        target: BTreeMap<String, TargetConfig>,
    ) -> Self {
        Self {
            project,
            tools,
            vars,
            target,
        }
    }
}

/// `[project]` section. `None` means "derive it".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub package: Option<String>,
    pub main: Option<String>,
    pub runtime: Option<RuntimeTag>,
    /// Runtime tag that builds from the backport tree (default `2`).
    pub legacy_runtime: Option<RuntimeTag>,
    pub sources: Option<Vec<String>>,
    pub tests: Option<String>,
    pub dist_dir: Option<String>,
    pub backport_dir: Option<String>,
    /// Tags built by `dists`, in order (default `["2", "3"]`).
    pub dist_tags: Option<Vec<RuntimeTag>>,
    /// Shell snippets run by `script-test` and the dist smoke test.
    #[serde(default)]
    pub test_scripts: Vec<String>,
}

/// `[tools]` section: command templates for the external collaborators.
///
/// Unset entries fall back to the defaults in `exec::toolchain`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    pub python: Option<String>,
    pub linter: Option<String>,
    pub tox: Option<String>,
    pub import_test: Option<String>,
    pub test_runner: Option<String>,
    pub cli_test: Option<String>,
    pub backport: Option<String>,
    pub builder: Option<String>,
    pub dev_install: Option<String>,
    pub show: Option<String>,
    pub install: Option<String>,
    pub uninstall: Option<String>,
    /// Regex matched against uninstall output to detect "not installed".
    pub absent_pattern: Option<String>,
    pub signer: Option<String>,
    pub uploader: Option<String>,
    pub docker: Option<String>,
    pub artifact_pattern: Option<String>,
    pub test_repository: Option<String>,
    pub repository: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Shell commands run in order; a single string is accepted too.
    #[serde(default)]
    pub cmd: CommandList,

    /// Prerequisite targets, run first in this order.
    #[serde(default)]
    pub after: Vec<String>,

    /// If set, the target only runs when this path (relative to the project
    /// root) is missing or older than the project sources.
    #[serde(default)]
    pub output: Option<String>,
}

/// One command or a list of commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandList {
    One(String),
    Many(Vec<String>),
}

impl Default for CommandList {
    fn default() -> Self {
        CommandList::Many(Vec::new())
    }
}

impl CommandList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            CommandList::One(cmd) => vec![cmd],
            CommandList::Many(cmds) => cmds,
        }
    }
}
