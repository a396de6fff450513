// src/context/resolver.rs

//! Layered resolution of a [`Context`].
//!
//! Priority for every value (later layers win):
//! 1. hard-coded defaults
//! 2. values derived from the working directory
//! 3. the runtime version reported by the active interpreter
//! 4. the `[project]` section of `Projmk.toml`
//! 5. environment overrides (`PKG`, `MAIN`, `PY`, `SRC_FILES`, `PROJMK_VAR_*`)
//! 6. `--set KEY=VALUE` overrides from the command line

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, ProjectSection};
use crate::context::{setup_dir_for, Context};
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::types::RuntimeTag;

const DEFAULT_LEGACY_RUNTIME: &str = "2";
const DEFAULT_DIST_DIR: &str = "dist";
const DEFAULT_BACKPORT_DIR: &str = "backport";
const DEFAULT_TESTS_DIR: &str = "tests";
const PROJECT_FILES: &[&str] = &["setup.py", "setup.cfg", "LICENSE.txt", "README.md"];

/// Prefix for environment variables that become extra template bindings.
pub const ENV_VAR_PREFIX: &str = "PROJMK_VAR_";

/// One layer of explicit overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub package: Option<String>,
    pub main: Option<String>,
    pub runtime: Option<RuntimeTag>,
    pub sources: Option<Vec<String>>,
    pub vars: BTreeMap<String, String>,
}

impl Overrides {
    /// Overrides recognised in the process environment.
    pub fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        let mut out = Overrides::default();
        for (key, value) in env {
            if let Some(name) = key.strip_prefix(ENV_VAR_PREFIX) {
                if !name.is_empty() {
                    out.vars.insert(name.to_string(), value.clone());
                }
                continue;
            }
            out.apply_known(key, value)?;
        }
        Ok(out)
    }

    /// Overrides from `KEY=VALUE` pairs. Unknown keys become extra bindings.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut out = Overrides::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PipelineError::ConfigError(format!("expected KEY=VALUE, got '{pair}'"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(PipelineError::ConfigError(format!(
                    "empty key in override '{pair}'"
                )));
            }
            if !out.apply_known(key, value)? {
                out.vars.insert(key.to_string(), value.to_string());
            }
        }
        Ok(out)
    }

    fn from_project(project: &ProjectSection, vars: &BTreeMap<String, String>) -> Self {
        Overrides {
            package: project.package.clone(),
            main: project.main.clone(),
            runtime: project.runtime.clone(),
            sources: project.sources.clone(),
            vars: vars.clone(),
        }
    }

    /// Apply a recognised key; returns `false` for keys this layer ignores.
    fn apply_known(&mut self, key: &str, value: &str) -> Result<bool> {
        let value = value.trim();
        match key {
            "PKG" if !value.is_empty() => self.package = Some(value.to_string()),
            "MAIN" if !value.is_empty() => self.main = Some(value.to_string()),
            "PY" if !value.is_empty() => {
                let tag = value.parse::<RuntimeTag>().map_err(PipelineError::ConfigError)?;
                self.runtime = Some(tag);
            }
            "SRC_FILES" if !value.is_empty() => self.sources = Some(split_list(value)),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Collects the resolution layers and produces a [`Context`].
#[derive(Debug)]
pub struct ContextResolver<'a> {
    fs: &'a dyn FileSystem,
    project: ProjectSection,
    config_layer: Overrides,
    reported_runtime: Option<RuntimeTag>,
    env_layer: Overrides,
    cli_layer: Overrides,
}

impl<'a> ContextResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &ConfigFile) -> Self {
        Self {
            fs,
            project: config.project.clone(),
            config_layer: Overrides::from_project(&config.project, &config.vars),
            reported_runtime: None,
            env_layer: Overrides::default(),
            cli_layer: Overrides::default(),
        }
    }

    pub fn with_reported_runtime(mut self, tag: Option<RuntimeTag>) -> Self {
        self.reported_runtime = tag;
        self
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Result<Self> {
        self.env_layer = Overrides::from_env(env)?;
        Ok(self)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.cli_layer = overrides;
        self
    }

    /// True if some explicit layer pins the runtime tag, so probing the
    /// interpreter is unnecessary.
    pub fn runtime_is_pinned(&self) -> bool {
        self.config_layer.runtime.is_some()
            || self.env_layer.runtime.is_some()
            || self.cli_layer.runtime.is_some()
    }

    pub fn resolve(&self, cwd: &Path) -> Result<Context> {
        let layers = [&self.config_layer, &self.env_layer, &self.cli_layer];
        let pick = |f: fn(&Overrides) -> Option<String>| layers.iter().rev().find_map(|l| f(*l));

        // Layers 1 + 2: defaults and cwd-derived values.
        let dir_name = cwd
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::ConfigError(format!(
                    "cannot derive a package name from {:?}",
                    cwd
                ))
            });

        let package_name = match pick(|l| l.package.clone()) {
            Some(pkg) => pkg,
            None => dir_name?,
        };
        let main_module = pick(|l| l.main.clone()).unwrap_or_else(|| package_name.clone());

        // Layer 3: reported runtime, then explicit layers.
        let runtime = layers
            .iter()
            .rev()
            .find_map(|l| l.runtime.clone())
            .or_else(|| self.reported_runtime.clone())
            .unwrap_or_default();

        let legacy_runtime = match &self.project.legacy_runtime {
            Some(tag) => tag.clone(),
            None => RuntimeTag::new(DEFAULT_LEGACY_RUNTIME).map_err(PipelineError::ConfigError)?,
        };

        let tests_name = self.project.tests.as_deref().unwrap_or(DEFAULT_TESTS_DIR);
        let tests_path = cwd.join(tests_name);
        let tests_dir = self.fs.is_dir(&tests_path).then_some(tests_path);

        let source_files = layers
            .iter()
            .rev()
            .find_map(|l| l.sources.clone())
            .unwrap_or_else(|| {
                let mut files = vec![package_name.clone()];
                if tests_dir.is_some() {
                    files.push(tests_name.to_string());
                }
                files.extend(PROJECT_FILES.iter().map(|s| s.to_string()));
                files
            });

        let backport_dir = cwd.join(
            self.project
                .backport_dir
                .as_deref()
                .unwrap_or(DEFAULT_BACKPORT_DIR),
        );
        let dist_dir = cwd.join(self.project.dist_dir.as_deref().unwrap_or(DEFAULT_DIST_DIR));
        let setup_dir = setup_dir_for(cwd, &backport_dir, &runtime, &legacy_runtime);

        let mut extra = BTreeMap::new();
        for layer in layers {
            extra.extend(layer.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let ctx = Context {
            cwd: cwd.to_path_buf(),
            package_name,
            main_module,
            runtime,
            legacy_runtime,
            setup_dir,
            backport_dir,
            dist_dir,
            tests_dir,
            source_files,
            test_scripts: self.project.test_scripts.clone(),
            extra,
        };

        debug!(
            package = %ctx.package_name,
            runtime = %ctx.runtime,
            setup_dir = ?ctx.setup_dir,
            "resolved context"
        );
        Ok(ctx)
    }
}

/// Resolve a context from the working directory and environment alone.
pub fn resolve(
    cwd: &Path,
    env: &BTreeMap<String, String>,
    fs: &dyn FileSystem,
) -> Result<Context> {
    ContextResolver::new(fs, &ConfigFile::default())
        .with_env(env)?
        .resolve(cwd)
}
