// src/context/mod.rs

//! Per-invocation configuration values.
//!
//! [`Context`] is resolved once per pipeline invocation by
//! [`resolver::ContextResolver`] and handed read-only to every target
//! action. Actions never branch on the runtime tag themselves; they consume
//! [`Context::setup_dir`], which already points at the backport tree for the
//! legacy runtime.

pub mod resolver;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::templates::Bindings;
use crate::types::RuntimeTag;

pub use resolver::{resolve, ContextResolver, Overrides};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Project root.
    pub cwd: PathBuf,
    pub package_name: String,
    pub main_module: String,
    pub runtime: RuntimeTag,
    pub legacy_runtime: RuntimeTag,
    /// Directory the package builder runs in: `cwd`, or the backport tree
    /// when `runtime == legacy_runtime`.
    pub setup_dir: PathBuf,
    pub backport_dir: PathBuf,
    /// Shared output directory for built artifacts of every runtime tag.
    pub dist_dir: PathBuf,
    /// Test directory, if the project has one.
    pub tests_dir: Option<PathBuf>,
    /// Source-file set, relative to `cwd`.
    pub source_files: Vec<String>,
    pub test_scripts: Vec<String>,
    /// Extra template bindings; applied last, so they may shadow derived ones.
    pub extra: BTreeMap<String, String>,
}

impl Context {
    /// Whether builds for this context come from the backport tree.
    pub fn uses_backport(&self) -> bool {
        self.runtime == self.legacy_runtime
    }

    /// Same project, different runtime tag. `setup_dir` follows the tag.
    pub fn with_runtime(&self, runtime: RuntimeTag) -> Context {
        let mut ctx = self.clone();
        ctx.runtime = runtime;
        ctx.setup_dir = setup_dir_for(&ctx.cwd, &ctx.backport_dir, &ctx.runtime, &ctx.legacy_runtime);
        ctx
    }

    /// Absolute paths of the source-file set.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.source_files.iter().map(|s| self.cwd.join(s)).collect()
    }

    /// Template bindings for command lines and scaffolded files.
    pub fn bindings(&self) -> Bindings {
        let python = self.runtime.interpreter();
        let mut b = Bindings::new();
        b.insert("CURDIR".into(), display(&self.cwd));
        b.insert("PKG".into(), self.package_name.clone());
        b.insert("MAIN".into(), self.main_module.clone());
        b.insert("PY".into(), self.runtime.major().to_string());
        b.insert("PY_TAG".into(), self.runtime.label());
        b.insert("PIP".into(), format!("{python} -m pip"));
        b.insert("PYTHON".into(), python);
        b.insert("SETUP_DIR".into(), display(&self.setup_dir));
        b.insert("BACKPORT_DIR".into(), display(&self.backport_dir));
        b.insert("DIST_DIR".into(), display(&self.dist_dir));
        b.insert(
            "TESTS".into(),
            self.tests_dir.as_deref().map(display).unwrap_or_default(),
        );
        b.insert("SRC_FILES".into(), self.source_files.join(" "));
        b.insert("AUTHOR".into(), format!("The {} authors", self.package_name));

        for (k, v) in &self.extra {
            b.insert(k.clone(), v.clone());
        }
        b
    }
}

pub(crate) fn setup_dir_for(
    cwd: &Path,
    backport_dir: &Path,
    runtime: &RuntimeTag,
    legacy: &RuntimeTag,
) -> PathBuf {
    if runtime == legacy {
        backport_dir.to_path_buf()
    } else {
        cwd.to_path_buf()
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
