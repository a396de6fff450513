#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use projmk::config::{CommandList, ConfigFile, RawConfigFile, TargetConfig};
use projmk::context::Context;
use projmk::fs::mock::MockFileSystem;
use projmk::types::RuntimeTag;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.config.target.insert(name.to_string(), target);
        self
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.config.project.package = Some(package.to_string());
        self
    }

    pub fn with_runtime(mut self, tag: &str) -> Self {
        self.config.project.runtime = Some(tag.parse().expect("valid runtime tag"));
        self
    }

    pub fn with_dist_tags(mut self, tags: &[&str]) -> Self {
        let tags = tags
            .iter()
            .map(|t| t.parse().expect("valid runtime tag"))
            .collect();
        self.config.project.dist_tags = Some(tags);
        self
    }

    pub fn with_test_script(mut self, script: &str) -> Self {
        self.config.project.test_scripts.push(script.to_string());
        self
    }

    pub fn with_linter(mut self, template: &str) -> Self {
        self.config.tools.linter = Some(template.to_string());
        self
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.config.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            target: TargetConfig {
                cmd: CommandList::One(cmd.to_string()),
                ..TargetConfig::default()
            },
        }
    }

    /// A target with no commands of its own.
    pub fn aggregate() -> Self {
        Self {
            target: TargetConfig::default(),
        }
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.target.after = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.target.output = Some(path.to_string());
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}

/// Builder for a resolved `Context`, rooted at an absolute project path.
pub struct ContextBuilder {
    ctx: Context,
}

impl ContextBuilder {
    /// Context for package `widget` at `root`, runtime `3`, with the
    /// default source set of [`populate_project`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            ctx: Context {
                cwd: root.clone(),
                package_name: "widget".into(),
                main_module: "widget".into(),
                runtime: RuntimeTag::default(),
                legacy_runtime: RuntimeTag::new("2").expect("valid runtime tag"),
                setup_dir: root.clone(),
                backport_dir: root.join("backport"),
                dist_dir: root.join("dist"),
                tests_dir: Some(root.join("tests")),
                source_files: default_sources("widget"),
                test_scripts: Vec::new(),
                extra: BTreeMap::new(),
            },
        }
    }

    pub fn runtime(mut self, tag: &str) -> Self {
        let tag: RuntimeTag = tag.parse().expect("valid runtime tag");
        self.ctx = self.ctx.with_runtime(tag);
        self
    }

    pub fn sources(mut self, files: &[&str]) -> Self {
        self.ctx.source_files = files.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn test_scripts(mut self, scripts: &[&str]) -> Self {
        self.ctx.test_scripts = scripts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.ctx.extra.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Context {
        self.ctx
    }
}

fn default_sources(package: &str) -> Vec<String> {
    [package, "tests", "setup.py", "setup.cfg", "LICENSE.txt", "README.md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Lay out a minimal `widget` project under `root` in the mock filesystem.
pub fn populate_project(fs: &MockFileSystem, root: impl AsRef<Path>) -> PathBuf {
    let root = root.as_ref().to_path_buf();
    fs.add_file(root.join("widget/__init__.py"), "__version__ = '0.1.0'\n");
    fs.add_file(root.join("widget/__main__.py"), "print('widget')\n");
    fs.add_file(root.join("tests/test_widget.py"), "def test_ok(): pass\n");
    for name in ["setup.py", "setup.cfg", "LICENSE.txt", "README.md"] {
        fs.add_file(root.join(name), "");
    }
    root
}
