// src/pipeline/actions.rs

//! Bodies of the built-in targets.
//!
//! Each step renders its collaborator template strictly against the
//! context bindings, runs it through the backend and maps a failing exit
//! status to [`PipelineError::TargetFailed`].

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::errors::{PipelineError, Result};
use crate::exec::{Collaborator, CommandBackend, CommandOutput, CommandSpec};
use crate::graph::{Action, Step, Target};
use crate::pipeline::executor::{Executor, Invocation};
use crate::templates::Bindings;
use crate::types::{Repository, UninstallOutcome};

/// Entries removed by `clean`, relative to the project root.
const CLEAN_ENTRIES: &[&str] = &[".pytest_cache", ".cache", "dist", "build", "backport"];
const CLEAN_GLOBS: &[&str] = &["*.egg-info"];
/// Bytecode caches swept from the whole project tree by `clean`.
const BYTECODE_GLOBS: &[&str] = &["__pycache__", "*.pyc", "*.pyo"];
/// Bindings expanded when scaffolding; pipeline-time ones stay as written.
const SCAFFOLD_KEYS: &[&str] = &["PKG", "MAIN", "AUTHOR"];

impl<B: CommandBackend> Executor<B> {
    pub(crate) async fn run_action(&mut self, inv: &mut Invocation<'_>, target: &Target) -> Result<()> {
        let ctx = inv.ctx;
        let name = target.name.as_str();
        match &target.action {
            Action::Noop => Ok(()),
            Action::Shell(commands) => {
                let bindings = ctx.bindings();
                for command in commands {
                    let command = self.toolchain.render(command, &bindings)?;
                    self.require(name, Collaborator::Shell, command, ctx, &ctx.cwd).await?;
                }
                Ok(())
            }
            Action::Step(step) => match step {
                Step::CheckSources => self.check_sources(ctx, name),
                Step::PrintVars => {
                    print_vars(ctx);
                    Ok(())
                }
                Step::Lint => self.lint(ctx, name).await,
                Step::Tox => self.tox(ctx, name).await,
                Step::BaseTest => self.base_test(ctx, name).await,
                Step::ScriptTest => self.script_test(ctx, name).await,
                Step::Clean => self.clean(ctx),
                Step::Backport => self.backport(ctx, name).await,
                Step::PrepareSetupDir => self.prepare_setup_dir(ctx, name).await,
                Step::DevInstall => self.dev_install(ctx, name).await,
                Step::Dist => self.dist(ctx, name).await,
                Step::DistInstall => self.dist_install(ctx, name).await,
                Step::Uninstall => self.uninstall(ctx, name).await.map(|_| ()),
                Step::DistBaseTest => self.dist_base_test(ctx, name).await,
                Step::BuildAllDists => self.build_all(inv, name).await,
                Step::Sign => self.sign(ctx, name).await,
                Step::Upload(repo) => self.upload(ctx, name, *repo).await,
                Step::DockerTest => self.docker_test(ctx, name).await,
                Step::Scaffold => self.scaffold(ctx),
            },
        }
    }

    /// Run a rendered command and return its output, whatever the status.
    ///
    /// A command that cannot be run at all (spawn failure, timeout) is a
    /// failure of its collaborator.
    pub(crate) async fn call(
        &mut self,
        target: &str,
        collaborator: Collaborator,
        command: String,
        ctx: &Context,
        cwd: &Path,
    ) -> Result<CommandOutput> {
        let spec = CommandSpec {
            collaborator,
            command,
            cwd: cwd.to_path_buf(),
            env: vec![("PY_TAG".to_string(), ctx.runtime.label())],
        };
        self.backend
            .run(spec)
            .await
            .map_err(|e| PipelineError::TargetFailed {
                target: target.to_string(),
                collaborator: collaborator.to_string(),
                diagnostic: e.to_string(),
            })
    }

    /// Like [`Self::call`], but a non-zero exit status fails the target.
    pub(crate) async fn require(
        &mut self,
        target: &str,
        collaborator: Collaborator,
        command: String,
        ctx: &Context,
        cwd: &Path,
    ) -> Result<CommandOutput> {
        let output = self.call(target, collaborator, command, ctx, cwd).await?;
        if !output.is_success() {
            return Err(PipelineError::TargetFailed {
                target: target.to_string(),
                collaborator: collaborator.to_string(),
                diagnostic: output.diagnostic(),
            });
        }
        Ok(output)
    }

    fn check_sources(&self, ctx: &Context, target: &str) -> Result<()> {
        for path in ctx.source_paths() {
            if !self.fs.exists(&path) {
                return Err(PipelineError::MissingSource {
                    target: target.to_string(),
                    path,
                });
            }
        }
        debug!(count = ctx.source_files.len(), "all sources present");
        Ok(())
    }

    async fn lint(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let command = self.toolchain.render(&self.toolchain.linter, &ctx.bindings())?;
        self.require(target, Collaborator::Linter, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    async fn tox(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let command = self.toolchain.render(&self.toolchain.tox, &ctx.bindings())?;
        self.require(target, Collaborator::Tox, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    /// Import test, test suite and CLI test; the first failure aborts.
    async fn base_test(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let bindings = ctx.bindings();
        let import = self.toolchain.render(&self.toolchain.import_test, &bindings)?;
        let suite = self.toolchain.render(&self.toolchain.test_runner, &bindings)?;
        let cli = self.toolchain.render(&self.toolchain.cli_test, &bindings)?;

        self.require(target, Collaborator::ImportTest, import, ctx, &ctx.cwd).await?;
        self.require(target, Collaborator::TestRunner, suite, ctx, &ctx.cwd).await?;
        self.require(target, Collaborator::CliTest, cli, ctx, &ctx.cwd).await?;
        Ok(())
    }

    async fn script_test(&mut self, ctx: &Context, target: &str) -> Result<()> {
        if ctx.test_scripts.is_empty() {
            info!("no test scripts configured");
            return Ok(());
        }
        let bindings = ctx.bindings();
        for script in &ctx.test_scripts {
            let command = self.toolchain.render(script, &bindings)?;
            self.require(target, Collaborator::TestScript, command, ctx, &ctx.cwd).await?;
        }
        Ok(())
    }

    /// Remove build byproducts. Entries that do not exist are fine.
    fn clean(&self, ctx: &Context) -> Result<()> {
        let mut paths: Vec<PathBuf> = CLEAN_ENTRIES.iter().map(|e| ctx.cwd.join(e)).collect();
        for dir in [&ctx.dist_dir, &ctx.backport_dir] {
            if !paths.contains(dir) {
                paths.push(dir.clone());
            }
        }

        if self.fs.is_dir(&ctx.cwd) {
            let globs = build_globset(CLEAN_GLOBS)?;
            for entry in self.fs.read_dir(&ctx.cwd)? {
                let matched = entry.file_name().is_some_and(|n| globs.is_match(n));
                if matched {
                    paths.push(entry);
                }
            }
        }

        for path in paths {
            if self.fs.remove_all(&path)? {
                info!(path = ?path, "removed");
            }
        }

        if self.fs.is_dir(&ctx.cwd) {
            let bytecode = build_globset(BYTECODE_GLOBS)?;
            let removed = self.sweep(&ctx.cwd, &bytecode)?;
            if removed > 0 {
                info!(count = removed, "removed bytecode caches");
            }
        }
        Ok(())
    }

    /// Recursively remove entries under `dir` whose name matches `set`.
    /// Hidden directories are not entered.
    fn sweep(&self, dir: &Path, set: &GlobSet) -> Result<usize> {
        let mut removed = 0;
        for entry in self.fs.read_dir(dir)? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            if set.is_match(name) {
                if self.fs.remove_all(&entry)? {
                    debug!(path = ?entry, "removed");
                    removed += 1;
                }
            } else if self.fs.is_dir(&entry) && !name.to_string_lossy().starts_with('.') {
                removed += self.sweep(&entry, set)?;
            }
        }
        Ok(removed)
    }

    /// Regenerate the backport tree; the transformer must actually create it.
    pub(crate) async fn backport(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let command = self.toolchain.render(&self.toolchain.backport, &ctx.bindings())?;
        self.require(target, Collaborator::Backport, command, ctx, &ctx.cwd).await?;

        if !self.fs.exists(&ctx.backport_dir) {
            return Err(PipelineError::TargetFailed {
                target: target.to_string(),
                collaborator: Collaborator::Backport.to_string(),
                diagnostic: format!("reported success but did not create {:?}", ctx.backport_dir),
            });
        }
        Ok(())
    }

    async fn prepare_setup_dir(&mut self, ctx: &Context, target: &str) -> Result<()> {
        if ctx.uses_backport() {
            return self.backport(ctx, target).await;
        }
        debug!(setup_dir = ?ctx.setup_dir, "setup dir is the project root");
        Ok(())
    }

    async fn dev_install(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let bindings = ctx.bindings();
        let install = self.toolchain.render(&self.toolchain.dev_install, &bindings)?;
        let show = self.toolchain.render(&self.toolchain.show, &bindings)?;

        self.require(target, Collaborator::InstallClient, install, ctx, &ctx.setup_dir)
            .await?;
        self.require(target, Collaborator::InstallClient, show, ctx, &ctx.cwd).await?;

        if ctx.uses_backport() {
            warn!(
                package = %ctx.package_name,
                "installed the backport tree; run the backport target again after editing sources"
            );
        }
        Ok(())
    }

    /// Build the artifact for the context's runtime tag and check that the
    /// builder actually wrote it. A matching file left over from an earlier
    /// build does not count.
    async fn dist(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let (_, before) = self.matching_artifacts(ctx)?;
        let command = self.toolchain.render(&self.toolchain.builder, &ctx.bindings())?;
        self.require(target, Collaborator::Builder, command, ctx, &ctx.setup_dir).await?;

        let (pattern, after) = self.matching_artifacts(ctx)?;
        let written = after
            .into_iter()
            .filter(|(mtime, path)| {
                !before
                    .iter()
                    .any(|(old, old_path)| old_path == path && old >= mtime)
            })
            .max_by_key(|(mtime, _)| *mtime);
        match written {
            Some((_, artifact)) => {
                info!(artifact = ?artifact, "built artifact");
                Ok(())
            }
            None => Err(PipelineError::ArtifactNotFound {
                target: target.to_string(),
                pattern,
                dir: ctx.dist_dir.clone(),
            }),
        }
    }

    async fn dist_install(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let artifact = self.find_artifact(ctx, target)?;
        let mut bindings = ctx.bindings();
        bindings.insert("ARTIFACT".into(), artifact.to_string_lossy().into_owned());
        let command = self.toolchain.render(&self.toolchain.install, &bindings)?;
        self.require(target, Collaborator::InstallClient, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    /// Remove the installed package. "Not installed" is a benign outcome.
    pub(crate) async fn uninstall(&mut self, ctx: &Context, target: &str) -> Result<UninstallOutcome> {
        let command = self.toolchain.render(&self.toolchain.uninstall, &ctx.bindings())?;
        let output = self
            .call(target, Collaborator::InstallClient, command, ctx, &ctx.cwd)
            .await?;

        if output.is_success() {
            return Ok(UninstallOutcome::Removed);
        }
        let combined = format!("{}\n{}", output.stdout, output.stderr);
        if self.toolchain.reports_absence(&combined) {
            info!(package = %ctx.package_name, "package was not installed");
            return Ok(UninstallOutcome::AlreadyAbsent);
        }
        Err(PipelineError::TargetFailed {
            target: target.to_string(),
            collaborator: Collaborator::InstallClient.to_string(),
            diagnostic: output.diagnostic(),
        })
    }

    /// Test suite from the tests dir, then import and CLI smoke tests plus
    /// the configured test scripts from a neutral directory, against the
    /// installed package.
    async fn dist_base_test(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let bindings = ctx.bindings();
        match &ctx.tests_dir {
            Some(tests) => {
                let suite = self.toolchain.render(&self.toolchain.test_runner, &bindings)?;
                self.require(target, Collaborator::TestRunner, suite, ctx, tests).await?;
            }
            None => info!("no tests directory; skipping test suite"),
        }

        let neutral = std::env::temp_dir();
        let import = self.toolchain.render(&self.toolchain.import_test, &bindings)?;
        let cli = self.toolchain.render(&self.toolchain.cli_test, &bindings)?;
        self.require(target, Collaborator::ImportTest, import, ctx, &neutral).await?;
        self.require(target, Collaborator::CliTest, cli, ctx, &neutral).await?;
        for script in &ctx.test_scripts {
            let command = self.toolchain.render(script, &bindings)?;
            self.require(target, Collaborator::TestScript, command, ctx, &neutral).await?;
        }
        Ok(())
    }

    async fn sign(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let artifact = self.find_artifact(ctx, target)?;
        let mut bindings = ctx.bindings();
        bindings.insert("ARTIFACT".into(), artifact.to_string_lossy().into_owned());
        let command = self.toolchain.render(&self.toolchain.signer, &bindings)?;
        self.require(target, Collaborator::Signer, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    /// Upload everything in the output directory, signatures included.
    async fn upload(&mut self, ctx: &Context, target: &str, repo: Repository) -> Result<()> {
        let files: Vec<String> = if self.fs.is_dir(&ctx.dist_dir) {
            self.fs
                .read_dir(&ctx.dist_dir)?
                .into_iter()
                .filter(|p| self.fs.is_file(p))
                .map(|p| p.to_string_lossy().into_owned())
                .collect()
        } else {
            Vec::new()
        };
        if files.is_empty() {
            return Err(PipelineError::ArtifactNotFound {
                target: target.to_string(),
                pattern: "*".to_string(),
                dir: ctx.dist_dir.clone(),
            });
        }

        let repository = match repo {
            Repository::Test => self.toolchain.test_repository.clone(),
            Repository::Production => self.toolchain.repository.clone(),
        };
        let mut bindings = ctx.bindings();
        bindings.insert("REPOSITORY".into(), repository.clone());
        bindings.insert("ARTIFACTS".into(), files.join(" "));
        let command = self.toolchain.render(&self.toolchain.uploader, &bindings)?;

        info!(repository = %repository, files = files.len(), "uploading");
        self.require(target, Collaborator::Uploader, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    /// Install and smoke-test the released package inside a container. The
    /// configured test scripts run there too, via `${TEST_SCRIPTS}`.
    async fn docker_test(&mut self, ctx: &Context, target: &str) -> Result<()> {
        let mut bindings = ctx.bindings();
        let scripts = ctx
            .test_scripts
            .iter()
            .map(|script| self.toolchain.render(script, &bindings))
            .collect::<Result<Vec<_>>>()?;
        let scripts = if scripts.is_empty() {
            "true".to_string()
        } else {
            scripts.join("; ")
        };
        bindings.insert("TEST_SCRIPTS".into(), scripts);
        let command = self.toolchain.render(&self.toolchain.docker, &bindings)?;
        self.require(target, Collaborator::Container, command, ctx, &ctx.cwd).await?;
        Ok(())
    }

    /// Write every registry artifact into the project root, keeping files
    /// that already exist.
    fn scaffold(&self, ctx: &Context) -> Result<()> {
        let bindings: Bindings = ctx
            .bindings()
            .into_iter()
            .filter(|(k, _)| SCAFFOLD_KEYS.contains(&k.as_str()) || ctx.extra.contains_key(k))
            .collect();
        for name in self.registry.list() {
            let path = ctx.cwd.join(name);
            if self.fs.exists(&path) {
                info!(path = ?path, "exists; keeping it");
                continue;
            }
            let content = self.registry.render(name, &bindings)?;
            self.fs.write(&path, content.as_bytes())?;
            info!(path = ?path, "created");
        }
        Ok(())
    }

    /// Newest artifact in the output directory matching the context's tag.
    pub(crate) fn find_artifact(&self, ctx: &Context, target: &str) -> Result<PathBuf> {
        let (pattern, matches) = self.matching_artifacts(ctx)?;
        matches
            .into_iter()
            .max_by_key(|(mtime, _)| *mtime)
            .map(|(_, path)| path)
            .ok_or_else(|| PipelineError::ArtifactNotFound {
                target: target.to_string(),
                pattern,
                dir: ctx.dist_dir.clone(),
            })
    }

    /// Rendered artifact pattern plus every matching file with its mtime.
    fn matching_artifacts(&self, ctx: &Context) -> Result<(String, Vec<(SystemTime, PathBuf)>)> {
        let pattern = self.toolchain.render(&self.toolchain.artifact_pattern, &ctx.bindings())?;
        let matcher = compile_glob(&pattern)?;
        if !self.fs.is_dir(&ctx.dist_dir) {
            return Ok((pattern, Vec::new()));
        }

        let mut matches = Vec::new();
        for entry in self.fs.read_dir(&ctx.dist_dir)? {
            let matched = entry.file_name().is_some_and(|n| matcher.is_match(n));
            if !matched || !self.fs.is_file(&entry) {
                continue;
            }
            matches.push((self.fs.modified(&entry)?, entry));
        }
        Ok((pattern, matches))
    }
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| PipelineError::ConfigError(format!("invalid glob '{pattern}': {e}")))
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| PipelineError::ConfigError(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PipelineError::ConfigError(format!("invalid glob set: {e}")))
}

fn print_vars(ctx: &Context) {
    for (key, value) in ctx.bindings() {
        println!("{key:<12} {value}");
    }
}
