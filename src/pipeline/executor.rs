// src/pipeline/executor.rs

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::context::Context;
use crate::errors::Result;
use crate::exec::{CommandBackend, Toolchain};
use crate::fs::FileSystem;
use crate::graph::{Freshness, TargetGraph, TargetName};
use crate::pipeline::freshness::is_fresh;
use crate::templates::TemplateRegistry;
use crate::types::RuntimeTag;

/// Targets that ran and targets that were skipped as up to date, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Per-invocation state: the memo of completed targets and what was
/// rebuilt, shared by every target requested on one command line.
pub(crate) struct Invocation<'c> {
    pub(crate) ctx: &'c Context,
    completed: HashSet<TargetName>,
    /// File-backed targets whose action ran in this invocation.
    rebuilt: HashSet<TargetName>,
    pub(crate) report: RunReport,
}

impl<'c> Invocation<'c> {
    fn new(ctx: &'c Context) -> Self {
        Self {
            ctx,
            completed: HashSet::new(),
            rebuilt: HashSet::new(),
            report: RunReport::default(),
        }
    }
}

/// Runs targets of a [`TargetGraph`] against a resolved [`Context`].
///
/// Strictly sequential: each collaborator command is awaited before the
/// next one starts, and the first failure ends the run.
pub struct Executor<B: CommandBackend> {
    pub(crate) graph: TargetGraph,
    pub(crate) toolchain: Toolchain,
    pub(crate) registry: TemplateRegistry,
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) backend: B,
    pub(crate) dist_tags: Vec<RuntimeTag>,
}

impl<B: CommandBackend> Executor<B> {
    pub fn new(graph: TargetGraph, toolchain: Toolchain, fs: Arc<dyn FileSystem>, backend: B) -> Self {
        Self {
            graph,
            toolchain,
            registry: TemplateRegistry::builtin(),
            fs,
            backend,
            dist_tags: default_dist_tags(),
        }
    }

    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Runtime tags built by `dists`, in order.
    pub fn with_dist_tags(mut self, tags: Vec<RuntimeTag>) -> Self {
        self.dist_tags = tags;
        self
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Execution order for `targets` without running anything.
    pub fn plan<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<TargetName>> {
        let mut order: Vec<TargetName> = Vec::new();
        for target in targets {
            for name in self.graph.closure(target.as_ref())? {
                if !order.contains(&name) {
                    order.push(name);
                }
            }
        }
        Ok(order)
    }

    /// Run the requested targets in order, sharing one memo.
    ///
    /// Unknown target names are rejected before any action runs.
    pub async fn run<S: AsRef<str>>(&mut self, ctx: &Context, targets: &[S]) -> Result<RunReport> {
        for target in targets {
            self.graph.get(target.as_ref())?;
        }
        let targets: Vec<TargetName> = targets.iter().map(|t| t.as_ref().to_string()).collect();
        let report = self.run_in(ctx, targets).await?;
        info!(
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            "pipeline finished"
        );
        Ok(report)
    }

    /// Run targets in a fresh invocation. Boxed because `dists` re-enters
    /// the executor for every runtime tag.
    pub(crate) fn run_in<'a>(
        &'a mut self,
        ctx: &'a Context,
        targets: Vec<TargetName>,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + 'a>> {
        Box::pin(async move {
            let mut inv = Invocation::new(ctx);
            for target in &targets {
                for name in self.graph.closure(target)? {
                    self.run_target(&mut inv, &name).await?;
                }
            }
            Ok(inv.report)
        })
    }

    async fn run_target(&mut self, inv: &mut Invocation<'_>, name: &str) -> Result<()> {
        if inv.completed.contains(name) {
            debug!(name, "already completed in this invocation");
            return Ok(());
        }

        let target = self.graph.get(name)?.clone();

        if let Freshness::IfStale(output) = &target.freshness {
            let path = output.resolve(inv.ctx);
            if is_fresh(self.fs.as_ref(), inv.ctx, &target, &path, &inv.rebuilt)? {
                info!(name, path = ?path, "up to date");
                inv.completed.insert(target.name.clone());
                inv.report.skipped.push(target.name.clone());
                return Ok(());
            }
        }

        info!(name, runtime = %inv.ctx.runtime, "running target");
        if let Err(e) = self.run_action(inv, &target).await {
            error!(name, error = %e, "target failed");
            return Err(e.in_target(name));
        }

        inv.completed.insert(target.name.clone());
        if target.is_file_backed() {
            inv.rebuilt.insert(target.name.clone());
        }
        inv.report.executed.push(target.name);
        Ok(())
    }
}

fn default_dist_tags() -> Vec<RuntimeTag> {
    ["2", "3"]
        .iter()
        .filter_map(|t| RuntimeTag::new(*t).ok())
        .collect()
}
