// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod templates;
pub mod types;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{config_path, load_optional};
use crate::context::{Context, ContextResolver, Overrides};
use crate::exec::{probe_runtime, RealCommandBackend, Toolchain};
use crate::fs::{FileSystem, RealFileSystem};
use crate::graph::TargetGraph;
use crate::pipeline::Executor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and target graph validation
/// - runtime probing and context resolution
/// - the executor with the process-backed command backend
pub async fn run(args: CliArgs) -> Result<()> {
    let project_root = project_root(&args)?;
    let cfg = load_optional(config_path(&project_root, &args.config))?;

    // Graph errors are fatal before anything runs.
    let graph = TargetGraph::with_config(&cfg)?;
    if args.list {
        print_targets(&graph);
        return Ok(());
    }

    let mut toolchain = Toolchain::from_config(&cfg.tools)?;
    if let Some(secs) = args.timeout {
        toolchain.timeout = Some(Duration::from_secs(secs));
    }
    let mut backend = RealCommandBackend::new(toolchain.timeout);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let env: BTreeMap<String, String> = std::env::vars().collect();
    let resolver = ContextResolver::new(fs.as_ref(), &cfg)
        .with_env(&env)?
        .with_overrides(Overrides::from_pairs(&args.set)?);
    let resolver = if resolver.runtime_is_pinned() {
        debug!("runtime tag pinned; skipping interpreter probe");
        resolver
    } else {
        let reported = probe_runtime(&mut backend, &toolchain, &project_root).await;
        resolver.with_reported_runtime(reported)
    };
    let ctx = resolver.resolve(&project_root)?;

    let mut executor = Executor::new(graph, toolchain, fs.clone(), backend);
    if let Some(tags) = &cfg.project.dist_tags {
        executor = executor.with_dist_tags(tags.clone());
    }

    let targets = args.requested_targets();
    if args.dry_run {
        print_plan(&ctx, &executor.plan(&targets)?);
        return Ok(());
    }

    info!(package = %ctx.package_name, runtime = %ctx.runtime, ?targets, "starting pipeline");
    executor.run(&ctx, &targets).await?;
    Ok(())
}

fn project_root(args: &CliArgs) -> Result<PathBuf> {
    match &args.directory {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("resolving project directory {:?}", dir)),
        None => std::env::current_dir().context("reading current directory"),
    }
}

/// `--list` output: every target with its prerequisites.
fn print_targets(graph: &TargetGraph) {
    for target in graph.targets() {
        if target.prerequisites.is_empty() {
            println!("{}", target.name);
        } else {
            println!("{}: {}", target.name, target.prerequisites.join(" "));
        }
    }
}

/// `--dry-run` output: the resolved context and the execution order.
fn print_plan(ctx: &Context, plan: &[String]) {
    println!("projmk dry-run");
    println!("  package = {}", ctx.package_name);
    println!("  runtime = {}", ctx.runtime);
    println!("  setup_dir = {}", ctx.setup_dir.display());
    println!();
    println!("plan ({} targets):", plan.len());
    for (i, name) in plan.iter().enumerate() {
        println!("  {}. {name}", i + 1);
    }
    debug!("dry-run complete (no execution)");
}
