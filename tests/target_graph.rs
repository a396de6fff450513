// tests/target_graph.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TargetConfigBuilder};
use crate::common::Fixture;

use projmk::errors::PipelineError;
use projmk::exec::Collaborator;
use projmk::fs::FileSystem;
use projmk::graph::TargetGraph;

#[test]
fn standard_graph_is_valid_and_lists_every_builtin() {
    let graph = TargetGraph::standard().unwrap();
    for name in [
        "default", "lint", "tox", "vars", "base-test", "script-test", "clean", "dev-install",
        "backport", "dist", "dist-install", "dist-uninstall", "dist-reinstall", "dists", "sign",
        "test-publish", "publish", "install", "uninstall", "docker-base-test", "docker-test",
        "sources", "setup-dir", "dist-test", "dist-base-test", "scaffold",
    ] {
        assert!(graph.contains(name), "missing built-in target {name}");
    }
}

#[test]
fn config_cycle_is_a_graph_error() {
    let cfg = ConfigFileBuilder::new()
        .with_target("a", TargetConfigBuilder::new("echo a").after(&["b"]).build())
        .with_target("b", TargetConfigBuilder::new("echo b").after(&["a"]).build())
        .build();

    let err = TargetGraph::with_config(&cfg).unwrap_err();

    assert!(matches!(err, PipelineError::Cycle(_)));
    assert!(err.is_graph_error());
}

#[test]
fn config_self_dependency_and_dangling_edge_are_rejected() {
    let cfg = ConfigFileBuilder::new()
        .with_target("loop", TargetConfigBuilder::new("true").after(&["loop"]).build())
        .build();
    assert!(matches!(
        TargetGraph::with_config(&cfg),
        Err(PipelineError::SelfDependency(name)) if name == "loop"
    ));

    let cfg = ConfigFileBuilder::new()
        .with_target("docs", TargetConfigBuilder::new("true").after(&["build-docs"]).build())
        .build();
    assert!(matches!(
        TargetGraph::with_config(&cfg),
        Err(PipelineError::UnknownPrerequisite { target, prerequisite })
            if target == "docs" && prerequisite == "build-docs"
    ));
}

#[test]
fn cycle_through_a_builtin_is_detected() {
    // `test` -> `lint`, and now `lint` -> `test`.
    let cfg = ConfigFileBuilder::new()
        .with_target("lint", TargetConfigBuilder::new("flake8").after(&["test"]).build())
        .build();
    assert!(TargetGraph::with_config(&cfg).unwrap_err().is_graph_error());
}

#[tokio::test]
async fn config_target_replaces_the_builtin() {
    let fx = Fixture::new();
    let cfg = ConfigFileBuilder::new()
        .with_target(
            "test",
            TargetConfigBuilder::new("${PYTHON} -m pytest -q").after(&["sources"]).build(),
        )
        .build();
    let mut exec = fx.executor_with(TargetGraph::with_config(&cfg).unwrap());

    let report = exec.run(&fx.ctx(), &["test"]).await.unwrap();

    assert_eq!(report.executed, vec!["sources", "test"]);
    let calls = fx.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].collaborator, Collaborator::Shell);
    assert_eq!(calls[0].command, "python3 -m pytest -q");
}

#[tokio::test]
async fn config_target_can_extend_the_graph() {
    let fx = Fixture::new();
    let cfg = ConfigFileBuilder::new()
        .with_target(
            "docker-test",
            TargetConfigBuilder::new("docker run --rm python:${PY} ${PYTHON} -m ${MAIN} --help")
                .after(&["docker-base-test"])
                .build(),
        )
        .with_target("release", TargetConfigBuilder::aggregate().after(&["docker-test"]).build())
        .build();
    let mut exec = fx.executor_with(TargetGraph::with_config(&cfg).unwrap());

    let report = exec.run(&fx.ctx(), &["release"]).await.unwrap();

    assert_eq!(report.executed, vec!["docker-base-test", "docker-test", "release"]);
    assert_eq!(
        fx.backend.collaborators(),
        vec![Collaborator::Container, Collaborator::Shell]
    );
    assert_eq!(
        fx.backend.calls()[1].command,
        "docker run --rm python:3 python3 -m widget --help"
    );
}

#[tokio::test]
async fn shell_command_with_unbound_placeholder_fails_before_running() {
    let fx = Fixture::new();
    let cfg = ConfigFileBuilder::new()
        .with_target("deploy", TargetConfigBuilder::new("scp ${ARCHIVE} host:").build())
        .build();
    let mut exec = fx.executor_with(TargetGraph::with_config(&cfg).unwrap());

    let err = exec.run(&fx.ctx(), &["deploy"]).await.unwrap_err();

    assert_eq!(err.target(), Some("deploy"));
    assert!(matches!(
        err.root(),
        PipelineError::UnresolvedPlaceholder { placeholder } if placeholder == "ARCHIVE"
    ));
    assert!(fx.backend.calls().is_empty());
}

#[tokio::test]
async fn extra_bindings_resolve_config_placeholders() {
    let fx = Fixture::new();
    let cfg = ConfigFileBuilder::new()
        .with_target("deploy", TargetConfigBuilder::new("scp ${ARCHIVE} host:").build())
        .build();
    let mut exec = fx.executor_with(TargetGraph::with_config(&cfg).unwrap());
    let ctx = common::builders::ContextBuilder::new(&fx.root)
        .var("ARCHIVE", "widget.tar.gz")
        .build();

    exec.run(&ctx, &["deploy"]).await.unwrap();

    assert_eq!(fx.backend.calls()[0].command, "scp widget.tar.gz host:");
}

#[tokio::test]
async fn config_target_with_output_is_skipped_while_fresh() {
    let fx = Fixture::new();
    let cfg = ConfigFileBuilder::new()
        .with_target(
            "docs",
            TargetConfigBuilder::new("sphinx-build docs site").output("site").build(),
        )
        .build();
    let mut exec = fx.executor_with(TargetGraph::with_config(&cfg).unwrap());

    // Output missing: runs.
    exec.run(&fx.ctx(), &["docs"]).await.unwrap();
    assert_eq!(fx.backend.count(Collaborator::Shell), 1);

    // The fake ran nothing, so create the output newer than every source.
    fx.fs.write(&fx.path("site/index.html"), b"<html>").unwrap();
    let report = exec.run(&fx.ctx(), &["docs"]).await.unwrap();
    assert_eq!(report.skipped, vec!["docs"]);
    assert_eq!(fx.backend.count(Collaborator::Shell), 1);
}
