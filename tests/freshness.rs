// tests/freshness.rs

mod common;
use crate::common::Fixture;

use projmk::errors::PipelineError;
use projmk::exec::{Collaborator, CommandOutput};

#[tokio::test]
async fn backport_runs_once_then_stays_fresh() {
    let fx = Fixture::new();
    let mut exec = fx.executor();
    let ctx = fx.ctx_for("2");

    let first = exec.run(&ctx, &["backport"]).await.unwrap();
    assert_eq!(first.executed, vec!["sources", "backport"]);

    let second = exec.run(&ctx, &["backport"]).await.unwrap();
    assert_eq!(second.executed, vec!["sources"]);
    assert_eq!(second.skipped, vec!["backport"]);
    assert_eq!(fx.backend.count(Collaborator::Backport), 1);
}

#[tokio::test]
async fn touching_a_source_makes_the_backport_stale() {
    let fx = Fixture::new();
    let mut exec = fx.executor();
    let ctx = fx.ctx_for("2");

    exec.run(&ctx, &["backport"]).await.unwrap();
    fx.fs.touch(fx.path("widget/__init__.py"));
    let report = exec.run(&ctx, &["backport"]).await.unwrap();

    assert_eq!(report.executed, vec!["sources", "backport"]);
    assert_eq!(fx.backend.count(Collaborator::Backport), 2);
}

#[tokio::test]
async fn setup_dir_is_the_project_root_for_the_current_runtime() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    let report = exec.run(&fx.ctx(), &["setup-dir"]).await.unwrap();

    assert_eq!(report.skipped, vec!["setup-dir"]);
    assert!(fx.backend.calls().is_empty());
}

#[tokio::test]
async fn setup_dir_and_backport_share_one_transformer_run() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    // setup-dir creates the backport tree; backport is then fresh.
    let report = exec
        .run(&fx.ctx_for("2"), &["setup-dir", "backport"])
        .await
        .unwrap();

    assert_eq!(report.executed, vec!["sources", "setup-dir"]);
    assert_eq!(report.skipped, vec!["backport"]);
    assert_eq!(fx.backend.count(Collaborator::Backport), 1);
}

#[tokio::test]
async fn transformer_that_creates_nothing_fails_the_target() {
    let fx = Fixture::new();
    fx.backend.on(Collaborator::Backport, |_| CommandOutput::success());
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx_for("2"), &["backport"]).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::TargetFailed { ref target, ref collaborator, .. }
            if target == "backport" && collaborator == "backport transformer"
    ));
}

#[tokio::test]
async fn backport_command_lists_the_source_set() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx_for("2"), &["backport"]).await.unwrap();

    assert_eq!(
        fx.backend.calls()[0].command,
        "python3 -m pimpy backport -p widget -s widget tests setup.py setup.cfg LICENSE.txt README.md -m widget"
    );
}
