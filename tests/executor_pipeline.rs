// tests/executor_pipeline.rs

mod common;
use crate::common::Fixture;

use projmk::errors::PipelineError;
use projmk::exec::Collaborator;
use projmk::fs::FileSystem;

#[tokio::test]
async fn test_runs_closure_in_declared_order_once() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    let report = exec.run(&fx.ctx(), &["test"]).await.unwrap();

    assert_eq!(report.executed, vec!["lint", "sources", "base-test", "test"]);
    assert!(report.skipped.is_empty());
    assert_eq!(
        fx.backend.collaborators(),
        vec![
            Collaborator::Linter,
            Collaborator::ImportTest,
            Collaborator::TestRunner,
            Collaborator::CliTest,
        ]
    );
}

#[tokio::test]
async fn requested_targets_share_one_memo() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    let report = exec.run(&fx.ctx(), &["lint", "test", "lint"]).await.unwrap();

    assert_eq!(fx.backend.count(Collaborator::Linter), 1);
    assert_eq!(report.executed, vec!["lint", "sources", "base-test", "test"]);
}

#[tokio::test]
async fn default_target_runs_the_test_suite() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    let report = exec.run(&fx.ctx(), &["default"]).await.unwrap();

    assert_eq!(report.executed.last().map(String::as_str), Some("default"));
    assert_eq!(fx.backend.count(Collaborator::TestRunner), 1);
}

#[tokio::test]
async fn unknown_target_is_rejected_before_anything_runs() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["lint", "deploy"]).await.unwrap_err();

    assert!(matches!(err, PipelineError::UnknownTarget(ref name) if name == "deploy"));
    assert!(fx.backend.calls().is_empty());
}

#[tokio::test]
async fn failing_target_stops_the_remaining_closure() {
    let fx = Fixture::new();
    fx.backend.fail(Collaborator::Linter, 1, "widget/core.py:3:1: E302 expected 2 blank lines");
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["test"]).await.unwrap_err();

    match err {
        PipelineError::TargetFailed {
            target,
            collaborator,
            diagnostic,
        } => {
            assert_eq!(target, "lint");
            assert_eq!(collaborator, "linter");
            assert!(diagnostic.contains("E302"));
        }
        other => panic!("expected TargetFailed, got {other:?}"),
    }
    assert_eq!(fx.backend.collaborators(), vec![Collaborator::Linter]);
}

#[tokio::test]
async fn base_test_aborts_on_first_failing_check() {
    let fx = Fixture::new();
    fx.backend.fail(Collaborator::ImportTest, 1, "ModuleNotFoundError: No module named 'widget'");
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["base-test"]).await.unwrap_err();

    assert_eq!(err.target(), Some("base-test"));
    assert_eq!(fx.backend.count(Collaborator::TestRunner), 0);
    assert_eq!(fx.backend.count(Collaborator::CliTest), 0);
}

#[tokio::test]
async fn missing_source_fails_the_sources_target() {
    let fx = Fixture::new();
    fx.fs.remove_all(&fx.path("README.md")).unwrap();
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["base-test"]).await.unwrap_err();

    match err {
        PipelineError::MissingSource { target, path } => {
            assert_eq!(target, "sources");
            assert_eq!(path, fx.path("README.md"));
        }
        other => panic!("expected MissingSource, got {other:?}"),
    }
    // The linter is declared after `sources` in base-test, so it never ran.
    assert!(fx.backend.calls().is_empty());
}

#[tokio::test]
async fn plan_lists_the_closure_without_running() {
    let fx = Fixture::new();
    let exec = fx.executor();

    let plan = exec.plan(&["publish"]).unwrap();

    assert_eq!(
        plan,
        vec!["lint", "sources", "base-test", "test", "setup-dir", "dist", "sign", "publish"]
    );
    assert!(fx.backend.calls().is_empty());
}

#[tokio::test]
async fn commands_run_with_the_runtime_tag_in_their_environment() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx(), &["lint"]).await.unwrap();

    let call = &fx.backend.calls()[0];
    assert!(call.env.contains(&("PY_TAG".to_string(), "py3".to_string())));
    assert_eq!(call.cwd, fx.root);
    assert_eq!(call.command, format!("python3 -m flake8 {}", fx.root.display()));
}

#[tokio::test]
async fn script_test_runs_scripts_in_order_and_tolerates_none() {
    let fx = Fixture::new();
    let mut exec = fx.executor();
    exec.run(&fx.ctx(), &["script-test"]).await.unwrap();
    assert!(fx.backend.calls().is_empty());

    let ctx = common::builders::ContextBuilder::new(&fx.root)
        .test_scripts(&["${MAIN} --version", "${MAIN} --help"])
        .build();
    let mut exec = fx.executor();
    exec.run(&ctx, &["script-test"]).await.unwrap();

    let commands: Vec<String> = fx.backend.calls().into_iter().map(|c| c.command).collect();
    assert_eq!(commands, vec!["widget --version", "widget --help"]);
}
