// tests/dists.rs

mod common;
use crate::common::{wheel_path, FakeBackend, Fixture};

use projmk::errors::PipelineError;
use projmk::exec::{Collaborator, CommandOutput};
use projmk::fs::FileSystem;
use projmk::types::RuntimeTag;

#[tokio::test]
async fn dists_builds_one_artifact_per_tag_into_one_directory() {
    let fx = Fixture::new();
    let dist = fx.path("dist");
    fx.fs.add_file(dist.join("widget-0.0.9-py3-none-any.whl"), "stale");
    let mut exec = fx.executor();

    let report = exec.run(&fx.ctx(), &["dists"]).await.unwrap();

    assert_eq!(
        fx.fs.files_under(&dist),
        vec![wheel_path(&dist, "widget", "py2"), wheel_path(&dist, "widget", "py3")]
    );
    assert_eq!(
        report.executed,
        vec![
            "sources (py2)",
            "setup-dir (py2)",
            "dist (py2)",
            "sources (py3)",
            "dist (py3)",
            "dists",
        ]
    );
    // setup-dir for the current runtime is the project root, which is fresh.
    assert_eq!(report.skipped, vec!["setup-dir (py3)"]);
}

#[tokio::test]
async fn legacy_tag_builds_from_the_backport_tree() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx(), &["dists"]).await.unwrap();

    let calls = fx.backend.calls();
    assert_eq!(
        fx.backend.collaborators(),
        vec![Collaborator::Backport, Collaborator::Builder, Collaborator::Builder]
    );
    assert_eq!(calls[1].cwd, fx.path("backport"));
    assert!(calls[1].env.contains(&("PY_TAG".to_string(), "py2".to_string())));
    assert!(calls[1].command.starts_with("python2 setup.py bdist_wheel"));
    assert_eq!(calls[2].cwd, fx.root);
    assert!(calls[2].env.contains(&("PY_TAG".to_string(), "py3".to_string())));
}

#[tokio::test]
async fn dists_honours_configured_tags() {
    let fx = Fixture::new();
    let mut exec = fx
        .executor()
        .with_dist_tags(vec![RuntimeTag::new("3").unwrap()]);

    exec.run(&fx.ctx(), &["dists"]).await.unwrap();

    assert_eq!(
        fx.fs.files_under(fx.path("dist")),
        vec![wheel_path(&fx.path("dist"), "widget", "py3")]
    );
    assert_eq!(fx.backend.count(Collaborator::Backport), 0);
}

#[tokio::test]
async fn builder_success_without_artifact_is_artifact_not_found() {
    let fx = Fixture::new();
    fx.backend.on(Collaborator::Builder, |_| CommandOutput::success());
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["dist"]).await.unwrap_err();

    match err {
        PipelineError::ArtifactNotFound { target, pattern, dir } => {
            assert_eq!(target, "dist");
            assert_eq!(pattern, "widget*py3*.whl");
            assert_eq!(dir, fx.path("dist"));
        }
        other => panic!("expected ArtifactNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_builder_is_target_failed_not_artifact_not_found() {
    let fx = Fixture::new();
    fx.backend.fail(Collaborator::Builder, 1, "error: invalid command 'bdist_wheel'");
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["dists"]).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::TargetFailed { ref target, ref collaborator, .. }
            if target == "dist" && collaborator == "package builder"
    ));
    // The first tag failed, so the second was never attempted.
    assert_eq!(fx.backend.count(Collaborator::Builder), 1);
}

#[tokio::test]
async fn sign_and_publish_use_the_built_artifacts() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx(), &["publish"]).await.unwrap();

    let wheel = wheel_path(&fx.path("dist"), "widget", "py3");
    let calls = fx.backend.calls();
    let sign = calls
        .iter()
        .find(|c| c.collaborator == Collaborator::Signer)
        .unwrap();
    assert_eq!(sign.command, format!("gpg --detach-sign -a {}", wheel.display()));

    let upload = calls.last().unwrap();
    assert_eq!(upload.collaborator, Collaborator::Uploader);
    assert_eq!(
        upload.command,
        format!("twine upload --repository pypi {}", wheel.display())
    );
}

#[tokio::test]
async fn test_publish_targets_the_staging_repository() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx(), &["test-publish"]).await.unwrap();

    let upload = fx.backend.calls().pop().unwrap();
    assert!(upload.command.starts_with("twine upload --repository testpypi "));
    assert_eq!(fx.backend.count(Collaborator::Signer), 0);
}

#[tokio::test]
async fn builder_rules_can_be_scripted_per_tag() {
    let fx = Fixture::new();
    let fs = fx.fs.clone();
    let dist = fx.path("dist");
    // Only the py3 build produces a file.
    let backend = FakeBackend::new()
        .with_backport_writer(&fx.fs, &fx.path("backport"), "widget")
        .on(Collaborator::Builder, move |spec| {
            if spec.env.iter().any(|(k, v)| k == "PY_TAG" && v == "py3") {
                fs.add_file(wheel_path(&dist, "widget", "py3"), "wheel");
            }
            CommandOutput::success()
        });
    let mut exec = projmk::pipeline::Executor::new(
        projmk::graph::TargetGraph::standard().unwrap(),
        projmk::exec::Toolchain::default(),
        std::sync::Arc::new(fx.fs.clone()),
        backend,
    );

    let err = exec.run(&fx.ctx(), &["dists"]).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::ArtifactNotFound { ref pattern, .. } if pattern == "widget*py2*.whl"
    ));
    assert!(!fx.fs.exists(&wheel_path(&fx.path("dist"), "widget", "py3")));
}

#[tokio::test]
async fn leftover_artifact_does_not_satisfy_a_silent_builder() {
    let fx = Fixture::new();
    fx.fs.add_file(fx.path("dist/widget-0.0.9-py3-none-any.whl"), "old build");
    fx.backend.on(Collaborator::Builder, |_| CommandOutput::success());
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["dist"]).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::ArtifactNotFound { ref target, ref pattern, .. }
            if target == "dist" && pattern == "widget*py3*.whl"
    ));
}

#[tokio::test]
async fn rebuilding_an_existing_artifact_counts_as_written() {
    let fx = Fixture::new();
    let mut exec = fx.executor();

    exec.run(&fx.ctx(), &["dist"]).await.unwrap();
    // Same file name again; the builder rewrites it.
    exec.run(&fx.ctx(), &["dist"]).await.unwrap();

    assert_eq!(fx.backend.count(Collaborator::Builder), 2);
    assert_eq!(
        fx.fs.files_under(fx.path("dist")),
        vec![wheel_path(&fx.path("dist"), "widget", "py3")]
    );
}

#[tokio::test]
async fn tags_sharing_one_artifact_fail_the_multi_runtime_build() {
    let fx = Fixture::new();
    let fs = fx.fs.clone();
    let universal = fx.path("dist/widget-0.1.0-py2.py3-none-any.whl");
    let written = universal.clone();
    fx.backend.on(Collaborator::Builder, move |_| {
        fs.add_file(&written, "wheel");
        CommandOutput::success()
    });
    let mut exec = fx.executor();

    let err = exec.run(&fx.ctx(), &["dists"]).await.unwrap_err();

    match err {
        PipelineError::ArtifactCollision {
            target,
            path,
            earlier,
            later,
        } => {
            assert_eq!(target, "dists");
            assert_eq!(path, universal);
            assert_eq!(earlier, "py2");
            assert_eq!(later, "py3");
        }
        other => panic!("expected ArtifactCollision, got {other:?}"),
    }
    assert_eq!(fx.backend.count(Collaborator::Builder), 2);
}
