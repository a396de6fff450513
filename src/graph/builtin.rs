// src/graph/builtin.rs

//! The built-in build/test/release graph.

use crate::graph::target::{Action, PathRef, Step, Target};
use crate::types::Repository;

fn step(s: Step) -> Action {
    Action::Step(s)
}

/// Built-in targets in declaration order.
pub fn builtin_targets() -> Vec<Target> {
    vec![
        Target::phony("default", &["test"], Action::Noop),
        Target::phony("sources", &[], step(Step::CheckSources)),
        Target::phony("vars", &[], step(Step::PrintVars)),
        // Testing
        Target::phony("lint", &[], step(Step::Lint)),
        Target::phony("tox", &[], step(Step::Tox)),
        Target::phony("base-test", &["sources", "lint"], step(Step::BaseTest)),
        Target::phony("test", &["lint", "base-test"], Action::Noop),
        Target::phony("script-test", &[], step(Step::ScriptTest)),
        Target::phony("clean", &[], step(Step::Clean)),
        // Source roots
        Target::file("backport", PathRef::BackportDir, &["sources"], step(Step::Backport)),
        Target::file("setup-dir", PathRef::SetupDir, &["sources"], step(Step::PrepareSetupDir)),
        Target::phony("dev-install", &["setup-dir"], step(Step::DevInstall)),
        // Distribution
        Target::phony("dist", &["setup-dir", "sources"], step(Step::Dist)),
        Target::phony("dist-install", &["dist"], step(Step::DistInstall)),
        Target::phony("dist-uninstall", &[], step(Step::Uninstall)),
        Target::phony(
            "dist-reinstall",
            &["dist-uninstall", "dist-install"],
            Action::Noop,
        ),
        Target::phony("dist-base-test", &[], step(Step::DistBaseTest)),
        Target::phony("dist-test", &["dist-base-test"], Action::Noop),
        Target::phony("install", &["dist-reinstall"], Action::Noop),
        Target::phony("uninstall", &[], step(Step::Uninstall)),
        Target::phony("dists", &[], step(Step::BuildAllDists)),
        // Release
        Target::phony("sign", &["dist"], step(Step::Sign)),
        Target::phony(
            "test-publish",
            &["test", "dist"],
            step(Step::Upload(Repository::Test)),
        ),
        Target::phony(
            "publish",
            &["test", "dist", "sign"],
            step(Step::Upload(Repository::Production)),
        ),
        Target::phony("docker-base-test", &[], step(Step::DockerTest)),
        Target::phony("docker-test", &["docker-base-test"], Action::Noop),
        // Scaffolding
        Target::phony("scaffold", &[], step(Step::Scaffold)),
    ]
}
