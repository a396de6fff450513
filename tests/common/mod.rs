#![allow(dead_code)]

pub use projmk_test_utils::builders;
pub use projmk_test_utils::fake_backend::{wheel_path, FakeBackend};
pub use projmk_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;

use projmk::context::Context;
use projmk::exec::Toolchain;
use projmk::fs::mock::MockFileSystem;
use projmk::graph::TargetGraph;
use projmk::pipeline::Executor;

use crate::common::builders::{populate_project, ContextBuilder};

pub const ROOT: &str = "/work/widget";

/// A populated mock project plus a fake backend whose builder and backport
/// transformer write their outputs into the mock filesystem.
pub struct Fixture {
    pub fs: MockFileSystem,
    pub backend: FakeBackend,
    pub root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let fs = MockFileSystem::new();
        let root = populate_project(&fs, ROOT);
        let backend = FakeBackend::new()
            .with_wheel_builder(&fs, &root.join("dist"), "widget")
            .with_backport_writer(&fs, &root.join("backport"), "widget");
        Self { fs, backend, root }
    }

    pub fn ctx(&self) -> Context {
        ContextBuilder::new(&self.root).build()
    }

    pub fn ctx_for(&self, runtime: &str) -> Context {
        ContextBuilder::new(&self.root).runtime(runtime).build()
    }

    /// Executor over the standard graph. The backend handle stays usable
    /// for assertions because clones share their log.
    pub fn executor(&self) -> Executor<FakeBackend> {
        self.executor_with(TargetGraph::standard().unwrap())
    }

    pub fn executor_with(&self, graph: TargetGraph) -> Executor<FakeBackend> {
        Executor::new(
            graph,
            Toolchain::default(),
            Arc::new(self.fs.clone()),
            self.backend.clone(),
        )
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}
