use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use projmk::errors::Result;
use projmk::exec::{Collaborator, CommandBackend, CommandOutput, CommandSpec};
use projmk::fs::mock::MockFileSystem;

type Responder = Box<dyn FnMut(&CommandSpec) -> CommandOutput + Send>;

struct Rule {
    collaborator: Option<Collaborator>,
    needle: Option<String>,
    respond: Responder,
}

impl Rule {
    fn matches(&self, spec: &CommandSpec) -> bool {
        self.collaborator.is_none_or(|c| c == spec.collaborator)
            && self
                .needle
                .as_deref()
                .is_none_or(|n| spec.command.contains(n))
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<CommandSpec>,
    rules: Vec<Rule>,
}

/// A fake command backend that:
/// - records every command it is asked to run
/// - answers with the most recently added matching rule, or success.
///
/// Clones share state, so a test can keep a handle after moving the
/// backend into an executor, and rules added through any handle apply to
/// all of them.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands of `collaborator` with `respond`.
    pub fn on<F>(&self, collaborator: Collaborator, respond: F) -> Self
    where
        F: FnMut(&CommandSpec) -> CommandOutput + Send + 'static,
    {
        self.push_rule(Some(collaborator), None, Box::new(respond))
    }

    /// Fail every command of `collaborator`.
    pub fn fail(&self, collaborator: Collaborator, code: i32, stderr: &str) -> Self {
        let out = CommandOutput::failure(code, stderr);
        self.on(collaborator, move |_| out.clone())
    }

    /// Fail every command whose text contains `needle`.
    pub fn fail_matching(&self, needle: &str, code: i32, stderr: &str) -> Self {
        let out = CommandOutput::failure(code, stderr);
        self.push_rule(None, Some(needle.to_string()), Box::new(move |_| out.clone()))
    }

    /// Make the package builder drop `<pkg>-0.1.0-<PY_TAG>-none-any.whl`
    /// into `dist_dir`, using the `PY_TAG` the executor passes.
    pub fn with_wheel_builder(&self, fs: &MockFileSystem, dist_dir: &Path, package: &str) -> Self {
        let fs = fs.clone();
        let dist_dir = dist_dir.to_path_buf();
        let package = package.to_string();
        self.on(Collaborator::Builder, move |spec| {
            let tag = env_value(spec, "PY_TAG").unwrap_or_else(|| "py3".to_string());
            fs.add_file(wheel_path(&dist_dir, &package, &tag), "wheel");
            CommandOutput::success()
        })
    }

    /// Make the backport transformer write a package tree under `backport_dir`.
    pub fn with_backport_writer(&self, fs: &MockFileSystem, backport_dir: &Path, package: &str) -> Self {
        let fs = fs.clone();
        let target = backport_dir.join(package).join("__init__.py");
        self.on(Collaborator::Backport, move |_| {
            fs.add_file(&target, "# backported");
            CommandOutput::success()
        })
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn collaborators(&self) -> Vec<Collaborator> {
        self.calls().into_iter().map(|c| c.collaborator).collect()
    }

    pub fn count(&self, collaborator: Collaborator) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.collaborator == collaborator)
            .count()
    }

    fn push_rule(&self, collaborator: Option<Collaborator>, needle: Option<String>, respond: Responder) -> Self {
        self.state.lock().unwrap().rules.push(Rule {
            collaborator,
            needle,
            respond,
        });
        self.clone()
    }
}

impl CommandBackend for FakeBackend {
    fn run(
        &mut self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>> {
        let output = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(spec.clone());
            match state.rules.iter_mut().rev().find(|r| r.matches(&spec)) {
                Some(rule) => (rule.respond)(&spec),
                None => CommandOutput::success(),
            }
        };
        Box::pin(async move { Ok(output) })
    }
}

/// Path the wheel builder writes for a runtime label such as `py3`.
pub fn wheel_path(dist_dir: &Path, package: &str, tag: &str) -> PathBuf {
    dist_dir.join(format!("{package}-0.1.0-{tag}-none-any.whl"))
}

fn env_value(spec: &CommandSpec, key: &str) -> Option<String> {
    spec.env
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}
