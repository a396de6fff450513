// src/exec/mod.rs

//! Collaborator execution layer.
//!
//! Every external tool (linter, test runner, package builder, install
//! client, ...) is reached through a [`CommandBackend`]. The pipeline only
//! looks at the exit status and the captured output.
//!
//! - [`backend`] provides the `CommandBackend` trait and the command/outcome
//!   types that the executor and test fakes share.
//! - [`command`] is the production backend built on `tokio::process`.
//! - [`toolchain`] holds the command templates, with config overrides.
//! - [`probe`] asks the active interpreter for its runtime version.

pub mod backend;
pub mod command;
pub mod probe;
pub mod toolchain;

pub use backend::{Collaborator, CommandBackend, CommandOutput, CommandSpec};
pub use command::RealCommandBackend;
pub use probe::probe_runtime;
pub use toolchain::Toolchain;
