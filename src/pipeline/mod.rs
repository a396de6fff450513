// src/pipeline/mod.rs

//! Pipeline execution.
//!
//! - [`executor`] walks prerequisite closures, memoizes completed targets
//!   and fails fast.
//! - [`freshness`] decides whether a file-backed target can be skipped.
//! - [`actions`] holds the bodies of the built-in targets.
//! - [`dists`] builds one artifact per runtime tag into a shared directory.

mod actions;
mod dists;
pub mod executor;
mod freshness;

pub use executor::{Executor, RunReport};
