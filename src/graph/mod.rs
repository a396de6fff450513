// src/graph/mod.rs

//! Target graph.
//!
//! - [`target`] declares targets, their freshness rule and action.
//! - [`graph`] holds the validated DAG and computes prerequisite closures.
//! - [`builtin`] declares the standard build/test/release targets.

pub mod builtin;
pub mod graph;
pub mod target;

pub use graph::TargetGraph;
pub use target::{Action, Freshness, PathRef, Step, Target, TargetName};
