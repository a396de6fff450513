// src/templates/mod.rs

//! Boilerplate artifacts and placeholder expansion.
//!
//! - [`registry`] holds the named project files (build rules, packaging
//!   metadata, ignore list, license).
//! - [`placeholder`] expands `${NAME}` placeholders, leniently for scaffolded
//!   files and strictly for command lines.

pub mod placeholder;
pub mod registry;

pub use placeholder::{render_lenient, render_strict, Bindings};
pub use registry::{Artifact, TemplateRegistry};
