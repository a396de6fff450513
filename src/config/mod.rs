// src/config/mod.rs

//! Project configuration (`Projmk.toml`).
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it (`validate.rs`, via `TryFrom<RawConfigFile>`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_path, load_and_validate, load_from_path, load_optional, DEFAULT_CONFIG_FILE};
pub use model::{
    CommandList, ConfigFile, ProjectSection, RawConfigFile, TargetConfig, ToolsSection,
};
