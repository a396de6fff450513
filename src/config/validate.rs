// src/config/validate.rs

use std::collections::HashSet;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.project,
            raw.tools,
            raw.vars,
            raw.target,
        ))
    }
}

/// Checks that only concern the config file itself. Prerequisite edges are
/// validated when the target graph is built, because config targets may
/// depend on built-in ones.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_tools(cfg)?;
    validate_targets(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    if let Some(tags) = &cfg.project.dist_tags {
        if tags.is_empty() {
            return Err(PipelineError::ConfigError(
                "[project].dist_tags must list at least one runtime tag".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for tag in tags {
            if !seen.insert(tag) {
                return Err(PipelineError::ConfigError(format!(
                    "[project].dist_tags lists runtime tag '{tag}' twice"
                )));
            }
        }
    }

    for (key, value) in [
        ("package", &cfg.project.package),
        ("main", &cfg.project.main),
        ("dist_dir", &cfg.project.dist_dir),
        ("backport_dir", &cfg.project.backport_dir),
    ] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(PipelineError::ConfigError(format!(
                "[project].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    if let Some(pattern) = &cfg.tools.absent_pattern {
        Regex::new(pattern).map_err(|e| {
            PipelineError::ConfigError(format!("[tools].absent_pattern is not a valid regex: {e}"))
        })?;
    }
    if cfg.tools.timeout_secs == Some(0) {
        return Err(PipelineError::ConfigError(
            "[tools].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_targets(cfg: &RawConfigFile) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        if name.trim().is_empty() {
            return Err(PipelineError::ConfigError(
                "target names must not be empty".to_string(),
            ));
        }
        if target.cmd.clone().into_vec().iter().any(|c| c.trim().is_empty()) {
            return Err(PipelineError::ConfigError(format!(
                "target '{name}' has an empty command"
            )));
        }
    }
    Ok(())
}
