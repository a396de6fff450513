// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Duplicate target: {0}")]
    DuplicateTarget(String),

    #[error("target '{target}' has unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite { target: String, prerequisite: String },

    #[error("target '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Cycle detected in target graph: {0}")]
    Cycle(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("target '{target}' failed: {collaborator} reported: {diagnostic}")]
    TargetFailed {
        target: String,
        collaborator: String,
        diagnostic: String,
    },

    #[error("target '{target}': no artifact matching '{pattern}' in {dir:?}")]
    ArtifactNotFound {
        target: String,
        pattern: String,
        dir: PathBuf,
    },

    /// Two runtime tags resolved to the same artifact file.
    #[error("target '{target}': {later} artifact {path:?} is the same file as the {earlier} artifact")]
    ArtifactCollision {
        target: String,
        path: PathBuf,
        earlier: String,
        later: String,
    },

    #[error("target '{target}': missing source {path:?}")]
    MissingSource { target: String, path: PathBuf },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unresolved placeholder: ${{{placeholder}}}")]
    UnresolvedPlaceholder { placeholder: String },

    /// An error raised inside a target's action that carries no target
    /// name of its own (I/O, rendering).
    #[error("target '{target}': {source}")]
    InTarget {
        target: String,
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// True for errors raised while constructing or validating the target graph.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            PipelineError::DuplicateTarget(_)
                | PipelineError::UnknownPrerequisite { .. }
                | PipelineError::SelfDependency(_)
                | PipelineError::Cycle(_)
        )
    }

    /// Name of the target this error is attributed to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            PipelineError::TargetFailed { target, .. }
            | PipelineError::ArtifactNotFound { target, .. }
            | PipelineError::ArtifactCollision { target, .. }
            | PipelineError::MissingSource { target, .. }
            | PipelineError::InTarget { target, .. } => Some(target),
            PipelineError::UnknownTarget(name) => Some(name),
            _ => None,
        }
    }

    /// Attribute an error to `target` unless it already names one.
    pub fn in_target(self, target: &str) -> Self {
        if self.target().is_some() {
            return self;
        }
        PipelineError::InTarget {
            target: target.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through target attribution.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::InTarget { source, .. } => source.root(),
            other => other,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
