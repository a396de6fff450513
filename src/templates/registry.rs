// src/templates/registry.rs

use std::collections::BTreeMap;

use crate::errors::{PipelineError, Result};
use crate::templates::placeholder::{render_lenient, Bindings};

/// A named boilerplate file. Content may hold `${NAME}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content: String,
}

/// Immutable registry of boilerplate artifacts, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    artifacts: BTreeMap<String, Artifact>,
}

impl TemplateRegistry {
    /// Registry with the built-in project files.
    pub fn builtin() -> Self {
        Self::from_artifacts([
            ("Projmk.toml", include_str!("data/Projmk.toml")),
            ("setup.cfg", include_str!("data/setup.cfg")),
            (".gitignore", include_str!("data/gitignore")),
            ("LICENSE.txt", include_str!("data/LICENSE.txt")),
        ])
    }

    /// Build a registry from `(name, content)` pairs. Later duplicates win.
    pub fn from_artifacts<N, C>(artifacts: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        let artifacts = artifacts
            .into_iter()
            .map(|(name, content)| {
                let name = name.into();
                let artifact = Artifact {
                    name: name.clone(),
                    content: content.into(),
                };
                (name, artifact)
            })
            .collect();
        Self { artifacts }
    }

    pub fn get(&self, name: &str) -> Result<&Artifact> {
        self.artifacts
            .get(name)
            .ok_or_else(|| PipelineError::TemplateNotFound(name.to_string()))
    }

    /// Registered artifact names, sorted.
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(|s| s.as_str())
    }

    /// Render an artifact, substituting known placeholders and leaving the
    /// rest for whichever consumer expands them later.
    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String> {
        let artifact = self.get(name)?;
        Ok(render_lenient(&artifact.content, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_all_project_files() {
        let reg = TemplateRegistry::builtin();
        let names: Vec<&str> = reg.list().collect();
        assert_eq!(names, vec![".gitignore", "LICENSE.txt", "Projmk.toml", "setup.cfg"]);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let reg = TemplateRegistry::builtin();
        assert!(matches!(
            reg.get("Makefile"),
            Err(PipelineError::TemplateNotFound(name)) if name == "Makefile"
        ));
    }

    #[test]
    fn render_substitutes_only_bound_names() {
        let reg = TemplateRegistry::from_artifacts([("x", "${A}-${B}")]);
        let mut b = Bindings::new();
        b.insert("A".into(), "1".into());
        assert_eq!(reg.render("x", &b).unwrap(), "1-${B}");
    }

    #[test]
    fn rendered_build_rules_keep_pipeline_placeholders() {
        let reg = TemplateRegistry::builtin();
        let mut b = Bindings::new();
        b.insert("PKG".into(), "widget".into());
        let out = reg.render("Projmk.toml", &b).unwrap();
        assert!(out.contains("package = \"widget\""));
        assert!(out.contains("${PYTHON}"));
    }
}
