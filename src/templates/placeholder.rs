// src/templates/placeholder.rs

//! `${NAME}` placeholder expansion.
//!
//! Two flavours:
//! - [`render_lenient`] leaves placeholders without a binding untouched, so a
//!   later consumer can expand them.
//! - [`render_strict`] fails on the first placeholder without a binding.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::errors::{PipelineError, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
});

/// Variable bindings available to templates and command lines.
pub type Bindings = BTreeMap<String, String>;

/// Substitute every bound placeholder; unbound ones are kept verbatim.
pub fn render_lenient(template: &str, bindings: &Bindings) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match bindings.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Substitute every placeholder, failing on the first one without a binding.
pub fn render_strict(template: &str, bindings: &Bindings) -> Result<String> {
    if let Some(name) = unresolved(template, bindings).into_iter().next() {
        return Err(PipelineError::UnresolvedPlaceholder { placeholder: name });
    }
    Ok(render_lenient(template, bindings))
}

/// Names of placeholders in `template` that have no binding, in order of
/// first appearance.
pub fn unresolved(template: &str, bindings: &Bindings) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !bindings.contains_key(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}
