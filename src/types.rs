use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Major version of the package runtime a build targets (e.g. `"2"` or `"3"`).
///
/// The tag namespaces build outputs (`py3` in artifact file names) and
/// selects the interpreter binary (`python3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct RuntimeTag(String);

impl RuntimeTag {
    pub fn new(major: impl Into<String>) -> Result<Self, String> {
        let major = major.into();
        let trimmed = major.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!(
                "invalid runtime tag: {major:?} (expected a major version such as \"3\")"
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The bare major version, e.g. `"3"`.
    pub fn major(&self) -> &str {
        &self.0
    }

    /// Tag label used in artifact names, e.g. `"py3"`.
    pub fn label(&self) -> String {
        format!("py{}", self.0)
    }

    /// Interpreter binary for this runtime, e.g. `"python3"`.
    pub fn interpreter(&self) -> String {
        format!("python{}", self.0)
    }
}

impl Default for RuntimeTag {
    fn default() -> Self {
        RuntimeTag("3".to_string())
    }
}

impl fmt::Display for RuntimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RuntimeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both "3" and "py3".
        let s = s.trim();
        RuntimeTag::new(s.strip_prefix("py").unwrap_or(s))
    }
}

impl TryFrom<String> for RuntimeTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Artifact repository an upload goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repository {
    /// Staging index (`test-publish`).
    Test,
    /// Production index (`publish`).
    Production,
}

/// Outcome of asking the install client to remove the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed,
    /// The package was not installed; treated as success.
    AlreadyAbsent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_prefixed_tags() {
        assert_eq!("3".parse::<RuntimeTag>().unwrap().major(), "3");
        assert_eq!("py2".parse::<RuntimeTag>().unwrap().major(), "2");
        assert!("three".parse::<RuntimeTag>().is_err());
        assert!("".parse::<RuntimeTag>().is_err());
    }

    #[test]
    fn label_and_interpreter_follow_major() {
        let tag = RuntimeTag::new("2").unwrap();
        assert_eq!(tag.label(), "py2");
        assert_eq!(tag.interpreter(), "python2");
    }
}
