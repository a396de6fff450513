// src/pipeline/freshness.rs

//! Staleness rule for file-backed targets.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::context::Context;
use crate::errors::Result;
use crate::fs::{newest_mtime, FileSystem};
use crate::graph::{Target, TargetName};

/// A file-backed target is fresh when its output exists, none of its
/// file-backed prerequisites was rebuilt in this invocation, and no source
/// file is newer than the newest entry under the output.
pub(crate) fn is_fresh(
    fs: &dyn FileSystem,
    ctx: &Context,
    target: &Target,
    output: &Path,
    rebuilt: &HashSet<TargetName>,
) -> Result<bool> {
    let Some(output_time) = newest_mtime(fs, output)? else {
        debug!(name = %target.name, path = ?output, "output missing");
        return Ok(false);
    };

    if let Some(dep) = target.prerequisites.iter().find(|p| rebuilt.contains(*p)) {
        debug!(name = %target.name, prerequisite = %dep, "prerequisite was rebuilt");
        return Ok(false);
    }

    for source in ctx.source_paths() {
        if let Some(source_time) = newest_mtime(fs, &source)? {
            if source_time > output_time {
                debug!(name = %target.name, source = ?source, "source is newer than output");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::graph::{Action, PathRef};
    use crate::types::RuntimeTag;

    fn ctx() -> Context {
        Context {
            cwd: PathBuf::from("/p"),
            package_name: "widget".into(),
            main_module: "widget".into(),
            runtime: RuntimeTag::default(),
            legacy_runtime: RuntimeTag::new("2").unwrap(),
            setup_dir: PathBuf::from("/p"),
            backport_dir: PathBuf::from("/p/backport"),
            dist_dir: PathBuf::from("/p/dist"),
            tests_dir: None,
            source_files: vec!["widget".into(), "setup.py".into()],
            test_scripts: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    fn backport() -> Target {
        Target::file("backport", PathRef::BackportDir, &["sources"], Action::Noop)
    }

    #[test]
    fn missing_output_is_stale() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/widget/__init__.py", "");
        let fresh = is_fresh(&fs, &ctx(), &backport(), Path::new("/p/backport"), &HashSet::new());
        assert!(!fresh.unwrap());
    }

    #[test]
    fn output_newer_than_sources_is_fresh() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/widget/__init__.py", "");
        fs.add_file("/p/backport/widget/__init__.py", "");
        let fresh = is_fresh(&fs, &ctx(), &backport(), Path::new("/p/backport"), &HashSet::new());
        assert!(fresh.unwrap());
    }

    #[test]
    fn touched_source_makes_output_stale() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/widget/__init__.py", "");
        fs.add_file("/p/backport/widget/__init__.py", "");
        fs.touch("/p/widget/__init__.py");
        let fresh = is_fresh(&fs, &ctx(), &backport(), Path::new("/p/backport"), &HashSet::new());
        assert!(!fresh.unwrap());
    }

    #[test]
    fn rebuilt_prerequisite_makes_output_stale() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/backport/widget/__init__.py", "");
        let rebuilt: HashSet<TargetName> = ["sources".to_string()].into_iter().collect();
        let fresh = is_fresh(&fs, &ctx(), &backport(), Path::new("/p/backport"), &rebuilt);
        assert!(!fresh.unwrap());
    }
}
