// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, (MockEntry, u64)>,
    /// Logical clock; every write advances it by one second.
    clock: u64,
}

impl MockState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// In-memory filesystem with a logical clock for modification times.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

fn parent_of(path: &Path) -> Option<&Path> {
    let parent = path.parent()?;
    if parent.as_os_str().is_empty() {
        Some(Path::new("."))
    } else {
        Some(parent)
    }
}

fn child_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(|s| s.to_string())
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        state
            .entries
            .insert(PathBuf::from("."), (MockEntry::Dir(Vec::new()), 0));
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        state
            .entries
            .insert(path.clone(), (MockEntry::File(content.into()), now));
        Self::link_to_parent(&mut state, &path, now);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        Self::ensure_dir_entry(&mut state, path.as_ref(), now);
    }

    /// Bump the modification time of an existing entry to "now".
    pub fn touch(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        if let Some((_, mtime)) = state.entries.get_mut(path.as_ref()) {
            *mtime = now;
        }
    }

    /// Sorted list of file paths under `root` (including `root` itself if it
    /// is a file).
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let state = self.state.lock().unwrap();
        let mut files: Vec<PathBuf> = state
            .entries
            .iter()
            .filter(|(p, (e, _))| matches!(e, MockEntry::File(_)) && p.starts_with(root.as_ref()))
            .map(|(p, _)| p.clone())
            .collect();
        files.sort();
        files
    }

    fn link_to_parent(state: &mut MockState, path: &Path, now: u64) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        Self::ensure_dir_entry(state, parent, now);
        if let (Some((MockEntry::Dir(children), _)), Some(name)) =
            (state.entries.get_mut(parent), child_name(path))
        {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn ensure_dir_entry(state: &mut MockState, path: &Path, now: u64) {
        if state.entries.contains_key(path) {
            return;
        }
        state
            .entries
            .insert(path.to_path_buf(), (MockEntry::Dir(Vec::new()), now));
        Self::link_to_parent(state, path, now);
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some((MockEntry::File(content), _)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some((MockEntry::Dir(_), _)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some((MockEntry::File(_), _)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some((MockEntry::Dir(_), _)))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.entries.contains_key(path) {
            return Ok(false);
        }

        state.entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (parent_of(path), child_name(path)) {
            if let Some((MockEntry::Dir(children), _)) = state.entries.get_mut(parent) {
                children.retain(|c| c != &name);
            }
        }
        Ok(true)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some((_, secs)) => Ok(UNIX_EPOCH + Duration::from_secs(*secs)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some((MockEntry::Dir(children), _)) => {
                let mut entries: Vec<PathBuf> =
                    children.iter().map(|name| path.join(name)).collect();
                entries.sort();
                Ok(entries)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
