use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory components that are never descended into when the VCS-aware
/// walk is unavailable (§4.5 fallback path).
const FALLBACK_IGNORE: &[&str] = &[
    ".venv",
    "__pycache__",
    ".hg",
    ".svn",
    "node_modules",
    "build",
    "dist",
    "target",
];

/// Enumerates candidate files under a project root, honouring VCS ignore
/// rules where available and falling back to a fixed ignore set otherwise
/// (§4.5).
pub struct FileDiscovery {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl FileDiscovery {
    pub fn new(root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Enumerate all regular files under the project root.
    pub fn discover(&self) -> Vec<PathBuf> {
        match self.discover_via_vcs() {
            Some(files) => files,
            None => {
                debug!(root = %self.root.display(), "file discovery: no VCS context, using fallback walk");
                self.discover_via_walk()
            }
        }
    }

    /// Primary path (§4.5): delegate ignore semantics to `ignore::WalkBuilder`,
    /// which honours `.gitignore`, global excludes, and VCS tracking state.
    /// Returns `None` when the walk yields no entries at all, which this
    /// crate treats as "no VCS context" and falls back to the fixed walk.
    fn discover_via_vcs(&self) -> Option<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut saw_any_entry = false;
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    saw_any_entry = true;
                    let path = entry.path();
                    if self.is_under_cache_dir(path) {
                        continue;
                    }
                    if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "file discovery: VCS-aware walk entry error");
                }
            }
        }

        if saw_any_entry {
            Some(files)
        } else {
            None
        }
    }

    /// Fallback path (§4.5): a fixed recursive walk excluding a static set
    /// of directory names and the store's own cache directory.
    fn discover_via_walk(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !is_fallback_ignored(e.path()))
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if self.is_under_cache_dir(path) {
                        continue;
                    }
                    if entry.file_type().is_file() {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "file discovery: fallback walk entry error");
                }
            }
        }
        files
    }

    /// Single-event relevance predicate (§4.6): the path must lie under the
    /// project root, outside the ignore set and the cache directory, and
    /// refer to an existing regular file.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if !path.starts_with(&self.root) {
            return false;
        }
        if is_fallback_ignored(path) {
            return false;
        }
        if self.is_under_cache_dir(path) {
            return false;
        }
        path.is_file()
    }

    fn is_under_cache_dir(&self, path: &Path) -> bool {
        path.starts_with(&self.cache_dir)
    }
}

fn is_fallback_ignored(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        FALLBACK_IGNORE.contains(&name.as_ref())
    })
}
