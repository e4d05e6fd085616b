use std::path::Path;

use serde::{Deserialize, Serialize};

/// Project-root-relative path expressed with forward slashes, or an absolute
/// path string when the file lies outside the project root (§3 "Id").
pub type FileId = String;

/// Compute the canonical id for `abs_path` relative to project root `root`.
///
/// Falls back to the absolute path string (forward-slash separated) when
/// `abs_path` does not lie under `root` — e.g. a symlink escape or a caller
/// that passes an unrelated path.
pub fn file_id(root: &Path, abs_path: &Path) -> FileId {
    match abs_path.strip_prefix(root) {
        Ok(relative) => to_forward_slash(relative),
        Err(_) => to_forward_slash(abs_path),
    }
}

fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Metadata the vector store keeps per handle (§3 "Vector store record").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFileMeta {
    pub id: FileId,
    pub content_hash: String,
}

impl IndexedFileMeta {
    pub fn new(id: impl Into<FileId>, content_hash: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_hash: content_hash.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_becomes_forward_slash_id() {
        let root = Path::new("/proj");
        let abs = Path::new("/proj/src/main.py");
        assert_eq!(file_id(root, abs), "src/main.py");
    }

    #[test]
    fn path_outside_root_falls_back_to_absolute() {
        let root = Path::new("/proj");
        let abs = Path::new("/other/main.py");
        assert_eq!(file_id(root, abs), "/other/main.py");
    }
}
