use std::path::PathBuf;

/// The four event kinds a [`FsWatcher`](crate::application::FsWatcher) can
/// deliver (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

/// A single filesystem change event. `dst` is only populated for
/// [`FsEventKind::Moved`]; it carries the destination absolute path while
/// `src` carries the source.
#[derive(Debug, Clone)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub src: PathBuf,
    pub dst: Option<PathBuf>,
}

impl FsEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Created,
            src: path.into(),
            dst: None,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Modified,
            src: path.into(),
            dst: None,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Deleted,
            src: path.into(),
            dst: None,
        }
    }

    pub fn moved(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::Moved,
            src: src.into(),
            dst: Some(dst.into()),
        }
    }
}
