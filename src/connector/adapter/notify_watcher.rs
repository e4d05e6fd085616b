use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, warn};

use crate::domain::{FsEvent, IndexError};

/// Real filesystem watcher (§4.5 "FsWatcher"), translating `notify` events
/// into the crate's own [`FsEvent`] domain type. Rename events that some
/// platforms split into a separate `From` and `To` notification are paired
/// into a single [`FsEvent::moved`]; a `From` with no matching `To` (the
/// file was renamed outside the watched tree) degrades to a delete.
pub struct NotifyWatcher {
    _watcher: RecommendedWatcher,
    receiver: UnboundedReceiver<FsEvent>,
}

impl NotifyWatcher {
    /// Start watching `root` recursively, forwarding translated events on an
    /// internal unbounded channel.
    pub fn watch(root: impl AsRef<Path>) -> Result<Self, IndexError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending_rename_from: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => Self::handle_event(event, &sender, &pending_rename_from),
                Err(e) => error!(error = %e, "NotifyWatcher: underlying watch error"),
            }
        })
        .map_err(|e| IndexError::internal(format!("failed to construct watcher: {e}")))?;

        watcher
            .watch(root.as_ref(), RecursiveMode::Recursive)
            .map_err(|e| IndexError::internal(format!("failed to watch {}: {e}", root.as_ref().display())))?;

        Ok(Self {
            _watcher: watcher,
            receiver,
        })
    }

    /// Receive the next translated event, or `None` once the watcher and all
    /// its senders have been dropped.
    pub async fn recv(&mut self) -> Option<FsEvent> {
        self.receiver.recv().await
    }

    fn handle_event(
        event: notify::Event,
        sender: &mpsc::UnboundedSender<FsEvent>,
        pending_rename_from: &Arc<Mutex<Option<PathBuf>>>,
    ) {
        match event.kind {
            EventKind::Create(_) => {
                for path in event.paths {
                    let _ = sender.send(FsEvent::created(path));
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                if let Some(path) = event.paths.into_iter().next() {
                    let mut pending = pending_rename_from.lock().unwrap();
                    if let Some(stale) = pending.replace(path) {
                        warn!(path = %stale.display(), "NotifyWatcher: rename-from with no matching rename-to, treating as delete");
                        let _ = sender.send(FsEvent::deleted(stale));
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                if let Some(dst) = event.paths.into_iter().next() {
                    let src = pending_rename_from.lock().unwrap().take();
                    match src {
                        Some(src) => {
                            let _ = sender.send(FsEvent::moved(src, dst));
                        }
                        None => {
                            let _ = sender.send(FsEvent::created(dst));
                        }
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut paths = event.paths.into_iter();
                if let (Some(src), Some(dst)) = (paths.next(), paths.next()) {
                    let _ = sender.send(FsEvent::moved(src, dst));
                }
            }
            EventKind::Modify(_) => {
                for path in event.paths {
                    let _ = sender.send(FsEvent::modified(path));
                }
            }
            EventKind::Remove(_) => {
                for path in event.paths {
                    let _ = sender.send(FsEvent::deleted(path));
                }
            }
            EventKind::Any | EventKind::Access(_) | EventKind::Other => {}
        }
    }
}
