use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::EmbeddingClient;
use crate::connector::adapter::{DependencyGraph, FileDiscovery, VectorStore};
use crate::domain::{
    compute_content_hash, file_id, truncate_for_embedding, FileId, FsEvent, FsEventKind, IndexError,
};

/// Maximum characters of a file's content passed to the embedding client
/// (§4.6 "Embedding input policy").
const EMBEDDING_CHAR_LIMIT: usize = 8000;

struct IndexerState {
    store: VectorStore,
    graph: DependencyGraph,
}

/// Orchestrator (§4.6): owns a [`VectorStore`] and [`DependencyGraph`],
/// performs full rebuilds, reconciles individual filesystem events, and
/// answers queries. Guarded by a single coarse lock over its mutable state
/// (§5); the heavy, blocking-I/O-bound work (discovery, file reads, embedding
/// calls) happens outside that lock so concurrent queries stay responsive.
pub struct Indexer {
    root: PathBuf,
    cache_dir: PathBuf,
    dimension: usize,
    embedding_client: Arc<dyn EmbeddingClient>,
    discovery: FileDiscovery,
    state: tokio::sync::Mutex<IndexerState>,
}

impl Indexer {
    /// Construct an indexer rooted at `root`, backed by `cache_dir` for
    /// persistence. Loads any existing vector store from disk (§4.1
    /// `load()`); the dependency graph always starts empty until the first
    /// [`Self::build_index`].
    pub fn new(
        root: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        dimension: usize,
        embedding_client: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, IndexError> {
        let root = root.into();
        let cache_dir = cache_dir.into();
        let store = VectorStore::load(cache_dir.clone(), dimension)?;
        let graph = DependencyGraph::new(root.clone());
        let discovery = FileDiscovery::new(root.clone(), cache_dir.clone());

        Ok(Self {
            root,
            cache_dir,
            dimension,
            embedding_client,
            discovery,
            state: tokio::sync::Mutex::new(IndexerState { store, graph }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full rebuild (§4.6 `build_index`). Reuses vectors for files whose
    /// contentHash is unchanged from the outgoing store; re-embeds the rest.
    /// Replaces the live store and graph atomically once the new state is
    /// fully assembled.
    pub async fn build_index(&self) -> Result<(), IndexError> {
        let outgoing_store = {
            let state = self.state.lock().await;
            state.store.clone()
        };
        let snapshot = outgoing_store.snapshot_hashes();

        let discovery_root = self.root.clone();
        let discovery_cache_dir = self.cache_dir.clone();
        let files = tokio::task::spawn_blocking(move || {
            FileDiscovery::new(discovery_root, discovery_cache_dir).discover()
        })
        .await
        .map_err(|e| IndexError::internal(format!("discovery task panicked: {e}")))?;

        info!(count = files.len(), root = %self.root.display(), "build_index: discovered files");

        let new_store = VectorStore::empty(self.cache_dir.clone(), self.dimension)?;
        let mut embedded = 0u64;
        let mut reused = 0u64;

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {bar:40.green/dim} {pos}/{len} {msg:.dim}")
                .expect("invalid progress bar template")
                .progress_chars("━━─"),
        );

        for abs_path in &files {
            progress.inc(1);
            let id = file_id(&self.root, abs_path);
            let bytes = match tokio::fs::read(abs_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %abs_path.display(), error = %e, "build_index: failed to read file, skipping");
                    continue;
                }
            };
            let content_hash = compute_content_hash(&bytes);
            let previous_hash = snapshot.get(&id).cloned();

            let cached_vector = if previous_hash.as_deref() == Some(content_hash.as_str()) {
                outgoing_store.get_vector(&id)
            } else {
                None
            };

            // Stored alongside the vector actually written: the fresh hash on
            // the normal and cache-hit paths, but the *previous* hash when we
            // fall back to a stale vector, so the next build keeps retrying
            // the embedding instead of believing the stale vector is current.
            let (vector, stored_hash) = match cached_vector {
                Some(vector) => {
                    reused += 1;
                    (vector, content_hash.clone())
                }
                None => {
                    let text = truncate_for_embedding(&bytes, EMBEDDING_CHAR_LIMIT);
                    match self.embedding_client.embed(&text).await {
                        Ok(vector) => {
                            embedded += 1;
                            (vector, content_hash.clone())
                        }
                        Err(e) => {
                            // §7 "Embedding error": retain any previous vector for
                            // this id rather than dropping the file from the index.
                            match previous_hash.zip(outgoing_store.get_vector(&id)) {
                                Some((previous_hash, vector)) => {
                                    warn!(path = %abs_path.display(), error = %e, "build_index: embedding failed, retaining previous vector");
                                    (vector, previous_hash)
                                }
                                None => {
                                    warn!(path = %abs_path.display(), error = %e, "build_index: embedding failed, no previous vector to retain, skipping file");
                                    continue;
                                }
                            }
                        }
                    }
                }
            };

            new_store.add(id, stored_hash, &vector)?;
        }

        progress.finish_and_clear();
        new_store.flush()?;
        debug!(embedded, reused, "build_index: vector store rebuilt");

        let mut graph = DependencyGraph::new(self.root.clone());
        graph.build(&files);

        let mut state = self.state.lock().await;
        state.store = new_store;
        state.graph = graph;
        Ok(())
    }

    /// Granular update for a single filesystem event (§4.6 `process_event`).
    pub async fn process_event(&self, event: FsEvent) -> Result<(), IndexError> {
        match event.kind {
            FsEventKind::Created | FsEventKind::Modified => self.upsert(&event.src).await,
            FsEventKind::Deleted => self.delete(&event.src).await,
            FsEventKind::Moved => {
                let dst = event
                    .dst
                    .ok_or_else(|| IndexError::invalid_input("moved event missing dst path"))?;
                self.delete(&event.src).await?;
                self.upsert(&dst).await
            }
        }
    }

    async fn upsert(&self, abs_path: &Path) -> Result<(), IndexError> {
        if !self.discovery.is_relevant(abs_path) {
            debug!(path = %abs_path.display(), "process_event: path not relevant, dropping");
            return Ok(());
        }

        let id = file_id(&self.root, abs_path);
        let bytes = tokio::fs::read(abs_path).await?;
        let content_hash = compute_content_hash(&bytes);

        let unchanged = {
            let state = self.state.lock().await;
            state
                .store
                .get_meta(&id)
                .is_some_and(|meta| meta.content_hash == content_hash)
        };
        if unchanged {
            debug!(id, "process_event: content hash unchanged, no-op");
            return Ok(());
        }

        let text = truncate_for_embedding(&bytes, EMBEDDING_CHAR_LIMIT);
        let vector = match self.embedding_client.embed(&text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(id, error = %e, "process_event: embedding failed, skipping update");
                return Ok(());
            }
        };

        let mut state = self.state.lock().await;
        state.store.remove_by_path(&id);
        state.store.add(id, content_hash, &vector)?;
        state.store.flush()?;
        // Recomputes this file's own outgoing edges; a full rebuild remains
        // the only path that can discover new incoming edges from files
        // that haven't been re-scanned since `id` appeared.
        state.graph.add_or_update_file(abs_path);
        Ok(())
    }

    async fn delete(&self, abs_path: &Path) -> Result<(), IndexError> {
        let id = file_id(&self.root, abs_path);
        let mut state = self.state.lock().await;
        if state.store.remove_by_path(&id) {
            state.store.flush()?;
        }
        state.graph.remove_file(abs_path);
        Ok(())
    }

    /// `query(text, k)` (§4.6): embed `text` and return the nearest ids.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<(FileId, f32)>, IndexError> {
        let vector = self.embedding_client.embed(text).await?;
        let state = self.state.lock().await;
        state.store.search(&vector, k)
    }

    pub async fn direct_deps(&self, id: &str) -> std::collections::HashSet<FileId> {
        self.state.lock().await.graph.direct_deps(id)
    }

    pub async fn direct_dependents(&self, id: &str) -> std::collections::HashSet<FileId> {
        self.state.lock().await.graph.direct_dependents(id)
    }

    pub async fn all_deps(&self, id: &str) -> std::collections::HashSet<FileId> {
        self.state.lock().await.graph.all_deps(id)
    }

    pub async fn all_dependents(&self, id: &str) -> std::collections::HashSet<FileId> {
        self.state.lock().await.graph.all_dependents(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::adapter::MockEmbeddingClient;
    use std::fs;

    fn indexer_at(root: &Path, cache_dir: &Path, dimension: usize) -> Indexer {
        let client: Arc<dyn EmbeddingClient> = Arc::new(MockEmbeddingClient::new(dimension));
        Indexer::new(root, cache_dir, dimension, client).unwrap()
    }

    #[tokio::test]
    async fn build_index_links_simple_python_chain() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "import b\n").unwrap();
        fs::write(root.join("b.py"), "import c\n").unwrap();
        fs::write(root.join("c.py"), "").unwrap();

        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.build_index().await.unwrap();

        assert!(indexer.direct_deps("a.py").await.contains("b.py"));
        let all = indexer.all_deps("a.py").await;
        assert!(all.contains("b.py") && all.contains("c.py"));
        let dependents = indexer.all_dependents("c.py").await;
        assert!(dependents.contains("a.py") && dependents.contains("b.py"));
    }

    #[tokio::test]
    async fn query_returns_nearest_after_build() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "alpha").unwrap();
        fs::write(root.join("b.py"), "beta").unwrap();

        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.build_index().await.unwrap();

        let results = indexer.query("alpha", 5).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().any(|(id, _)| id == "a.py"));
    }

    #[tokio::test]
    async fn process_event_modified_twice_is_idempotent_on_unchanged_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let path = root.join("a.py");
        fs::write(&path, "import b").unwrap();

        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.process_event(FsEvent::modified(&path)).await.unwrap();
        let hash_after_first = indexer.state.lock().await.store.get_meta("a.py").unwrap().content_hash;

        indexer.process_event(FsEvent::modified(&path)).await.unwrap();
        let hash_after_second = indexer.state.lock().await.store.get_meta("a.py").unwrap().content_hash;
        assert_eq!(hash_after_first, hash_after_second);
    }

    #[tokio::test]
    async fn created_then_deleted_leaves_store_without_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let path = root.join("a.py");
        fs::write(&path, "content").unwrap();

        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.process_event(FsEvent::created(&path)).await.unwrap();
        assert!(indexer.state.lock().await.store.get_meta("a.py").is_some());

        fs::remove_file(&path).unwrap();
        indexer.process_event(FsEvent::deleted(&path)).await.unwrap();
        assert!(indexer.state.lock().await.store.get_meta("a.py").is_none());
    }

    #[tokio::test]
    async fn moved_event_relocates_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let src = root.join("a.py");
        let dst = root.join("renamed.py");
        fs::write(&src, "content").unwrap();

        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.build_index().await.unwrap();

        fs::rename(&src, &dst).unwrap();
        indexer.process_event(FsEvent::moved(&src, &dst)).await.unwrap();

        let state = indexer.state.lock().await;
        assert!(state.store.get_meta("a.py").is_none());
        assert!(state.store.get_meta("renamed.py").is_some());
    }

    #[tokio::test]
    async fn empty_project_builds_empty_store_and_graph() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let indexer = indexer_at(root, &root.join(".cache/codechat"), 8);
        indexer.build_index().await.unwrap();

        assert!(indexer.query("anything", 5).await.unwrap().is_empty());
        assert!(indexer.direct_deps("missing.py").await.is_empty());
    }
}
