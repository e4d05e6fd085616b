use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::connector::adapter::AnnIndex;
use crate::domain::{FileId, IndexError, IndexedFileMeta};

const INDEX_FILE: &str = "faiss.idx";
const SIDECAR_FILE: &str = "meta_plus.bin";

/// On-disk shape of the sidecar (§6): `{handleToMeta, pathToHandle,
/// nextHandle}`. `bincode` gives us the "tagged length-prefixed structure"
/// the spec asks for without requiring format compatibility across
/// implementations.
#[derive(Serialize, Deserialize)]
struct Sidecar {
    handle_to_meta: HashMap<i64, IndexedFileMeta>,
    path_to_handle: HashMap<FileId, i64>,
    next_handle: i64,
}

struct VectorStoreState {
    index: AnnIndex,
    path_to_handle: HashMap<FileId, i64>,
    handle_to_meta: HashMap<i64, IndexedFileMeta>,
    next_handle: i64,
}

/// Persisted identity-mapped dense-vector index with metadata sidecar
/// (§4.1). Cheap to `Clone` — clones share the same backing state — which
/// lets [`crate::application::Indexer::build_index`] hold a reference to the
/// outgoing store while it builds a replacement, without pinning the coarse
/// indexer lock for the embedding calls in between.
#[derive(Clone)]
pub struct VectorStore {
    cache_dir: PathBuf,
    dimension: usize,
    state: Arc<RwLock<VectorStoreState>>,
}

impl VectorStore {
    /// Construct a fresh, empty store backed by `cache_dir` without touching
    /// disk. Used by `build_index` for the replacement store (§4.6) and by
    /// [`Self::load`] when no prior artifacts exist.
    pub fn empty(cache_dir: PathBuf, dimension: usize) -> Result<Self, IndexError> {
        let index = AnnIndex::new(dimension)?;
        Ok(Self {
            cache_dir,
            dimension,
            state: Arc::new(RwLock::new(VectorStoreState {
                index,
                path_to_handle: HashMap::new(),
                handle_to_meta: HashMap::new(),
                next_handle: 0,
            })),
        })
    }

    /// Load from `cache_dir`, falling back to an empty store when the
    /// artifacts are missing, unreadable, or dimension-mismatched (§4.1).
    pub fn load(cache_dir: PathBuf, dimension: usize) -> Result<Self, IndexError> {
        let index_path = cache_dir.join(INDEX_FILE);
        let sidecar_path = cache_dir.join(SIDECAR_FILE);

        if index_path.exists() && sidecar_path.exists() {
            match Self::try_load(&cache_dir, dimension) {
                Ok(store) => return Ok(store),
                Err(e) => warn!(error = %e, "failed to load vector store, starting empty"),
            }
        }
        Self::empty(cache_dir, dimension)
    }

    fn try_load(cache_dir: &std::path::Path, dimension: usize) -> Result<Self, IndexError> {
        let index = AnnIndex::read(&cache_dir.join(INDEX_FILE), dimension)?;
        let bytes = fs::read(cache_dir.join(SIDECAR_FILE))?;
        let (sidecar, _): (Sidecar, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| IndexError::store(format!("failed to decode sidecar: {e}")))?;

        let store = Self {
            cache_dir: cache_dir.to_path_buf(),
            dimension,
            state: Arc::new(RwLock::new(VectorStoreState {
                index,
                path_to_handle: sidecar.path_to_handle,
                handle_to_meta: sidecar.handle_to_meta,
                next_handle: sidecar.next_handle,
            })),
        };
        store.clean_stale_handles();
        Ok(store)
    }

    /// Drop any mapping whose handle the index can no longer reconstruct.
    /// Run once right after `load()` per §4.1.
    fn clean_stale_handles(&self) {
        let mut state = self.state.write().expect("vector store lock poisoned");
        let stale: Vec<i64> = state
            .handle_to_meta
            .keys()
            .copied()
            .filter(|&handle| state.index.reconstruct(handle).is_err())
            .collect();
        for handle in stale {
            if let Some(meta) = state.handle_to_meta.remove(&handle) {
                state.path_to_handle.remove(&meta.id);
                warn!(handle, id = %meta.id, "dropped stale vector-store mapping at load");
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> u64 {
        self.state.read().expect("vector store lock poisoned").index.ntotal()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `add(id, contentHash, vector)` (§4.1). Removes any prior entry for
    /// `id` first so handles are never silently orphaned.
    pub fn add(
        &self,
        id: impl Into<FileId>,
        content_hash: impl Into<String>,
        vector: &[f32],
    ) -> Result<(), IndexError> {
        let id = id.into();
        self.remove_by_path(&id);

        let mut state = self.state.write().expect("vector store lock poisoned");
        let handle = state.next_handle;
        state.next_handle += 1;
        state.index.add_with_id(handle, vector)?;
        state.path_to_handle.insert(id.clone(), handle);
        state
            .handle_to_meta
            .insert(handle, IndexedFileMeta::new(id, content_hash));
        Ok(())
    }

    /// `remove_by_path(id) -> bool` (§4.1). Index-removal failures are
    /// logged and do not prevent the map cleanup (§7 "Store error").
    pub fn remove_by_path(&self, id: &str) -> bool {
        let mut state = self.state.write().expect("vector store lock poisoned");
        let handle = match state.path_to_handle.remove(id) {
            Some(handle) => handle,
            None => return false,
        };
        state.handle_to_meta.remove(&handle);
        if let Err(e) = state.index.remove_ids(&[handle]) {
            warn!(error = %e, id, handle, "ann index removal failed; maps already cleaned");
        }
        true
    }

    pub fn get_meta(&self, id: &str) -> Option<IndexedFileMeta> {
        let state = self.state.read().expect("vector store lock poisoned");
        let handle = *state.path_to_handle.get(id)?;
        state.handle_to_meta.get(&handle).cloned()
    }

    /// `get_vector(id) -> vector | ⊥` (§4.1). A stale handle (one the index
    /// can no longer reconstruct) is cleaned up on the spot and treated as
    /// absent.
    pub fn get_vector(&self, id: &str) -> Option<Vec<f32>> {
        let handle = {
            let state = self.state.read().expect("vector store lock poisoned");
            *state.path_to_handle.get(id)?
        };
        let reconstructed = {
            let state = self.state.read().expect("vector store lock poisoned");
            state.index.reconstruct(handle)
        };
        match reconstructed {
            Ok(vector) => Some(vector),
            Err(_) => {
                let mut state = self.state.write().expect("vector store lock poisoned");
                state.path_to_handle.remove(id);
                state.handle_to_meta.remove(&handle);
                warn!(handle, id, "stale handle on get_vector; mapping dropped");
                None
            }
        }
    }

    /// `search(query, k)` (§4.1): L2 distance, lowest first, entries with a
    /// removed handle skipped, result length at most `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(FileId, f32)>, IndexError> {
        let state = self.state.read().expect("vector store lock poisoned");
        let (distances, labels) = state.index.search(query, k)?;
        let results = labels
            .into_iter()
            .zip(distances)
            .filter(|(handle, _)| *handle >= 0)
            .filter_map(|(handle, score)| {
                state
                    .handle_to_meta
                    .get(&handle)
                    .map(|meta| (meta.id.clone(), score))
            })
            .collect();
        Ok(results)
    }

    /// Snapshot of `{id -> contentHash}`, used by `build_index` to decide
    /// which files can skip re-embedding (§4.6).
    pub fn snapshot_hashes(&self) -> HashMap<FileId, String> {
        let state = self.state.read().expect("vector store lock poisoned");
        state
            .handle_to_meta
            .values()
            .map(|meta| (meta.id.clone(), meta.content_hash.clone()))
            .collect()
    }

    /// Atomically persist the index binary and metadata sidecar
    /// (write-to-temp + rename, §4.1).
    pub fn flush(&self) -> Result<(), IndexError> {
        fs::create_dir_all(&self.cache_dir)?;
        let state = self.state.read().expect("vector store lock poisoned");

        let index_tmp = self.cache_dir.join(format!("{INDEX_FILE}.tmp"));
        let index_path = self.cache_dir.join(INDEX_FILE);
        state.index.write(&index_tmp)?;
        fs::rename(&index_tmp, &index_path)?;

        let sidecar = Sidecar {
            handle_to_meta: state.handle_to_meta.clone(),
            path_to_handle: state.path_to_handle.clone(),
            next_handle: state.next_handle,
        };
        let bytes = bincode::serde::encode_to_vec(&sidecar, bincode::config::standard())
            .map_err(|e| IndexError::store(format!("failed to encode sidecar: {e}")))?;
        let sidecar_tmp = self.cache_dir.join(format!("{SIDECAR_FILE}.tmp"));
        let sidecar_path = self.cache_dir.join(SIDECAR_FILE);
        fs::write(&sidecar_tmp, bytes)?;
        fs::rename(&sidecar_tmp, &sidecar_path)?;

        debug!(vectors = state.index.ntotal(), dir = %self.cache_dir.display(), "flushed vector store");
        Ok(())
    }
}
