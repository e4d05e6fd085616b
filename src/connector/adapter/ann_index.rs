use std::path::Path;

use faiss::index::{Idx, IndexImpl};
use faiss::selector::IdSelector;
use faiss::{read_index, write_index, Index, MetricType};
use tracing::debug;

use crate::domain::IndexError;

/// The factory string for the one index type this store ever creates:
/// `IDMap2` gives add-with-id / remove-by-id on top of a flat, untrained,
/// exact-L2 inner index. No training step is required, which keeps
/// construction synchronous (§4.1 design note in DESIGN.md).
const FACTORY_STRING: &str = "IDMap2,Flat";

/// Thin wrapper over the vector-index library's `Index` trait: the one seam
/// where this crate talks to FAISS directly. Everything above this layer
/// (handle allocation, path maps, flush/load framing) lives in
/// [`super::VectorStore`].
pub struct AnnIndex {
    index: IndexImpl,
}

impl AnnIndex {
    pub fn new(dimension: usize) -> Result<Self, IndexError> {
        let index = faiss::index_factory(dimension as u32, FACTORY_STRING, MetricType::L2)
            .map_err(|e| IndexError::store(format!("failed to create ann index: {e}")))?;
        Ok(Self { index })
    }

    pub fn ntotal(&self) -> u64 {
        self.index.ntotal()
    }

    pub fn add_with_id(&mut self, handle: i64, vector: &[f32]) -> Result<(), IndexError> {
        let idx = [Idx::from(handle)];
        self.index
            .add_with_ids(vector, &idx)
            .map_err(|e| IndexError::store(format!("add_with_ids failed: {e}")))
    }

    /// Remove a batch of handles. Returns the number actually removed
    /// (FAISS silently ignores handles that are not present).
    pub fn remove_ids(&mut self, handles: &[i64]) -> Result<usize, IndexError> {
        if handles.is_empty() {
            return Ok(0);
        }
        let idxs: Vec<Idx> = handles.iter().map(|&h| Idx::from(h)).collect();
        let selector = IdSelector::batch(&idxs)
            .map_err(|e| IndexError::store(format!("failed to build id selector: {e}")))?;
        self.index
            .remove_ids(&selector)
            .map_err(|e| IndexError::store(format!("remove_ids failed: {e}")))
    }

    /// Reconstruct the stored vector for `handle`. Returns an error when the
    /// handle is not (or no longer) present in the index; callers treat that
    /// as the "stale handle" case in §7.
    pub fn reconstruct(&self, handle: i64) -> Result<Vec<f32>, IndexError> {
        self.index
            .reconstruct(handle)
            .map_err(|e| IndexError::store(format!("reconstruct failed for handle {handle}: {e}")))
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>), IndexError> {
        if k == 0 || self.index.ntotal() == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let result = self
            .index
            .search(query, k)
            .map_err(|e| IndexError::store(format!("search failed: {e}")))?;
        let labels = result
            .labels
            .into_iter()
            .map(|idx| idx.get().map(|u| u as i64).unwrap_or(-1))
            .collect();
        Ok((result.distances, labels))
    }

    pub fn write(&self, path: &Path) -> Result<(), IndexError> {
        write_index(&self.index, &path.to_string_lossy())
            .map_err(|e| IndexError::store(format!("failed to write index: {e}")))
    }

    /// Load an index from disk, verifying its dimension matches `dimension`.
    /// A mismatch is reported as a store error so the caller can fall back
    /// to an empty store per §4.1's "vector-dimension mismatch is fatal for
    /// the loaded data only" policy.
    pub fn read(path: &Path, dimension: usize) -> Result<Self, IndexError> {
        let index = read_index(&path.to_string_lossy())
            .map_err(|e| IndexError::store(format!("failed to read index: {e}")))?;
        if index.d() as usize != dimension {
            return Err(IndexError::store(format!(
                "index dimension {} does not match configured dimension {}",
                index.d(),
                dimension
            )));
        }
        debug!(vectors = index.ntotal(), "loaded ann index from disk");
        Ok(Self { index })
    }
}
