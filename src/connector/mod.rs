//! # Connector Layer
//!
//! Concrete adapters implementing the application-layer interfaces:
//! the FAISS-backed vector store, the tree-sitter dependency extractor,
//! the import resolver and dependency graph, VCS-aware file discovery,
//! a real filesystem watcher, and two `EmbeddingClient` implementations
//! (an HTTP-backed one and a deterministic mock for tests).

pub mod adapter;

pub use adapter::*;
