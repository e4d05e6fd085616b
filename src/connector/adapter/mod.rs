mod ann_index;
mod dependency_extractor;
mod dependency_graph;
mod file_discovery;
mod http_embedding_client;
mod import_resolver;
mod mock_embedding_client;
mod notify_watcher;
mod vector_store;

pub use ann_index::*;
pub use dependency_extractor::*;
pub use dependency_graph::*;
pub use file_discovery::*;
pub use http_embedding_client::*;
pub use import_resolver::*;
pub use mock_embedding_client::*;
pub use notify_watcher::*;
pub use vector_store::*;
