//! A local background indexing core for a code-chat daemon: discovers
//! project files, extracts cross-file import dependencies per language,
//! maintains a persisted nearest-neighbour vector index over file
//! embeddings, and answers dependency and semantic-similarity queries.
//!
//! The HTTP surface, the conversational layer, and everything downstream
//! of [`application::Indexer::query`] are out of scope here; this crate
//! only exposes the collaborator seams those layers would call through.

pub mod application;
pub mod config;
pub mod connector;
pub mod domain;

pub use application::*;
pub use config::*;
pub use connector::*;
pub use domain::*;
