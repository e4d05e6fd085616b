//! # Domain Layer
//!
//! Core types shared by the indexing core: the typed error enum, the
//! per-language extraction table, and the small value types that flow
//! between components (file ids, content hashes, filesystem events).
//! This layer owns no I/O.

pub mod error;
pub mod hash;
pub mod models;

pub use error::*;
pub use hash::*;
pub use models::*;
