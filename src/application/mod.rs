pub mod indexer;
pub mod interfaces;

pub use indexer::*;
pub use interfaces::*;
