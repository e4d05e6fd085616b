mod embedding_client;

pub use embedding_client::*;
