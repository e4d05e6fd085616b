use thiserror::Error;

/// The crate's single error type. One family per error kind the indexer can
/// surface; conversions from the underlying I/O/library errors are derived
/// so call sites can use `?` and still end up with a typed variant.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("discovery error: {0}")]
    Discovery(String),

    #[error("extract error: {0}")]
    Extract(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IndexError {
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    pub fn is_embedding_error(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }
}
