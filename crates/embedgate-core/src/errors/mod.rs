mod embedding_error;

pub use embedding_error::EmbeddingError;

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
