/// Errors surfaced by the embedding dispatch layer.
///
/// The first three variants are the shared taxonomy every provider client
/// maps its failures onto. Only `Transient` is retried; `BatchTooLarge` is
/// handled by the service manager's rebatch path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    #[error("{reason}")]
    Transient { reason: String },

    #[error("{reason}")]
    NonTransient { reason: String },

    #[error("{reason}")]
    BatchTooLarge { reason: String },

    #[error("CanonicalModel: {model} not registered yet, supported models are: [{}]", supported.join(", "))]
    ModelNotRegistered {
        model: String,
        supported: Vec<String>,
    },

    #[error("invalid embedding config: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    pub fn non_transient(reason: impl Into<String>) -> Self {
        Self::NonTransient {
            reason: reason.into(),
        }
    }

    pub fn batch_too_large(reason: impl Into<String>) -> Self {
        Self::BatchTooLarge {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_batch_too_large(&self) -> bool {
        matches!(self, Self::BatchTooLarge { .. })
    }
}
