use serde::{Deserialize, Serialize};

/// Message used for texts that are empty and therefore never sent to a provider.
pub const EMPTY_INPUT_ERROR: &str = "Cannot embed empty string";

/// Per-text outcome of an embedding call.
///
/// A batch call can succeed overall while individual texts fail; those
/// failures travel positionally alongside the successful vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorOrError {
    Vector(Vec<f32>),
    Error(String),
}

impl VectorOrError {
    pub fn empty_input() -> Self {
        Self::Error(EMPTY_INPUT_ERROR.to_string())
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Vector(_) => None,
            Self::Error(e) => Some(e),
        }
    }
}

impl From<Vec<f32>> for VectorOrError {
    fn from(v: Vec<f32>) -> Self {
        Self::Vector(v)
    }
}
