use std::fmt;

use serde::{Deserialize, Serialize};

/// Isolation axis for traffic. Each tier has its own workload parameters,
/// clients, and metrics so query latency is unaffected by ingestion load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTier {
    CollectionScan,
    ChangeStream,
    Query,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 3] = [Self::CollectionScan, Self::ChangeStream, Self::Query];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectionScan => "COLLECTION_SCAN",
            Self::ChangeStream => "CHANGE_STREAM",
            Self::Query => "QUERY",
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedding vendor serving a canonical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingProvider {
    AwsBedrock,
    Cohere,
    Voyage,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsBedrock => "AWS_BEDROCK",
            Self::Cohere => "COHERE",
            Self::Voyage => "VOYAGE",
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
