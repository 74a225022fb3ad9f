//! Voyage embeddings API wire format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const ENCODING_FORMAT_BASE64: &str = "base64";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub input_type: String,
    pub model: String,
    pub input: Vec<String>,
    pub encoding_format: String,
    pub truncation: bool,
}

impl EmbedRequest {
    pub fn new(model: &str, input_type: &str, input: Vec<String>, truncation: bool) -> Self {
        Self {
            input_type: input_type.to_string(),
            model: model.to_string(),
            input,
            encoding_format: ENCODING_FORMAT_BASE64.to_string(),
            truncation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub object: String,
    pub data: Vec<EmbedVector>,
    pub usage: EmbedUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedVector {
    #[serde(default)]
    pub object: String,
    /// Base64 of little-endian `f32`s.
    pub embedding: String,
    pub index: usize,
}

impl EmbedVector {
    pub fn decode(&self) -> Result<Vec<f32>, String> {
        decode_embedding(&self.embedding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedUsage {
    pub total_tokens: u64,
}

/// Decode a base64 string of little-endian `f32`s.
pub fn decode_embedding(encoded: &str) -> Result<Vec<f32>, String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| format!("Invalid format for embedding value: {e}"))?;
    if bytes.len() % 4 != 0 {
        return Err(format!(
            "Invalid format for embedding value: {} bytes is not a whole number of floats",
            bytes.len()
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Inverse of `decode_embedding`.
pub fn encode_embedding(vector: &[f32]) -> String {
    let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}
