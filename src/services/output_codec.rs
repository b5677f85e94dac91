//! Output value codec
//!
//! Plain outputs are stored as their logical JSON value. Sensitive outputs
//! are JSON-serialized, encrypted with the active cipher and stored as a
//! JSON string holding the base64 ciphertext:
//!
//! ```text
//! stored = "base64(encrypt(json(value)))"
//! ```
//!
//! Cipher failures propagate; nothing is ever stored or returned in clear
//! text for a sensitive output.

use crate::cipher::CipherFactory;
use crate::errors::{Result, WatsonError};
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Encodes logical output values into stored values and back
#[derive(Debug, Clone)]
pub struct OutputCodec {
    ciphers: Arc<CipherFactory>,
}

impl OutputCodec {
    pub fn new(ciphers: Arc<CipherFactory>) -> Self {
        Self { ciphers }
    }

    /// Turn a logical value into the JSON document to persist
    #[instrument(skip(self, value), name = "encode_output")]
    pub async fn encode(&self, value: &Value, sensitive: bool) -> Result<Value> {
        if !sensitive {
            return Ok(value.clone());
        }

        let plaintext = serde_json::to_vec(value)?;
        let cipher = self.ciphers.cipher().await?;
        let ciphertext = cipher.encrypt(&plaintext).await?;

        Ok(Value::String(base64::engine::general_purpose::STANDARD.encode(ciphertext)))
    }

    /// Recover the logical value from a persisted JSON document
    #[instrument(skip(self, stored), name = "decode_output")]
    pub async fn decode(&self, stored: &Value, sensitive: bool) -> Result<Value> {
        if !sensitive {
            return Ok(stored.clone());
        }

        let encoded = stored
            .as_str()
            .ok_or_else(|| WatsonError::cipher("Stored sensitive value is not an encoded string"))?;
        let ciphertext = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| WatsonError::cipher(format!("Stored sensitive value is not valid base64: {}", e)))?;

        let cipher = self.ciphers.cipher().await?;
        let plaintext = cipher.decrypt(&ciphertext).await?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| WatsonError::cipher(format!("Decrypted value is not valid JSON: {}", e)))
    }
}
