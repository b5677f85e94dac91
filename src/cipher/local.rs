//! AES-256-GCM cipher with a process-local key
//!
//! The key is read from `WATSON_LOCAL_CIPHER_KEY` (base64, 32 bytes). Each
//! encryption draws a fresh random nonce, stored in front of the sealed
//! bytes so that a single blob carries everything needed to decrypt it:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```

use super::{Cipher, CipherKind};
use crate::config::CipherConfig;
use crate::errors::{Result, WatsonError};
use async_trait::async_trait;
use base64::Engine;
use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use zeroize::Zeroizing;

/// Size of AES-256-GCM nonce in bytes
const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
const TAG_SIZE: usize = 16;

const KEY_SIZE: usize = 32;

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self { nonce: Some(nonce_bytes) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// Local AES-256-GCM cipher
#[derive(Clone)]
pub struct LocalCipher {
    key_bytes: Arc<Zeroizing<[u8; KEY_SIZE]>>,
    rng: Arc<SystemRandom>,
}

impl LocalCipher {
    /// Build from a base64-encoded 32-byte key
    pub fn from_base64_key(key_base64: &str) -> Result<Self> {
        let key_bytes = Zeroizing::new(
            base64::engine::general_purpose::STANDARD.decode(key_base64.trim()).map_err(|e| {
                WatsonError::config(format!("Invalid base64 in WATSON_LOCAL_CIPHER_KEY: {}", e))
            })?,
        );

        if key_bytes.len() != KEY_SIZE {
            return Err(WatsonError::config(format!(
                "WATSON_LOCAL_CIPHER_KEY must be 32 bytes (256 bits), got {} bytes",
                key_bytes.len()
            )));
        }

        let mut key_array = Zeroizing::new([0u8; KEY_SIZE]);
        key_array.copy_from_slice(&key_bytes);

        debug!("Local cipher initialized");

        Ok(Self { key_bytes: Arc::new(key_array), rng: Arc::new(SystemRandom::new()) })
    }

    /// Build from cipher configuration
    pub fn from_config(config: &CipherConfig) -> Result<Self> {
        let key = config.local_key_base64.as_deref().ok_or_else(|| {
            WatsonError::config(
                "WATSON_LOCAL_CIPHER_KEY must be set when WATSON_CIPHER=local. \
                 Generate a key with: openssl rand -base64 32",
            )
        })?;
        Self::from_base64_key(key)
    }

    fn unbound_key(&self) -> Result<UnboundKey> {
        UnboundKey::new(&AES_256_GCM, &self.key_bytes[..]).map_err(|_| {
            error!("Failed to create cipher key");
            WatsonError::cipher("Failed to create cipher key")
        })
    }
}

#[async_trait]
impl Cipher for LocalCipher {
    #[instrument(skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng.fill(&mut nonce_bytes).map_err(|_| {
            error!("Failed to generate random nonce");
            WatsonError::cipher("Failed to generate random nonce for encryption")
        })?;

        let mut sealing_key = aead::SealingKey::new(self.unbound_key()?, SingleNonce::new(nonce_bytes));

        let mut sealed = plaintext.to_vec();
        sealed.reserve(TAG_SIZE);
        sealing_key.seal_in_place_append_tag(Aad::empty(), &mut sealed).map_err(|_| {
            error!("Encryption failed");
            WatsonError::cipher("Failed to encrypt value")
        })?;

        let mut output = Vec::with_capacity(NONCE_SIZE + sealed.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    #[instrument(skip(self, ciphertext), fields(ciphertext_len = ciphertext.len()))]
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(WatsonError::cipher(
                "Ciphertext too short (missing nonce or authentication tag)",
            ));
        }

        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        let mut opening_key = aead::OpeningKey::new(self.unbound_key()?, SingleNonce::new(nonce_bytes));

        let mut buffer = sealed.to_vec();
        let decrypted = opening_key.open_in_place(Aad::empty(), &mut buffer).map_err(|_| {
            error!("Decryption failed - possible tampering or wrong key");
            WatsonError::cipher("Failed to decrypt value - authentication failed")
        })?;

        Ok(decrypted.to_vec())
    }

    fn kind(&self) -> CipherKind {
        CipherKind::Local
    }
}

impl std::fmt::Debug for LocalCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCipher").field("key_bytes", &"[REDACTED]").finish()
    }
}
