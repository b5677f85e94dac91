//! # Cipher Wrappers
//!
//! Pluggable encrypt/decrypt capability protecting sensitive output values
//! at rest. Exactly one variant is active per process, chosen by
//! configuration (`WATSON_CIPHER`):
//!
//! - **fail**: rejects every call, so sensitive values are never stored in
//!   clear text when nothing was configured
//! - **rot13**: involutive test cipher that only exercises the plumbing
//! - **local**: AES-256-GCM with a process-local key
//! - **aws-kms**: AWS KMS `Encrypt`/`Decrypt` (requires the `aws` feature)
//!
//! [`CipherFactory`] resolves the active variant on every use unless caching
//! is enabled, so the selection can be swapped at runtime.

pub mod fail;
pub mod local;
pub mod rot13;

#[cfg(feature = "aws")]
pub mod aws_kms;

pub use fail::FailCipher;
pub use local::LocalCipher;
pub use rot13::Rot13Cipher;

#[cfg(feature = "aws")]
pub use aws_kms::AwsKmsCipher;

use crate::config::CipherConfig;
use crate::errors::{Result, WatsonError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Known cipher variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherKind {
    /// Unconfigured: every call fails
    Fail,
    /// ROT13 over ASCII letters, for tests only
    Rot13,
    /// AES-256-GCM with a local key
    Local,
    /// AWS Key Management Service
    AwsKms,
}

impl CipherKind {
    /// Configuration representation of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Rot13 => "rot13",
            Self::Local => "local",
            Self::AwsKms => "aws-kms",
        }
    }
}

impl FromStr for CipherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Self::Fail),
            "rot13" => Ok(Self::Rot13),
            "local" => Ok(Self::Local),
            "aws-kms" => Ok(Self::AwsKms),
            _ => Err(format!("Unknown cipher: {}", s)),
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encrypt/decrypt capability for sensitive values
///
/// Implementations must be Send + Sync for use in async contexts. Failures
/// are returned as-is; callers never fall back to plaintext.
#[async_trait]
pub trait Cipher: Send + Sync + fmt::Debug {
    /// Encrypt plaintext bytes
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt bytes previously produced by [`Cipher::encrypt`]
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Variant identifier
    fn kind(&self) -> CipherKind;
}

/// Builds the configured cipher on demand
#[derive(Debug)]
pub struct CipherFactory {
    config: RwLock<CipherConfig>,
    cached: RwLock<Option<Arc<dyn Cipher>>>,
}

impl CipherFactory {
    /// Create a factory for the given configuration
    pub fn new(config: CipherConfig) -> Self {
        Self { config: RwLock::new(config), cached: RwLock::new(None) }
    }

    /// Factory for a variant that needs no parameters
    pub fn for_kind(kind: CipherKind) -> Self {
        Self::new(CipherConfig::with_kind(kind))
    }

    /// Currently selected variant
    pub fn kind(&self) -> CipherKind {
        self.current_config().kind
    }

    /// Resolve the cipher for one operation
    pub async fn cipher(&self) -> Result<Arc<dyn Cipher>> {
        let config = self.current_config();

        if config.cache {
            let cached = self.cached.read().unwrap_or_else(|e| e.into_inner()).clone();
            if let Some(cipher) = cached {
                return Ok(cipher);
            }
        }

        let cipher = build_cipher(&config).await?;
        debug!(cipher = %cipher.kind(), cached = config.cache, "Resolved cipher");

        if config.cache {
            *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(cipher.clone());
        }

        Ok(cipher)
    }

    /// Swap the active configuration, dropping any cached instance
    pub fn reconfigure(&self, config: CipherConfig) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn current_config(&self) -> CipherConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for CipherFactory {
    fn default() -> Self {
        Self::new(CipherConfig::default())
    }
}

async fn build_cipher(config: &CipherConfig) -> Result<Arc<dyn Cipher>> {
    match config.kind {
        CipherKind::Fail => Ok(Arc::new(FailCipher)),
        CipherKind::Rot13 => Ok(Arc::new(Rot13Cipher)),
        CipherKind::Local => Ok(Arc::new(LocalCipher::from_config(config)?)),
        CipherKind::AwsKms => build_aws_kms(config).await,
    }
}

#[cfg(feature = "aws")]
async fn build_aws_kms(config: &CipherConfig) -> Result<Arc<dyn Cipher>> {
    Ok(Arc::new(AwsKmsCipher::from_config(config).await?))
}

#[cfg(not(feature = "aws"))]
async fn build_aws_kms(_config: &CipherConfig) -> Result<Arc<dyn Cipher>> {
    Err(WatsonError::config(
        "WATSON_CIPHER=aws-kms requires watson to be built with the `aws` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [CipherKind::Fail, CipherKind::Rot13, CipherKind::Local, CipherKind::AwsKms] {
            let parsed: CipherKind = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("aes".parse::<CipherKind>().is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&CipherKind::AwsKms).unwrap();
        assert_eq!(json, "\"aws-kms\"");
        let parsed: CipherKind = serde_json::from_str("\"rot13\"").unwrap();
        assert_eq!(parsed, CipherKind::Rot13);
    }

    #[tokio::test]
    async fn test_factory_defaults_to_fail() {
        let factory = CipherFactory::default();
        let cipher = factory.cipher().await.unwrap();
        assert_eq!(cipher.kind(), CipherKind::Fail);
        assert!(cipher.encrypt(b"secret").await.is_err());
    }

    #[tokio::test]
    async fn test_factory_reconfigure_swaps_variant() {
        let factory = CipherFactory::for_kind(CipherKind::Fail);
        assert_eq!(factory.cipher().await.unwrap().kind(), CipherKind::Fail);

        factory.reconfigure(CipherConfig::with_kind(CipherKind::Rot13));
        assert_eq!(factory.kind(), CipherKind::Rot13);
        assert_eq!(factory.cipher().await.unwrap().kind(), CipherKind::Rot13);
    }

    #[tokio::test]
    async fn test_factory_cache_reuses_instance() {
        let config = CipherConfig { cache: true, ..CipherConfig::with_kind(CipherKind::Rot13) };
        let factory = CipherFactory::new(config);

        let first = factory.cipher().await.unwrap();
        let second = factory.cipher().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        factory.reconfigure(CipherConfig { cache: true, ..CipherConfig::with_kind(CipherKind::Fail) });
        let third = factory.cipher().await.unwrap();
        assert_eq!(third.kind(), CipherKind::Fail);
    }

    #[tokio::test]
    async fn test_factory_without_cache_builds_fresh() {
        let factory = CipherFactory::for_kind(CipherKind::Rot13);
        let first = factory.cipher().await.unwrap();
        let second = factory.cipher().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_local_without_key_is_config_error() {
        let factory = CipherFactory::for_kind(CipherKind::Local);
        let err = factory.cipher().await.unwrap_err();
        assert!(matches!(err, WatsonError::Config { .. }));
    }

    #[cfg(not(feature = "aws"))]
    #[tokio::test]
    async fn test_aws_kms_requires_feature() {
        let config = CipherConfig {
            kms_key_id: Some("alias/watson".to_string()),
            ..CipherConfig::with_kind(CipherKind::AwsKms)
        };
        let err = CipherFactory::new(config).cipher().await.unwrap_err();
        assert!(matches!(err, WatsonError::Config { .. }));
    }
}
