use super::{Cipher, CipherKind};
use crate::errors::{Result, WatsonError};
use async_trait::async_trait;

const NOT_CONFIGURED: &str = "No encryption cipher has been configured";

/// Cipher used when nothing was configured; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailCipher;

#[async_trait]
impl Cipher for FailCipher {
    async fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>> {
        Err(WatsonError::cipher(NOT_CONFIGURED))
    }

    async fn decrypt(&self, _ciphertext: &[u8]) -> Result<Vec<u8>> {
        Err(WatsonError::cipher(NOT_CONFIGURED))
    }

    fn kind(&self) -> CipherKind {
        CipherKind::Fail
    }
}
