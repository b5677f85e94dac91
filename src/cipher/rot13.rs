use super::{Cipher, CipherKind};
use crate::errors::Result;
use async_trait::async_trait;

/// ROT13 over ASCII letters. Not secure; used to test the encryption path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rot13Cipher;

fn rot13(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .map(|&b| match b {
            b'a'..=b'z' => (b - b'a' + 13) % 26 + b'a',
            b'A'..=b'Z' => (b - b'A' + 13) % 26 + b'A',
            other => other,
        })
        .collect()
}

#[async_trait]
impl Cipher for Rot13Cipher {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(rot13(plaintext))
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(rot13(ciphertext))
    }

    fn kind(&self) -> CipherKind {
        CipherKind::Rot13
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rot13_known_value() {
        assert_eq!(rot13(b"Hello, World!"), b"Uryyb, Jbeyq!".to_vec());
    }

    #[tokio::test]
    async fn test_rot13_is_involutive() {
        let cipher = Rot13Cipher;
        for msg in [&b""[..], b"test", b"\"secret\"", &[0xff, 0x00, b'q']] {
            let encrypted = cipher.encrypt(msg).await.unwrap();
            assert_eq!(cipher.decrypt(&encrypted).await.unwrap(), msg);
        }
    }

    #[tokio::test]
    async fn test_rot13_changes_letters() {
        let encrypted = Rot13Cipher.encrypt(b"secret").await.unwrap();
        assert_ne!(encrypted, b"secret".to_vec());
    }
}
