//! AWS KMS cipher
//!
//! Sends each value to KMS `Encrypt`/`Decrypt` under the configured key.
//! Credentials and region come from the default AWS provider chain; the
//! endpoint can be overridden for local emulators.

use super::{Cipher, CipherKind};
use crate::config::CipherConfig;
use crate::errors::{Result, WatsonError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::{primitives::Blob as KmsBlob, Client as KmsClient};
use tracing::{debug, error, instrument};

/// Cipher delegating to AWS Key Management Service
#[derive(Debug, Clone)]
pub struct AwsKmsCipher {
    client: KmsClient,
    key_id: String,
}

impl AwsKmsCipher {
    /// Build a KMS client from the shared AWS configuration
    pub async fn from_config(config: &CipherConfig) -> Result<Self> {
        let key_id = config.kms_key_id.clone().ok_or_else(|| {
            WatsonError::config("WATSON_AWSKMS_KEY_ID must be set when WATSON_CIPHER=aws-kms")
        })?;

        let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_kms::config::Builder::from(&shared_config);
        if let Some(endpoint) = config.kms_endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }

        debug!(key_id = %key_id, endpoint = ?config.kms_endpoint_url, "AWS KMS cipher initialized");

        Ok(Self { client: KmsClient::from_conf(builder.build()), key_id })
    }
}

#[async_trait]
impl Cipher for AwsKmsCipher {
    #[instrument(skip(self, plaintext), fields(key_id = %self.key_id))]
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let output = self
            .client
            .encrypt()
            .key_id(&self.key_id)
            .plaintext(KmsBlob::new(plaintext.to_vec()))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "KMS encrypt failed");
                WatsonError::cipher(format!("kms encrypt: {err}"))
            })?;

        output
            .ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| WatsonError::cipher("kms encrypt returned no ciphertext"))
    }

    #[instrument(skip(self, ciphertext), fields(key_id = %self.key_id))]
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let output = self
            .client
            .decrypt()
            .key_id(&self.key_id)
            .ciphertext_blob(KmsBlob::new(ciphertext.to_vec()))
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "KMS decrypt failed");
                WatsonError::cipher(format!("kms decrypt: {err}"))
            })?;

        output
            .plaintext()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| WatsonError::cipher("kms decrypt returned no plaintext"))
    }

    fn kind(&self) -> CipherKind {
        CipherKind::AwsKms
    }
}
