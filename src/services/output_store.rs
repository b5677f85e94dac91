//! Output store
//!
//! CRUD over a stack's named outputs with the codec applied on the way in
//! and out. A batch is validated and fully encoded before the store
//! transaction opens, so a cipher failure leaves prior state untouched.

use super::output_codec::OutputCodec;
use crate::cipher::CipherFactory;
use crate::domain::output::non_empty;
use crate::domain::{validate_slug, OutputMap, OutputSpecs, OutputView, StackId};
use crate::errors::{Result, WatsonError};
use crate::storage::{DbPool, OutputRecord, OutputRepository};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads and writes a stack's outputs through the codec
#[derive(Debug, Clone)]
pub struct OutputStore {
    repository: OutputRepository,
    codec: OutputCodec,
}

impl OutputStore {
    pub fn new(pool: DbPool, ciphers: Arc<CipherFactory>) -> Self {
        Self { repository: OutputRepository::new(pool), codec: OutputCodec::new(ciphers) }
    }

    /// Validate every key, then encode every value
    #[instrument(skip(self, outputs), fields(count = outputs.len()), name = "encode_outputs")]
    pub async fn encode_batch(&self, outputs: &OutputSpecs) -> Result<Vec<OutputRecord>> {
        for key in outputs.keys() {
            validate_slug("key", key)?;
        }

        let mut records = Vec::with_capacity(outputs.len());
        for (key, spec) in outputs {
            let value = self.codec.encode(&spec.value, spec.sensitive).await?;
            records.push(OutputRecord {
                key: key.clone(),
                value,
                deprecated: non_empty(spec.deprecated.clone()),
                warning: non_empty(spec.warning.clone()),
                sensitive: spec.sensitive,
            });
        }

        Ok(records)
    }

    /// Decode every output of a stack
    #[instrument(skip(self), fields(stack_id = %stack_id), name = "read_outputs")]
    pub async fn read(&self, stack_id: &StackId) -> Result<OutputMap> {
        let records = self.repository.list_by_stack(stack_id).await?;
        debug!(count = records.len(), "Decoding outputs");

        let mut outputs = OutputMap::new();
        for record in records {
            let key = record.key.clone();
            outputs.insert(key, self.view(record).await?);
        }

        Ok(outputs)
    }

    /// Decode a single output; a missing key is a not-found condition
    #[instrument(skip(self), fields(stack_id = %stack_id), name = "read_output")]
    pub async fn read_key(&self, stack_id: &StackId, key: &str) -> Result<OutputView> {
        let record = self
            .repository
            .get_by_key(stack_id, key)
            .await?
            .ok_or_else(|| WatsonError::output_not_found(key))?;

        self.view(record).await
    }

    async fn view(&self, record: OutputRecord) -> Result<OutputView> {
        let value = self.codec.decode(&record.value, record.sensitive).await?;

        Ok(OutputView {
            value,
            deprecated: non_empty(record.deprecated),
            warning: non_empty(record.warning),
            sensitive: record.sensitive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::CipherKind;
    use crate::domain::OutputSpec;
    use crate::storage::test_helpers::TestDatabase;
    use crate::storage::{ProjectRepository, StackRepository};
    use serde_json::json;

    struct Fixture {
        _db: TestDatabase,
        pool: DbPool,
        store: OutputStore,
        stacks: StackRepository,
        stack_id: StackId,
    }

    impl Fixture {
        /// Encode a batch and swap it in the way a stack update does
        async fn replace(&self, outputs: &OutputSpecs) -> Result<()> {
            let records = self.store.encode_batch(outputs).await?;
            self.stacks.update(&self.stack_id, None, Some(records.as_slice())).await?;
            Ok(())
        }
    }

    async fn setup(kind: CipherKind) -> Fixture {
        let db = TestDatabase::new().await;
        let project = ProjectRepository::new(db.pool.clone()).create("Backend", "backend").await.unwrap();
        let stacks = StackRepository::new(db.pool.clone());
        let stack = stacks.create_with_outputs(&project, "Dev", "dev", &[]).await.unwrap();
        let store = OutputStore::new(db.pool.clone(), Arc::new(CipherFactory::for_kind(kind)));
        Fixture { pool: db.pool.clone(), _db: db, store, stacks, stack_id: stack.id }
    }

    fn specs(entries: Vec<(&str, OutputSpec)>) -> OutputSpecs {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let fx = setup(CipherKind::Rot13).await;

        let outputs = specs(vec![
            ("hostname", OutputSpec::plain("https://hello.example")),
            ("password", OutputSpec::sensitive("secret").warning("rotate monthly")),
            ("legacy", OutputSpec::plain(1).deprecated("")),
        ]);
        fx.replace(&outputs).await.unwrap();

        let read = fx.store.read(&fx.stack_id).await.unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read["hostname"].value, json!("https://hello.example"));
        assert_eq!(read["password"].value, json!("secret"));
        assert!(read["password"].sensitive);
        assert_eq!(read["password"].warning.as_deref(), Some("rotate monthly"));
        assert_eq!(read["legacy"].deprecated, None);
    }

    #[tokio::test]
    async fn test_sensitive_value_is_not_stored_in_clear() {
        let fx = setup(CipherKind::Rot13).await;

        fx.replace(&specs(vec![("password", OutputSpec::sensitive("secret"))])).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT value FROM outputs WHERE output_key = 'password'")
            .fetch_one(&fx.pool)
            .await
            .unwrap();
        assert_ne!(stored, "\"secret\"");
        assert!(!stored.contains("secret"));
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let fx = setup(CipherKind::Fail).await;

        let err = fx.store.read_key(&fx.stack_id, "missing").await.unwrap_err();
        assert_eq!(err.to_string(), "'missing' is not present in the outputs.");
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_encoding() {
        let fx = setup(CipherKind::Fail).await;

        // The blank key fails validation before the fail cipher is ever asked
        let err = fx
            .store
            .encode_batch(&specs(vec![("secret", OutputSpec::sensitive("x")), ("", OutputSpec::plain(2))]))
            .await
            .unwrap_err();
        assert!(matches!(err, WatsonError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_cipher_failure_keeps_previous_outputs() {
        let fx = setup(CipherKind::Fail).await;

        fx.replace(&specs(vec![("plain", OutputSpec::plain("v1"))])).await.unwrap();

        let err = fx
            .replace(&specs(vec![("plain", OutputSpec::plain("v2")), ("secret", OutputSpec::sensitive("x"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, WatsonError::Cipher { .. }));

        let read = fx.store.read(&fx.stack_id).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read["plain"].value, json!("v1"));
    }

    #[tokio::test]
    async fn test_replacement_drops_old_keys() {
        let fx = setup(CipherKind::Rot13).await;

        fx.replace(&specs(vec![("a", OutputSpec::plain(1))])).await.unwrap();
        fx.replace(&specs(vec![("b", OutputSpec::plain(2))])).await.unwrap();

        let read = fx.store.read(&fx.stack_id).await.unwrap();
        assert_eq!(read.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(fx.store.read_key(&fx.stack_id, "b").await.unwrap().value, json!(2));
    }
}
