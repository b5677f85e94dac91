//! End-to-end registry behavior over a real SQLite store
//!
//! Covers slug uniqueness, output encoding, usage tracking and cascading
//! deletes through the public `Registry` API.

mod common;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use common::{create_test_registry, path};
use proptest::prelude::*;
use serde_json::json;
use watson::cipher::CipherKind;
use watson::config::CipherConfig;
use watson::domain::{NewProject, NewStack, OutputSpec, OutputSpecs, StackUpdate};
use watson::services::Clock;
use watson::WatsonError;

#[derive(Debug)]
struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn starting_at(time: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(time)))
    }

    fn advance_to(&self, time: DateTime<Utc>) {
        *self.0.lock().unwrap() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn outputs(entries: Vec<(&str, OutputSpec)>) -> OutputSpecs {
    entries.into_iter().map(|(key, spec)| (key.to_string(), spec)).collect()
}

#[tokio::test]
async fn test_backend_load_balancers_scenario() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;

    let project = registry.create_project(NewProject::named("Backend")).await.unwrap();
    assert_eq!(project.project.slug, "backend");

    let stack = registry
        .create_stack(
            "backend",
            NewStack::named("Load-Balancers")
                .with_outputs(outputs(vec![("hostname", OutputSpec::plain("https://hello.example"))])),
        )
        .await
        .unwrap();
    assert_eq!(stack.stack.full_path().to_string(), "backend/load-balancers");

    let read = registry.get_outputs(&path("backend/load-balancers"), None).await.unwrap();
    assert_eq!(
        serde_json::to_value(read).unwrap(),
        json!({
            "hostname": {
                "value": "https://hello.example",
                "deprecated": null,
                "warning": null,
                "sensitive": false
            }
        })
    );
}

#[tokio::test]
async fn test_sensitive_output_is_encrypted_at_rest() {
    let (pool, registry) = create_test_registry(CipherKind::Rot13).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry
        .create_stack(
            "backend",
            NewStack::named("Database").with_outputs(outputs(vec![
                ("password", OutputSpec::sensitive("secret")),
                ("host", OutputSpec::plain("db.internal")),
            ])),
        )
        .await
        .unwrap();

    let view = registry.get_output(&path("backend/database"), "password", None).await.unwrap();
    assert_eq!(view.value, json!("secret"));
    assert!(view.sensitive);

    let stored: String =
        sqlx::query_scalar("SELECT value FROM outputs WHERE output_key = 'password'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_ne!(stored, "secret");
    assert_ne!(stored, "\"secret\"");
}

#[tokio::test]
async fn test_frontend_reads_backend_scenario() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    let first = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let latest = Utc.with_ymd_and_hms(2024, 5, 3, 7, 30, 0).unwrap();
    let clock = ManualClock::starting_at(first);
    let registry = registry.with_clock(clock.clone());

    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry.create_project(NewProject::named("Frontend")).await.unwrap();
    registry
        .create_stack(
            "backend",
            NewStack::named("Load-Balancers")
                .with_outputs(outputs(vec![("hostname", OutputSpec::plain("https://hello.example"))])),
        )
        .await
        .unwrap();
    registry.create_stack("frontend", NewStack::named("dev")).await.unwrap();

    let provider = path("backend/load-balancers");
    let caller = path("frontend/dev");

    registry.get_outputs(&provider, Some(&caller)).await.unwrap();
    clock.advance_to(latest);
    registry.get_outputs(&provider, Some(&caller)).await.unwrap();

    let detail = registry.get_stack(&provider).await.unwrap();
    assert_eq!(detail.used_by.len(), 1);
    assert_eq!(detail.used_by[0].path, caller);
    assert_eq!(detail.used_by[0].last_used_at, latest);
}

#[tokio::test]
async fn test_stack_slugs_are_unique_per_project() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry.create_project(NewProject::named("Frontend")).await.unwrap();

    registry.create_stack("backend", NewStack::named("dev")).await.unwrap();
    registry.create_stack("frontend", NewStack::named("dev")).await.unwrap();

    let err = registry.create_stack("backend", NewStack::named("Dev")).await.unwrap_err();
    assert!(matches!(err, WatsonError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_accented_names_get_ascii_slugs() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;

    let project = registry.create_project(NewProject::named("Café au lait")).await.unwrap();
    assert_eq!(project.project.slug, "cafe-au-lait");

    let stack = registry.create_stack("cafe-au-lait", NewStack::named("Prod Zürich")).await.unwrap();
    assert_eq!(stack.stack.full_path().to_string(), "cafe-au-lait/prod-zurich");
}

#[tokio::test]
async fn test_create_stack_under_unknown_project() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;

    let err = registry.create_stack("ghost", NewStack::named("dev")).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test]
async fn test_missing_output_key_is_named() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry.create_stack("backend", NewStack::named("dev")).await.unwrap();

    let err = registry.get_output(&path("backend/dev"), "hostname", None).await.unwrap_err();
    assert_eq!(err.to_string(), "'hostname' is not present in the outputs.");
}

#[tokio::test]
async fn test_record_usage_ignores_self_reference() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    let detail = registry.create_stack("backend", NewStack::named("dev")).await.unwrap();

    let recorded = registry.record_usage(&detail.stack, &path("backend/dev")).await.unwrap();
    assert!(!recorded);
    assert!(registry.consumers(&path("backend/dev")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_project_cascades() {
    let (pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry.create_project(NewProject::named("Frontend")).await.unwrap();
    registry
        .create_stack(
            "backend",
            NewStack::named("api").with_outputs(outputs(vec![("port", OutputSpec::plain(8080))])),
        )
        .await
        .unwrap();
    registry.create_stack("frontend", NewStack::named("web")).await.unwrap();
    registry.get_outputs(&path("backend/api"), Some(&path("frontend/web"))).await.unwrap();

    registry.delete_project("backend").await.unwrap();

    let stacks_left: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM stacks").fetch_one(&pool).await.unwrap();
    assert_eq!(stacks_left, 1);

    let outputs_left: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM outputs").fetch_one(&pool).await.unwrap();
    let edges_left: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM usage_edges").fetch_one(&pool).await.unwrap();
    assert_eq!(outputs_left, 0);
    assert_eq!(edges_left, 0);
    assert!(registry.get_stack(&path("frontend/web")).await.is_ok());
}

#[tokio::test]
async fn test_update_replaces_outputs_atomically() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();
    registry
        .create_stack(
            "backend",
            NewStack::named("api").with_outputs(outputs(vec![("port", OutputSpec::plain(8080))])),
        )
        .await
        .unwrap();

    // The fail cipher rejects the sensitive entry, so nothing changes
    let err = registry
        .update_stack(
            &path("backend/api"),
            StackUpdate {
                name: Some("API".to_string()),
                outputs: Some(outputs(vec![
                    ("port", OutputSpec::plain(9090)),
                    ("token", OutputSpec::sensitive("t0k3n")),
                ])),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WatsonError::Cipher { .. }));

    let detail = registry.get_stack(&path("backend/api")).await.unwrap();
    assert_eq!(detail.stack.name, "api");
    assert_eq!(detail.outputs.len(), 1);
    assert_eq!(detail.outputs["port"].value, json!(8080));
}

#[tokio::test]
async fn test_reconfigured_cipher_applies_to_next_write() {
    let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
    registry.create_project(NewProject::named("Backend")).await.unwrap();

    let sensitive = || outputs(vec![("password", OutputSpec::sensitive("secret"))]);
    assert!(registry
        .create_stack("backend", NewStack::named("db").with_outputs(sensitive()))
        .await
        .is_err());

    registry.ciphers().reconfigure(CipherConfig::with_kind(CipherKind::Rot13));
    registry
        .create_stack("backend", NewStack::named("db").with_outputs(sensitive()))
        .await
        .unwrap();

    let view = registry.get_output(&path("backend/db"), "password", None).await.unwrap();
    assert_eq!(view.value, json!("secret"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn duplicate_explicit_project_slug_conflicts(name in "[A-Za-z][A-Za-z0-9 ]{0,20}") {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        let second = runtime.block_on(async {
            let (_pool, registry) = create_test_registry(CipherKind::Fail).await;
            registry
                .create_project(NewProject::named(name.clone()).with_slug("shared"))
                .await
                .unwrap();
            registry.create_project(NewProject::named(name).with_slug("shared")).await
        });

        prop_assert!(
            matches!(second, Err(WatsonError::Conflict { .. })),
            "expected Conflict error, got {:?}",
            second
        );
    }
}
