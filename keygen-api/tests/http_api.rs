//! HTTP API integration tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use keygen_api::{router, AppState};
use keygen_core::{
    EncryptionKey, Error, InMemoryKeyRecordStore, KeyManager, KeyRecord, KeyRecordStore,
    KeygenConfig, MasterSeed, Result,
};

fn test_config() -> KeygenConfig {
    KeygenConfig::new(
        MasterSeed::new("test-master-seed-1234").unwrap(),
        EncryptionKey::from_bytes([7u8; 32]),
    )
}

fn app_with(store: Arc<dyn KeyRecordStore>) -> Router {
    router(AppState::new(KeyManager::from_config(&test_config(), store)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Store whose backend is always down
struct UnavailableStore;

#[async_trait]
impl KeyRecordStore for UnavailableStore {
    async fn exists(&self, _user_id: u64, _network: &str) -> Result<bool> {
        Err(Error::Storage("connection refused".into()))
    }

    async fn get(&self, _user_id: u64, _network: &str) -> Result<KeyRecord> {
        Err(Error::Storage("connection refused".into()))
    }

    async fn upsert(&self, _record: &KeyRecord) -> Result<()> {
        Err(Error::Storage("connection refused".into()))
    }

    async fn ensure_unique_index(&self) -> Result<()> {
        Err(Error::Storage("connection refused".into()))
    }

    async fn health_check(&self) -> Result<()> {
        Err(Error::Storage("connection refused".into()))
    }
}

#[tokio::test]
async fn test_issue_bitcoin_keys() {
    let store = Arc::new(InMemoryKeyRecordStore::new());
    let app = app_with(store.clone());

    let (status, body) = get(app.clone(), "/keygen/1/bitcoin").await;
    assert_eq!(status, StatusCode::OK);

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert!(body["address"].as_str().unwrap().starts_with('1'));
    assert_eq!(body["public_key"].as_str().unwrap().len(), 66);
    assert!(!body["private_key"].as_str().unwrap().is_empty());

    let (status, again) = get(app, "/keygen/1/bitcoin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, body);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_issue_ethereum_keys() {
    let app = app_with(Arc::new(InMemoryKeyRecordStore::new()));

    let (status, body) = get(app, "/keygen/42/ethereum").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["address"].as_str().unwrap().starts_with("0x"));
    assert_eq!(body["private_key"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_invalid_user_id() {
    let store = Arc::new(InMemoryKeyRecordStore::new());

    for uri in ["/keygen/0/bitcoin", "/keygen/-1/bitcoin", "/keygen/abc/ethereum"] {
        let (status, body) = get(app_with(store.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "userId must be a positive integer");
    }
    assert_eq!(store.read_count(), 0);
}

#[tokio::test]
async fn test_unsupported_network() {
    let store = Arc::new(InMemoryKeyRecordStore::new());

    let (status, body) = get(app_with(store.clone()), "/keygen/1/dogecoin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported network: dogecoin");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_storage_outage() {
    let (status, body) = get(app_with(Arc::new(UnavailableStore)), "/keygen/1/bitcoin").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Storage unavailable");
}

#[tokio::test]
async fn test_corrupted_record_is_internal_error() {
    let store = Arc::new(InMemoryKeyRecordStore::new());
    store
        .insert_raw(KeyRecord {
            user_id: 5,
            network: "ethereum".into(),
            address: "0x0000000000000000000000000000000000000000".into(),
            public_key: "04".into(),
            encrypted_private_key: "AAAA".into(),
        })
        .await;

    let (status, body) = get(app_with(store), "/keygen/5/ethereum").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app_with(Arc::new(InMemoryKeyRecordStore::new())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");

    let (status, body) = get(app_with(Arc::new(UnavailableStore)), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}
