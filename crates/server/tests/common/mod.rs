//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock catalog and a temporary SQLite store, enabling E2E testing
//! without network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use popcorn_core::{
    create_session_system, testing::MockCatalog, CatalogConfig, Config, PersistentStore,
    RatingConfig, SearchConfig, ServerConfig, Session, SessionHandle, SqliteSlotStore,
    StorageConfig,
};

/// Re-export fixtures for test convenience
pub use popcorn_core::testing::fixtures;

/// Test fixture for E2E testing with a mock catalog.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.put("/api/v1/search", json!({ "query": "batman" })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog - configure search and detail responses
    pub catalog: Arc<MockCatalog>,
    /// Handle to the running session, for waiting on settled state
    pub session: SessionHandle,
    /// Database file backing the watched list
    pub db_path: PathBuf,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with an empty mock catalog.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self::with_temp_dir(temp_dir, Arc::new(MockCatalog::new())).await
    }

    /// Create a fixture over an existing directory (to simulate a restart).
    pub async fn with_temp_dir(temp_dir: TempDir, catalog: Arc<MockCatalog>) -> Self {
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            catalog: CatalogConfig::with_api_key("test-key"),
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            storage: StorageConfig {
                path: db_path.clone(),
                ..Default::default()
            },
            search: SearchConfig::default(),
            rating: RatingConfig::default(),
        };

        let slots = Arc::new(SqliteSlotStore::new(&db_path).expect("Failed to open slot store"));
        let session = Session::from_config(
            Arc::clone(&catalog) as Arc<dyn popcorn_core::Catalog>,
            PersistentStore::new(slots),
            &config,
        );
        let (handle, driver) = create_session_system(session, 16);
        tokio::spawn(driver.run());

        let state = Arc::new(popcorn_server::state::AppState::new(config, handle.clone()));
        let router = popcorn_server::api::create_router(state);

        Self {
            router,
            catalog,
            session: handle,
            db_path,
            temp_dir,
        }
    }

    /// Tear down the server, keeping the database directory and catalog.
    pub fn into_parts(self) -> (TempDir, Arc<MockCatalog>) {
        (self.temp_dir, self.catalog)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Wait until the search has left the loading state.
    pub async fn wait_for_search(&self) {
        self.session
            .wait_for(|s| !matches!(s.search.status, popcorn_core::SearchStatus::Loading))
            .await
            .expect("session closed");
    }

    /// Wait until the selected detail has loaded (or failed).
    pub async fn wait_for_detail(&self) {
        self.session
            .wait_for(|s| s.selection.detail_loaded)
            .await
            .expect("session closed");
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
