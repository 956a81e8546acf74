//! Common test utilities and fixtures for integration tests
//!
//! - Isolated in-memory store per test, or a file-backed one in a temp dir
//! - Image and domain fixtures
//! - Request builders and body parsing for router tests
//! - Store-level assertions that bypass the engine

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use vermgr_common::Store;
use vermgr_lifecycle::{Domain, Environment, Image, LifecycleStore};

pub const V1: &str = "2025-01-01-00-00-00";
pub const V2: &str = "2025-01-02-00-00-00";
pub const V3: &str = "2025-01-03-00-00-00";

/// Test application over a private store
pub struct TestApp {
    pub store: Store,
    pub engine: LifecycleStore,
    _dir: Option<TempDir>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let store = Store::in_memory().await?;
        let engine = LifecycleStore::new(store.clone());
        Ok(Self {
            store,
            engine,
            _dir: None,
        })
    }

    /// Store opened through `Store::connect` on a file that lives as long as the app
    pub async fn file_backed() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}", dir.path().join("vermgr.db").display());
        let store = Store::connect(&url).await?;
        let engine = LifecycleStore::new(store.clone());
        Ok(Self {
            store,
            engine,
            _dir: Some(dir),
        })
    }

    /// Router composed exactly like the server binary, minus tower layers
    pub fn router(&self) -> Router {
        vermgr_app::create_app(self.store.clone())
    }

    /// Register `name` under `domain` and create the given versions
    pub async fn seed_image(&self, name: &str, domain: &str, versions: &[&str]) -> Result<Vec<Image>> {
        self.engine.register_image(name, domain).await?;
        let mut created = Vec::with_capacity(versions.len());
        for version in versions {
            created.push(self.engine.create_image_version(name, version).await?);
        }
        Ok(created)
    }

    /// Fetch one domain version, failing the test if it is missing
    pub async fn domain(&self, name: &str, version: &str) -> Domain {
        self.engine
            .find_domain(name, version)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("domain {name}:{version} should exist"))
    }

    /// `(name, deployed)` groups with more than one active row
    pub async fn duplicate_active_groups(&self) -> Result<Vec<(String, String, i64)>> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT name, deployed, COUNT(*) FROM domains WHERE active = 1 \
             GROUP BY name, deployed HAVING COUNT(*) > 1",
        )
        .fetch_all(self.store.pool())
        .await?;
        Ok(rows)
    }

    /// Number of active rows for one `(name, deployed)` pair
    pub async fn active_count(&self, name: &str, deployed: Environment) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM domains WHERE name = ?1 AND deployed = ?2 AND active = 1",
        )
        .bind(name)
        .bind(deployed)
        .fetch_one(self.store.pool())
        .await?;
        Ok(count)
    }
}

/// Names of the image entries pinned by a domain version
pub fn snapshot_names(domain: &Domain) -> Vec<String> {
    domain
        .images
        .0
        .entries()
        .iter()
        .map(|entry| entry.name.clone())
        .collect()
}

/// Build a request with an optional JSON body
pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
