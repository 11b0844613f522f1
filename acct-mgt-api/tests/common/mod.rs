//! Common test utilities and helpers

#![allow(dead_code)]

use acct_mgt_api::config::AcctMgtConfig;
use acct_mgt_api::kubernetes::{InMemoryCluster, ResourceKey, ResourceKind};
use acct_mgt_api::{build_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Router wired to an in-memory cluster the test can inspect
pub struct TestApp {
    pub cluster: Arc<InMemoryCluster>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let cluster = Arc::new(InMemoryCluster::new());
        let state = AppState::new(AcctMgtConfig::default(), cluster.clone());
        Self {
            cluster,
            router: build_router(Arc::new(state)),
        }
    }

    /// Seed a project directly in the cluster
    pub async fn with_project(self, name: &str) -> Self {
        self.cluster
            .insert(
                ResourceKind::Project,
                ResourceKey::cluster(name),
                serde_json::json!({"kind": "Project"}),
            )
            .await;
        self
    }

    pub async fn call(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn call_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(method, uri, body)).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        (status, read_json(response).await)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
