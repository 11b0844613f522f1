//! Cluster API integration for acct-mgt
//!
//! Provides everything the service needs from the orchestration API:
//! - Existence probes and single-attempt mutations ([`ClusterApi`])
//! - A REST implementation over reqwest ([`client::K8sClient`])
//! - An in-process implementation for development and tests
//!   ([`memory::InMemoryCluster`])
//! - Reconcilers for projects, composite users, role bindings and quotas
//!   ([`cluster_resources`])

pub mod client;
pub mod cluster_resources;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod types;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use memory::InMemoryCluster;
pub use types::{Mutation, ResourceKey, ResourceKind, Verb};

use async_trait::async_trait;
use serde_json::Value;

/// Probe and mutate backend objects.
///
/// Reads distinguish "absent" from "unknown": a 404 is `Ok(None)`, anything
/// else that is not a success is an error. Mutations are a single attempt and
/// return the backend's status and body whatever they are.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch one object, `None` if it does not exist
    async fn fetch(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Option<Value>>;

    /// Whether one object exists
    async fn exists(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<bool> {
        Ok(self.fetch(kind, key).await?.is_some())
    }

    /// List the objects of a namespaced kind in one project
    async fn list(&self, kind: ResourceKind, namespace: &str) -> K8sResult<Value>;

    async fn create(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation>;

    async fn update(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation>;

    async fn delete(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Mutation>;
}
