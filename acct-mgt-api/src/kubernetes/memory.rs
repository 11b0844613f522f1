//! In-memory implementation of the cluster API.
//!
//! Emulates the parts of the cluster API the service depends on: 404 for
//! missing objects, 409 on duplicate creates, namespaced objects requiring
//! their project, and the cascades the real server performs (deleting a user
//! or identity drops its mapping, deleting a project drops everything in it).
//!
//! It is used for local development (`backend = "memory"`) and by the test
//! suites, which is why it records every call it receives and can be told to
//! reject specific verbs.

use super::error::{K8sError, K8sResult};
use super::types::{Mutation, ResourceKey, ResourceKind, Verb};
use super::ClusterApi;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One request received by the in-memory cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    pub kind: ResourceKind,
    pub key: ResourceKey,
}

#[derive(Debug, Clone)]
struct Rejection {
    verb: Verb,
    kind: ResourceKind,
    status: u16,
}

#[derive(Debug, Default)]
struct ClusterState {
    objects: HashMap<(ResourceKind, ResourceKey), Value>,
    calls: Vec<Call>,
    rejections: Vec<Rejection>,
}

impl ClusterState {
    fn record(&mut self, verb: Verb, kind: ResourceKind, key: &ResourceKey) -> Option<u16> {
        self.calls.push(Call {
            verb,
            kind,
            key: key.clone(),
        });
        self.rejections
            .iter()
            .find(|r| r.verb == verb && r.kind == kind)
            .map(|r| r.status)
    }

    fn contains(&self, kind: ResourceKind, key: &ResourceKey) -> bool {
        self.objects.contains_key(&(kind, key.clone()))
    }

    fn cascade_delete(&mut self, kind: ResourceKind, key: &ResourceKey) {
        match kind {
            ResourceKind::User => self.objects.retain(|(k, _), object| {
                !(*k == ResourceKind::IdentityMapping && object["user"]["name"] == key.name)
            }),
            ResourceKind::Identity => {
                self.objects
                    .remove(&(ResourceKind::IdentityMapping, key.clone()));
            }
            ResourceKind::Project => self
                .objects
                .retain(|(_, k), _| k.namespace.as_deref() != Some(key.name.as_str())),
            _ => {}
        }
    }
}

/// Cluster API backed by a map of objects
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: RwLock<ClusterState>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call
    pub async fn insert(&self, kind: ResourceKind, key: ResourceKey, object: Value) {
        let object = with_metadata(&key, &object);
        self.state.write().await.objects.insert((kind, key), object);
    }

    /// Inspect an object without recording a call
    pub async fn object(&self, kind: ResourceKind, key: &ResourceKey) -> Option<Value> {
        self.state
            .read()
            .await
            .objects
            .get(&(kind, key.clone()))
            .cloned()
    }

    /// Answer every future `verb` on `kind` with `status`
    pub async fn reject(&self, verb: Verb, kind: ResourceKind, status: u16) {
        self.state
            .write()
            .await
            .rejections
            .push(Rejection { verb, kind, status });
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<Call> {
        self.state.read().await.calls.clone()
    }

    /// Create/update/delete calls received so far, in order
    pub async fn mutations(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(|c| c.verb.is_mutation())
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }
}

#[async_trait]
impl ClusterApi for InMemoryCluster {
    async fn fetch(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Option<Value>> {
        let mut state = self.state.write().await;
        if let Some(status) = state.record(Verb::Get, kind, key) {
            return Err(K8sError::UnexpectedStatus {
                kind,
                name: key.to_string(),
                status,
                message: "rejected".to_string(),
            });
        }
        Ok(state.objects.get(&(kind, key.clone())).cloned())
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> K8sResult<Value> {
        let mut state = self.state.write().await;
        let key = ResourceKey::namespaced(namespace, "");
        if let Some(status) = state.record(Verb::List, kind, &key) {
            return Err(K8sError::UnexpectedStatus {
                kind,
                name: namespace.to_string(),
                status,
                message: "rejected".to_string(),
            });
        }

        let mut items: Vec<(String, Value)> = state
            .objects
            .iter()
            .filter(|((k, key), _)| *k == kind && key.namespace.as_deref() == Some(namespace))
            .map(|((_, key), object)| (key.name.clone(), object.clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(json!({
            "kind": format!("{:?}List", kind),
            "apiVersion": "v1",
            "metadata": {},
            "items": items.into_iter().map(|(_, object)| object).collect::<Vec<_>>(),
        }))
    }

    async fn create(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation> {
        let mut state = self.state.write().await;
        if let Some(status) = state.record(Verb::Create, kind, key) {
            return Ok(failure(status, "Rejected", "rejected by test cluster"));
        }

        if state.contains(kind, key) {
            return Ok(failure(
                409,
                "AlreadyExists",
                &format!("{} \"{}\" already exists", kind.plural(), key.name),
            ));
        }

        if let Some(namespace) = key.namespace.as_deref() {
            if !state.contains(ResourceKind::Project, &ResourceKey::cluster(namespace)) {
                return Ok(failure(
                    404,
                    "NotFound",
                    &format!("namespaces \"{}\" not found", namespace),
                ));
            }
        }

        if kind == ResourceKind::IdentityMapping {
            let user = manifest["user"]["name"].as_str().unwrap_or_default();
            if !state.contains(ResourceKind::User, &ResourceKey::cluster(user))
                || !state.contains(ResourceKind::Identity, key)
            {
                return Ok(failure(
                    404,
                    "NotFound",
                    &format!("user or identity for mapping \"{}\" not found", key.name),
                ));
            }
        }

        let mut object = with_metadata(key, manifest);
        if kind == ResourceKind::ResourceQuota {
            let hard = object["spec"]["hard"].clone();
            if let Value::Object(map) = &mut object {
                map.insert("status".to_string(), json!({"hard": hard, "used": {}}));
            }
        }

        state.objects.insert((kind, key.clone()), object.clone());
        Ok(Mutation::new(201, object))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation> {
        let mut state = self.state.write().await;
        if let Some(status) = state.record(Verb::Update, kind, key) {
            return Ok(failure(status, "Rejected", "rejected by test cluster"));
        }

        if !state.contains(kind, key) {
            return Ok(not_found(kind, key));
        }

        let object = with_metadata(key, manifest);
        state.objects.insert((kind, key.clone()), object.clone());
        Ok(Mutation::new(200, object))
    }

    async fn delete(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Mutation> {
        let mut state = self.state.write().await;
        if let Some(status) = state.record(Verb::Delete, kind, key) {
            return Ok(failure(status, "Rejected", "rejected by test cluster"));
        }

        match state.objects.remove(&(kind, key.clone())) {
            Some(object) => {
                state.cascade_delete(kind, key);
                Ok(Mutation::new(200, object))
            }
            None => Ok(not_found(kind, key)),
        }
    }
}

fn with_metadata(key: &ResourceKey, manifest: &Value) -> Value {
    let mut object = manifest.clone();
    if let Value::Object(map) = &mut object {
        let metadata = map
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(metadata) = metadata {
            metadata.insert("name".to_string(), Value::String(key.name.clone()));
            if let Some(namespace) = &key.namespace {
                metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
            }
        }
    }
    object
}

fn failure(status: u16, reason: &str, message: &str) -> Mutation {
    Mutation::new(
        status,
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": status,
        }),
    )
}

fn not_found(kind: ResourceKind, key: &ResourceKey) -> Mutation {
    failure(
        404,
        "NotFound",
        &format!("{} \"{}\" not found", kind.plural(), key.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let cluster = InMemoryCluster::new();
        let key = ResourceKey::cluster("alice");

        let first = cluster
            .create(ResourceKind::User, &key, &json!({"kind": "User"}))
            .await
            .unwrap();
        assert_eq!(first.status, 201);
        assert_eq!(first.body["metadata"]["name"], "alice");

        let second = cluster
            .create(ResourceKind::User, &key, &json!({"kind": "User"}))
            .await
            .unwrap();
        assert_eq!(second.status, 409);
        assert!(second.message().contains("already exists"));
    }

    #[tokio::test]
    async fn test_namespaced_create_requires_project() {
        let cluster = InMemoryCluster::new();
        let key = ResourceKey::namespaced("missing", "quota");
        let result = cluster
            .create(ResourceKind::ResourceQuota, &key, &json!({"spec": {}}))
            .await
            .unwrap();
        assert_eq!(result.status, 404);
    }

    #[tokio::test]
    async fn test_deleting_project_drops_contents() {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(ResourceKind::Project, ResourceKey::cluster("p1"), json!({}))
            .await;
        let quota = ResourceKey::namespaced("p1", "compute");
        cluster
            .create(ResourceKind::ResourceQuota, &quota, &json!({"spec": {"hard": {"pods": "1"}}}))
            .await
            .unwrap();

        cluster
            .delete(ResourceKind::Project, &ResourceKey::cluster("p1"))
            .await
            .unwrap();
        assert!(cluster.object(ResourceKind::ResourceQuota, &quota).await.is_none());
    }

    #[tokio::test]
    async fn test_rejection_applies_to_verb_and_kind() {
        let cluster = InMemoryCluster::new();
        cluster.reject(Verb::Get, ResourceKind::User, 500).await;

        let err = cluster
            .fetch(ResourceKind::User, &ResourceKey::cluster("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, K8sError::UnexpectedStatus { status: 500, .. }));

        // other kinds unaffected
        assert!(cluster
            .fetch(ResourceKind::Identity, &ResourceKey::cluster("x"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(cluster.calls().await.len(), 2);
        assert!(cluster.mutations().await.is_empty());
    }
}
