//! ResourceQuota operations
//!
//! Quotas are created once per (project, name) and only changed afterwards
//! through [`update_hard_limits`], which merges a partial change set into
//! the current `spec.hard` and writes the whole object back.

use super::{accepted, ReconcileError, ReconcileResult};
use crate::kubernetes::types::{ResourceKey, ResourceKind, Verb};
use crate::kubernetes::ClusterApi;
use acct_mgt_common::quota::{merge_hard_limits, HardLimits, QuotaRequest};
use serde_json::{Map, Value};
use tracing::debug;

/// Result of creating one quota manifest
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaCreate {
    Created { spec: Value },
    AlreadyExists { spec: Value },
    Rejected { spec: Value, status: u16, message: String },
}

impl QuotaCreate {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Fill in the fields a quota manifest needs.
///
/// The name and namespace always come from the request path.
fn complete_manifest(mut manifest: Map<String, Value>, project: &str, name: &str) -> Value {
    manifest
        .entry("apiVersion")
        .or_insert_with(|| Value::String("v1".to_string()));
    manifest
        .entry("kind")
        .or_insert_with(|| Value::String("ResourceQuota".to_string()));

    let metadata = manifest
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !metadata.is_object() {
        *metadata = Value::Object(Map::new());
    }
    if let Value::Object(metadata) = metadata {
        metadata.insert("name".to_string(), Value::String(name.to_string()));
        metadata.insert("namespace".to_string(), Value::String(project.to_string()));
    }

    Value::Object(manifest)
}

/// Create every quota a request describes.
///
/// The request is fully expanded and validated first. Each manifest is then
/// probed and created on its own; one failing does not stop the rest.
pub async fn create_quotas(
    cluster: &dyn ClusterApi,
    project: &str,
    name: &str,
    request: QuotaRequest,
) -> ReconcileResult<Vec<QuotaCreate>> {
    let manifests = request.into_manifests()?;

    let key = ResourceKey::namespaced(project, name);
    let mut outcomes = Vec::with_capacity(manifests.len());
    for manifest in manifests {
        let manifest = complete_manifest(manifest, project, name);
        let spec = manifest["spec"].clone();

        if cluster.exists(ResourceKind::ResourceQuota, &key).await? {
            debug!(quota = %key, "quota already exists");
            outcomes.push(QuotaCreate::AlreadyExists { spec });
            continue;
        }

        let mutation = cluster
            .create(ResourceKind::ResourceQuota, &key, &manifest)
            .await?;
        let outcome = match accepted(Verb::Create, ResourceKind::ResourceQuota, &key, mutation) {
            Ok(_) => QuotaCreate::Created { spec },
            Err(ReconcileError::Rejected {
                status, message, ..
            }) => QuotaCreate::Rejected {
                spec,
                status,
                message,
            },
            Err(other) => return Err(other),
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// The `spec.hard` map of a quota, `None` if the quota does not exist
pub async fn get_hard_limits(
    cluster: &dyn ClusterApi,
    project: &str,
    name: &str,
) -> ReconcileResult<Option<Value>> {
    let quota = cluster
        .fetch(ResourceKind::ResourceQuota, &ResourceKey::namespaced(project, name))
        .await?;
    Ok(quota.map(|q| q["spec"]["hard"].clone()))
}

/// Every quota in a project, without its `status`
pub async fn list_quotas(cluster: &dyn ClusterApi, project: &str) -> ReconcileResult<Vec<Value>> {
    let list = cluster.list(ResourceKind::ResourceQuota, project).await?;

    let items = match list.get("items") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|mut item| {
            if let Value::Object(map) = &mut item {
                map.remove("status");
            }
            item
        })
        .collect())
}

/// Merge `changes` into a quota's hard limits and write it back.
///
/// Returns the merged limits, or `None` if the quota does not exist.
pub async fn update_hard_limits(
    cluster: &dyn ClusterApi,
    project: &str,
    name: &str,
    changes: &HardLimits,
) -> ReconcileResult<Option<HardLimits>> {
    let key = ResourceKey::namespaced(project, name);
    let Some(mut quota) = cluster.fetch(ResourceKind::ResourceQuota, &key).await? else {
        return Ok(None);
    };

    let current: HardLimits = match &quota["spec"]["hard"] {
        Value::Object(hard) => hard.clone().into_iter().collect(),
        _ => HardLimits::new(),
    };
    let merged = merge_hard_limits(&current, changes)?;
    debug!(quota = %key, ?merged, "merged hard limits");

    set_hard_limits(&mut quota, &merged);
    let mutation = cluster
        .update(ResourceKind::ResourceQuota, &key, &quota)
        .await?;
    accepted(Verb::Update, ResourceKind::ResourceQuota, &key, mutation)?;

    Ok(Some(merged))
}

fn set_hard_limits(quota: &mut Value, hard: &HardLimits) {
    let hard: Map<String, Value> = hard.clone().into_iter().collect();
    if let Value::Object(root) = quota {
        let spec = root
            .entry("spec")
            .or_insert_with(|| Value::Object(Map::new()));
        if !spec.is_object() {
            *spec = Value::Object(Map::new());
        }
        if let Value::Object(spec) = spec {
            spec.insert("hard".to_string(), Value::Object(hard));
        }
    }
}

/// Delete a quota, returning the deleted object's metadata.
///
/// `None` if the quota did not exist.
pub async fn delete_quota(
    cluster: &dyn ClusterApi,
    project: &str,
    name: &str,
) -> ReconcileResult<Option<Value>> {
    let key = ResourceKey::namespaced(project, name);
    if !cluster.exists(ResourceKind::ResourceQuota, &key).await? {
        return Ok(None);
    }

    let mutation = cluster.delete(ResourceKind::ResourceQuota, &key).await?;
    let mutation = accepted(Verb::Delete, ResourceKind::ResourceQuota, &key, mutation)?;
    Ok(Some(mutation.body["metadata"].clone()))
}
