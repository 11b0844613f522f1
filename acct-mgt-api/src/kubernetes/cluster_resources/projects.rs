//! Project operations

use super::{accepted, ReconcileResult};
use crate::kubernetes::types::{ResourceKey, ResourceKind, Verb};
use crate::kubernetes::ClusterApi;
use acct_mgt_common::naming::validate_project_name;
use serde_json::{json, Map, Value};

pub const DISPLAY_NAME_ANNOTATION: &str = "openshift.io/display-name";
pub const REQUESTER_ANNOTATION: &str = "openshift.io/requester";

/// A project to create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    /// Defaults to the project name
    pub display_name: Option<String>,
    /// Recorded as the requester annotation
    pub owner: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn manifest(&self) -> Value {
        let mut annotations = Map::new();
        annotations.insert(
            DISPLAY_NAME_ANNOTATION.to_string(),
            Value::String(self.display_name.clone().unwrap_or_else(|| self.name.clone())),
        );
        if let Some(owner) = &self.owner {
            annotations.insert(REQUESTER_ANNOTATION.to_string(), Value::String(owner.clone()));
        }

        json!({
            "kind": "Project",
            "apiVersion": "project.openshift.io/v1",
            "metadata": {
                "name": self.name,
                "annotations": annotations,
            },
        })
    }
}

pub async fn project_exists(cluster: &dyn ClusterApi, name: &str) -> ReconcileResult<bool> {
    Ok(cluster
        .exists(ResourceKind::Project, &ResourceKey::cluster(name))
        .await?)
}

/// Create a project.
///
/// The name is validated before the backend is contacted. Returns `false`
/// without creating anything if the project already exists.
pub async fn create_project(cluster: &dyn ClusterApi, project: &NewProject) -> ReconcileResult<bool> {
    validate_project_name(&project.name)?;

    let key = ResourceKey::cluster(&project.name);
    if cluster.exists(ResourceKind::Project, &key).await? {
        return Ok(false);
    }

    let mutation = cluster
        .create(ResourceKind::Project, &key, &project.manifest())
        .await?;
    accepted(Verb::Create, ResourceKind::Project, &key, mutation)?;
    Ok(true)
}

/// Delete a project. Returns `false` if it did not exist.
pub async fn delete_project(cluster: &dyn ClusterApi, name: &str) -> ReconcileResult<bool> {
    let key = ResourceKey::cluster(name);
    if !cluster.exists(ResourceKind::Project, &key).await? {
        return Ok(false);
    }

    let mutation = cluster.delete(ResourceKind::Project, &key).await?;
    accepted(Verb::Delete, ResourceKind::Project, &key, mutation)?;
    Ok(true)
}
