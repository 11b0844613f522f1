//! Role binding operations
//!
//! Each project has at most one binding per cluster role, named after the
//! role, listing its users in `userNames`. Granting and revoking edit that
//! list rather than creating a binding per user.

use super::{accepted, ReconcileError, ReconcileResult};
use crate::kubernetes::types::{ResourceKey, ResourceKind, Verb};
use crate::kubernetes::ClusterApi;
use acct_mgt_common::Role;
use serde_json::{json, Value};

fn binding_key(project: &str, role: Role) -> ResourceKey {
    ResourceKey::namespaced(project, role.cluster_role())
}

fn binding_manifest(project: &str, role: Role, users: &[String]) -> Value {
    json!({
        "kind": "RoleBinding",
        "apiVersion": "authorization.openshift.io/v1",
        "metadata": {
            "name": role.cluster_role(),
            "namespace": project,
        },
        "roleRef": {"name": role.cluster_role()},
        "userNames": users,
    })
}

fn user_names(binding: &Value) -> Vec<String> {
    binding["userNames"]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn describe(project: &str, user: &str, role: Role) -> String {
    format!("{},{},{}", project, user, role)
}

/// Whether `user` holds `role` in `project`
pub async fn has_role(
    cluster: &dyn ClusterApi,
    project: &str,
    user: &str,
    role: Role,
) -> ReconcileResult<bool> {
    let binding = cluster
        .fetch(ResourceKind::RoleBinding, &binding_key(project, role))
        .await?;
    Ok(binding.is_some_and(|b| user_names(&b).iter().any(|u| u == user)))
}

/// Add `user` to the project's binding for `role`, creating it if needed
pub async fn grant_role(
    cluster: &dyn ClusterApi,
    project: &str,
    user: &str,
    role: Role,
) -> ReconcileResult<()> {
    let key = binding_key(project, role);

    let Some(mut binding) = cluster.fetch(ResourceKind::RoleBinding, &key).await? else {
        let manifest = binding_manifest(project, role, &[user.to_string()]);
        let mutation = cluster
            .create(ResourceKind::RoleBinding, &key, &manifest)
            .await?;
        accepted(Verb::Create, ResourceKind::RoleBinding, &key, mutation)?;
        return Ok(());
    };

    let mut users = user_names(&binding);
    if users.iter().any(|u| u == user) {
        return Err(ReconcileError::Invalid(format!(
            "user role already exists ({})",
            describe(project, user, role)
        )));
    }

    users.push(user.to_string());
    binding["userNames"] = json!(users);
    let mutation = cluster
        .update(ResourceKind::RoleBinding, &key, &binding)
        .await?;
    accepted(Verb::Update, ResourceKind::RoleBinding, &key, mutation)?;
    Ok(())
}

/// Remove `user` from the project's binding for `role`
pub async fn revoke_role(
    cluster: &dyn ClusterApi,
    project: &str,
    user: &str,
    role: Role,
) -> ReconcileResult<()> {
    let key = binding_key(project, role);
    let not_bound = || {
        ReconcileError::Invalid(format!(
            "user role does not exist ({})",
            describe(project, user, role)
        ))
    };

    let mut binding = cluster
        .fetch(ResourceKind::RoleBinding, &key)
        .await?
        .ok_or_else(not_bound)?;

    let users = user_names(&binding);
    if !users.iter().any(|u| u == user) {
        return Err(not_bound());
    }

    let remaining: Vec<String> = users.into_iter().filter(|u| u != user).collect();
    binding["userNames"] = json!(remaining);
    let mutation = cluster
        .update(ResourceKind::RoleBinding, &key, &binding)
        .await?;
    accepted(Verb::Update, ResourceKind::RoleBinding, &key, mutation)?;
    Ok(())
}
