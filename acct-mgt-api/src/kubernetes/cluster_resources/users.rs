//! Composite user operations
//!
//! A platform user is three backend objects: the User, the Identity it logs
//! in with, and the UserIdentityMapping linking them. The backend has no
//! transaction spanning them, so every operation walks the parts in a fixed
//! order, probing each one right before acting on it, and stops at the first
//! rejected mutation without undoing earlier steps. A retry picks up from
//! whatever state the backend is in.

use super::{accepted, ReconcileResult};
use crate::kubernetes::types::{ResourceKey, ResourceKind, Verb};
use crate::kubernetes::ClusterApi;
use serde_json::{json, Value};
use tracing::debug;

/// Who a composite user is and how they log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub username: String,
    pub full_name: Option<String>,
    pub provider: String,
    pub provider_user: String,
}

impl UserIdentity {
    /// Identity on `provider` named after the username
    pub fn new(username: impl Into<String>, provider: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            provider_user: username.clone(),
            username,
            full_name: None,
            provider: provider.into(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_provider_user(mut self, provider_user: impl Into<String>) -> Self {
        self.provider_user = provider_user.into();
        self
    }

    /// Backend name of the identity and of its mapping
    pub fn identity_name(&self) -> String {
        format!("{}:{}", self.provider, self.provider_user)
    }

    fn key(&self, part: UserPart) -> ResourceKey {
        match part {
            UserPart::User => ResourceKey::cluster(&self.username),
            UserPart::Identity | UserPart::Mapping => {
                ResourceKey::identity(&self.provider, &self.provider_user)
            }
        }
    }

    fn manifest(&self, part: UserPart) -> Value {
        match part {
            UserPart::User => json!({
                "kind": "User",
                "apiVersion": "user.openshift.io/v1",
                "metadata": {"name": self.username},
                "fullName": self.full_name.as_deref().unwrap_or(&self.username),
            }),
            UserPart::Identity => json!({
                "kind": "Identity",
                "apiVersion": "user.openshift.io/v1",
                "providerName": self.provider,
                "providerUserName": self.provider_user,
            }),
            UserPart::Mapping => json!({
                "kind": "UserIdentityMapping",
                "apiVersion": "user.openshift.io/v1",
                "user": {"name": self.username},
                "identity": {"name": self.identity_name()},
            }),
        }
    }
}

/// One of the three backend objects of a composite user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserPart {
    User,
    Identity,
    Mapping,
}

impl UserPart {
    /// Creation order; each part depends on the ones before it
    pub const ORDER: [UserPart; 3] = [UserPart::User, UserPart::Identity, UserPart::Mapping];

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::User => ResourceKind::User,
            Self::Identity => ResourceKind::Identity,
            Self::Mapping => ResourceKind::IdentityMapping,
        }
    }
}

impl std::fmt::Display for UserPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Presence of each part, as probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeStatus {
    pub user: bool,
    pub identity: bool,
    pub mapping: bool,
}

impl CompositeStatus {
    pub fn is_complete(&self) -> bool {
        self.user && self.identity && self.mapping
    }

    pub fn is_absent(&self) -> bool {
        !self.user && !self.identity && !self.mapping
    }

    pub fn missing(&self) -> Vec<UserPart> {
        UserPart::ORDER
            .into_iter()
            .filter(|part| !self.get(*part))
            .collect()
    }

    fn get(&self, part: UserPart) -> bool {
        match part {
            UserPart::User => self.user,
            UserPart::Identity => self.identity,
            UserPart::Mapping => self.mapping,
        }
    }

    fn set(&mut self, part: UserPart, present: bool) {
        match part {
            UserPart::User => self.user = present,
            UserPart::Identity => self.identity = present,
            UserPart::Mapping => self.mapping = present,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// All three parts were present before anything was done
    AlreadyExisted,
    /// The listed parts were created
    Created { created: Vec<UserPart> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Neither the user nor the identity existed
    AlreadyAbsent,
    /// The listed parts were deleted
    Deleted { deleted: Vec<UserPart> },
}

/// Probe one part. A mapping only counts if it links this user.
async fn probe(
    cluster: &dyn ClusterApi,
    identity: &UserIdentity,
    part: UserPart,
) -> ReconcileResult<bool> {
    let key = identity.key(part);
    let present = match part {
        UserPart::Mapping => cluster
            .fetch(part.kind(), &key)
            .await?
            .is_some_and(|mapping| mapping["user"]["name"] == identity.username.as_str()),
        _ => cluster.exists(part.kind(), &key).await?,
    };

    debug!(user = %identity.username, %part, present, "probed user part");
    Ok(present)
}

/// Report which parts of the composite user exist
pub async fn observe(
    cluster: &dyn ClusterApi,
    identity: &UserIdentity,
) -> ReconcileResult<CompositeStatus> {
    let mut status = CompositeStatus::default();
    for part in UserPart::ORDER {
        status.set(part, probe(cluster, identity, part).await?);
    }
    Ok(status)
}

/// Create whatever parts of the composite user are missing
pub async fn ensure_user(
    cluster: &dyn ClusterApi,
    identity: &UserIdentity,
) -> ReconcileResult<CreateOutcome> {
    let mut created = Vec::new();

    for part in UserPart::ORDER {
        if probe(cluster, identity, part).await? {
            continue;
        }

        let key = identity.key(part);
        let mutation = cluster
            .create(part.kind(), &key, &identity.manifest(part))
            .await?;
        accepted(Verb::Create, part.kind(), &key, mutation)?;
        created.push(part);
    }

    if created.is_empty() {
        Ok(CreateOutcome::AlreadyExisted)
    } else {
        Ok(CreateOutcome::Created { created })
    }
}

/// Delete the user and its identity.
///
/// The mapping is not deleted on its own; the backend drops it along with
/// either end.
pub async fn remove_user(
    cluster: &dyn ClusterApi,
    identity: &UserIdentity,
) -> ReconcileResult<DeleteOutcome> {
    let mut deleted = Vec::new();

    for part in [UserPart::User, UserPart::Identity] {
        if !probe(cluster, identity, part).await? {
            continue;
        }

        let key = identity.key(part);
        let mutation = cluster.delete(part.kind(), &key).await?;
        accepted(Verb::Delete, part.kind(), &key, mutation)?;
        deleted.push(part);
    }

    if deleted.is_empty() {
        Ok(DeleteOutcome::AlreadyAbsent)
    } else {
        Ok(DeleteOutcome::Deleted { deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::cluster_resources::ReconcileError;
    use crate::kubernetes::memory::InMemoryCluster;

    fn alice() -> UserIdentity {
        UserIdentity::new("alice", "sso_auth")
    }

    #[tokio::test]
    async fn test_ensure_creates_all_parts_in_order() {
        let cluster = InMemoryCluster::new();
        let outcome = ensure_user(&cluster, &alice()).await.unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Created {
                created: UserPart::ORDER.to_vec()
            }
        );

        let kinds: Vec<ResourceKind> = cluster.mutations().await.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::User,
                ResourceKind::Identity,
                ResourceKind::IdentityMapping
            ]
        );
        assert!(observe(&cluster, &alice()).await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let cluster = InMemoryCluster::new();
        ensure_user(&cluster, &alice()).await.unwrap();
        cluster.clear_calls().await;

        let outcome = ensure_user(&cluster, &alice()).await.unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExisted);
        assert!(cluster.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_completes_partial_state() {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(ResourceKind::User, ResourceKey::cluster("alice"), json!({}))
            .await;

        let outcome = ensure_user(&cluster, &alice()).await.unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Created {
                created: vec![UserPart::Identity, UserPart::Mapping]
            }
        );
    }

    #[tokio::test]
    async fn test_failed_user_create_stops_the_sequence() {
        let cluster = InMemoryCluster::new();
        cluster.reject(Verb::Create, ResourceKind::User, 500).await;

        let err = ensure_user(&cluster, &alice()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Rejected {
                kind: ResourceKind::User,
                ..
            }
        ));

        let touched: Vec<ResourceKind> = cluster.calls().await.iter().map(|c| c.kind).collect();
        assert!(!touched.contains(&ResourceKind::Identity));
        assert!(!touched.contains(&ResourceKind::IdentityMapping));
    }

    #[tokio::test]
    async fn test_failed_identity_create_keeps_user() {
        let cluster = InMemoryCluster::new();
        cluster.reject(Verb::Create, ResourceKind::Identity, 403).await;

        assert!(ensure_user(&cluster, &alice()).await.is_err());

        let status = observe(&cluster, &alice()).await.unwrap();
        assert!(status.user);
        assert_eq!(status.missing(), vec![UserPart::Identity, UserPart::Mapping]);
    }

    #[tokio::test]
    async fn test_mapping_to_other_user_is_not_ours() {
        let cluster = InMemoryCluster::new();
        let identity = ResourceKey::identity("sso_auth", "alice");
        cluster
            .insert(ResourceKind::IdentityMapping, identity, json!({"user": {"name": "mallory"}}))
            .await;

        let status = observe(&cluster, &alice()).await.unwrap();
        assert!(!status.mapping);
    }

    #[tokio::test]
    async fn test_remove_absent_user_issues_no_mutations() {
        let cluster = InMemoryCluster::new();
        let outcome = remove_user(&cluster, &alice()).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);
        assert!(cluster.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_deletes_user_then_identity() {
        let cluster = InMemoryCluster::new();
        ensure_user(&cluster, &alice()).await.unwrap();
        cluster.clear_calls().await;

        let outcome = remove_user(&cluster, &alice()).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::Deleted {
                deleted: vec![UserPart::User, UserPart::Identity]
            }
        );

        let kinds: Vec<ResourceKind> = cluster.mutations().await.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ResourceKind::User, ResourceKind::Identity]);
        assert!(observe(&cluster, &alice()).await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_failed_user_delete_stops_before_identity() {
        let cluster = InMemoryCluster::new();
        ensure_user(&cluster, &alice()).await.unwrap();
        cluster.clear_calls().await;
        cluster.reject(Verb::Delete, ResourceKind::User, 500).await;

        let err = remove_user(&cluster, &alice()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Rejected {
                kind: ResourceKind::User,
                ..
            }
        ));
        assert!(err.to_string().contains("unable to delete user (alice)"));

        let deletes: Vec<ResourceKind> = cluster.mutations().await.iter().map(|c| c.kind).collect();
        assert_eq!(deletes, vec![ResourceKind::User]);
        assert!(cluster
            .object(ResourceKind::Identity, &alice().key(UserPart::Identity))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_probe_error_is_not_absence() {
        let cluster = InMemoryCluster::new();
        cluster.reject(Verb::Get, ResourceKind::Identity, 500).await;

        let err = ensure_user(&cluster, &alice()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Cluster(_)));
        // the user was created before the identity probe failed
        assert_eq!(cluster.mutations().await.len(), 1);
    }

    #[test]
    fn test_manifests() {
        let identity = alice()
            .with_full_name("Alice Liddell")
            .with_provider_user("alice@example.com");
        assert_eq!(identity.identity_name(), "sso_auth:alice@example.com");
        assert_eq!(identity.manifest(UserPart::User)["fullName"], "Alice Liddell");
        assert_eq!(
            identity.manifest(UserPart::Mapping)["identity"]["name"],
            "sso_auth:alice@example.com"
        );
        assert_eq!(alice().manifest(UserPart::User)["fullName"], "alice");
    }
}
