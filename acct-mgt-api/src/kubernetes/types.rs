//! Kubernetes types for the acct-mgt API
//!
//! Resource kinds the service manages, their natural keys, and the outcome
//! of a single mutation against the cluster API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Project,
    User,
    Identity,
    IdentityMapping,
    RoleBinding,
    ResourceQuota,
}

impl ResourceKind {
    /// API group prefix, without trailing slash
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Self::Project => "/apis/project.openshift.io/v1",
            Self::User | Self::Identity | Self::IdentityMapping => "/apis/user.openshift.io/v1",
            Self::RoleBinding => "/apis/authorization.openshift.io/v1",
            Self::ResourceQuota => "/api/v1",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::User => "users",
            Self::Identity => "identities",
            Self::IdentityMapping => "useridentitymappings",
            Self::RoleBinding => "rolebindings",
            Self::ResourceQuota => "resourcequotas",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(self, Self::RoleBinding | Self::ResourceQuota)
    }

    /// Path of the collection, e.g. `/api/v1/namespaces/p1/resourcequotas`
    pub fn collection_path(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) if self.is_namespaced() => format!(
                "{}/namespaces/{}/{}",
                self.api_prefix(),
                urlencoding::encode(ns),
                self.plural()
            ),
            _ => format!("{}/{}", self.api_prefix(), self.plural()),
        }
    }

    /// Path of a single object
    pub fn item_path(&self, key: &ResourceKey) -> String {
        format!(
            "{}/{}",
            self.collection_path(key.namespace.as_deref()),
            urlencoding::encode(&key.name)
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::User => write!(f, "user"),
            Self::Identity => write!(f, "identity"),
            Self::IdentityMapping => write!(f, "user identity mapping"),
            Self::RoleBinding => write!(f, "rolebinding"),
            Self::ResourceQuota => write!(f, "resource quota"),
        }
    }
}

/// Natural key of a backend object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceKey {
    /// Key of a cluster-scoped object
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Key of an object inside a project
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Identities and their mappings are named `<provider>:<provider user>`
    pub fn identity(provider: &str, provider_user: &str) -> Self {
        Self::cluster(format!("{}:{}", provider, provider_user))
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Verbs issued against the cluster API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Outcome of one create/update/delete call
///
/// A non-2xx status is not an error at this layer; the caller decides what
/// a rejection means.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub status: u16,
    pub body: Value,
}

impl Mutation {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Human-readable reason from a `Status` response, if any
    pub fn message(&self) -> String {
        match &self.body {
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Value::String(text) => text.clone(),
            _ => String::new(),
        }
    }
}
