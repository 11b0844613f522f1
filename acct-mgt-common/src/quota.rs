//! Resource quota documents
//!
//! Two pieces of quota logic live here:
//! - [`build_scoped_specs`] expands flattened `scope:resource:limit` entries
//!   into nested quota specs, one per scope.
//! - [`merge_hard_limits`] applies a partial change set to a quota's
//!   `spec.hard` map, including the rename-by-value rule.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The `spec.hard` map of a resource quota
pub type HardLimits = BTreeMap<String, Value>;

/// A flattened quota key of the form `scope:resource:limit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaKey {
    pub scope: String,
    pub resource: String,
    pub limit: String,
}

impl FromStr for QuotaKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [scope, resource, limit]
                if !scope.is_empty() && !resource.is_empty() && !limit.is_empty() =>
            {
                Ok(Self {
                    scope: scope.to_string(),
                    resource: resource.to_string(),
                    limit: limit.to_string(),
                })
            }
            _ => Err(Error::MalformedQuotaKey(s.to_string())),
        }
    }
}

/// Body of a quota create request
///
/// Either a direct `spec` or a `QuotaList` of flattened entries. Any other
/// top-level fields (`metadata`, `kind`, ...) are carried into every manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuotaRequest {
    List {
        #[serde(rename = "QuotaList")]
        quota_list: Vec<Map<String, Value>>,
        #[serde(flatten)]
        template: Map<String, Value>,
    },
    Direct {
        spec: Value,
        #[serde(flatten)]
        template: Map<String, Value>,
    },
}

impl QuotaRequest {
    /// Expand into the quota manifests to create, in request order.
    ///
    /// Every entry is validated before anything is returned, so a malformed
    /// key anywhere rejects the whole request.
    pub fn into_manifests(self) -> Result<Vec<Map<String, Value>>> {
        match self {
            QuotaRequest::Direct { spec, mut template } => {
                template.insert("spec".to_string(), spec);
                Ok(vec![template])
            }
            QuotaRequest::List {
                quota_list,
                template,
            } => {
                if quota_list.is_empty() {
                    return Err(Error::EmptyQuotaEntry);
                }

                let mut manifests = Vec::new();
                for entry in &quota_list {
                    for spec in build_scoped_specs(entry)? {
                        let mut manifest = template.clone();
                        manifest.insert("spec".to_string(), spec);
                        manifests.push(manifest);
                    }
                }
                Ok(manifests)
            }
        }
    }
}

/// Body of a quota update request: `{"spec": {"hard": {...}}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaPatch {
    pub spec: QuotaPatchSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaPatchSpec {
    pub hard: HardLimits,
}

/// Build one quota spec per scope from a flattened entry.
///
/// `{"project:cpu:requests.cpu": "4"}` becomes
/// `{"cpu": {"requests.cpu": "4"}, "scopes": ["project"]}`.
pub fn build_scoped_specs(entry: &Map<String, Value>) -> Result<Vec<Value>> {
    if entry.is_empty() {
        return Err(Error::EmptyQuotaEntry);
    }

    let mut by_scope: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for (raw, value) in entry {
        let key: QuotaKey = raw.parse()?;
        // "scopes" is reserved for the scope list itself
        if key.resource == "scopes" {
            return Err(Error::MalformedQuotaKey(raw.clone()));
        }

        let spec = by_scope.entry(key.scope).or_default();
        let limits = spec
            .entry(key.resource)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(limits) = limits {
            limits.insert(key.limit, value.clone());
        }
    }

    Ok(by_scope
        .into_iter()
        .map(|(scope, mut spec)| {
            spec.insert(
                "scopes".to_string(),
                Value::Array(vec![Value::String(scope)]),
            );
            Value::Object(spec)
        })
        .collect())
}

/// Apply `changes` to `current`, returning the new `spec.hard` map.
///
/// For each changed key, in key order:
/// - an existing key with the same name takes the new value;
/// - otherwise an existing key holding the same value is renamed to the
///   changed key;
/// - otherwise the key is added.
///
/// Keys named in `changes` are never rename candidates. When more than one
/// existing key holds the value the rename target is ambiguous and the merge
/// fails with [`Error::AmbiguousRename`].
pub fn merge_hard_limits(current: &HardLimits, changes: &HardLimits) -> Result<HardLimits> {
    let mut merged = current.clone();

    for (key, value) in changes {
        if let Some(existing) = merged.get_mut(key) {
            *existing = value.clone();
            continue;
        }

        let candidates: Vec<String> = merged
            .iter()
            .filter(|(k, v)| *v == value && !changes.contains_key(*k))
            .map(|(k, _)| k.clone())
            .collect();

        match candidates.as_slice() {
            [] => {}
            [renamed] => {
                merged.remove(renamed);
            }
            _ => {
                return Err(Error::AmbiguousRename {
                    key: key.clone(),
                    candidates,
                })
            }
        }
        merged.insert(key.clone(), value.clone());
    }

    Ok(merged)
}
