//! Common types and domain logic shared by the acct-mgt service
//!
//! Everything in this crate is free of I/O: project name validation, the
//! quota merge engine and spec builder, and the project role vocabulary.

pub mod naming;
pub mod quota;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Project role a user can be granted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Reader,
}

impl Role {
    /// Name of the cluster role a binding for this role points at
    pub fn cluster_role(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "edit",
            Role::Reader => "view",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Reader => "reader",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "reader" => Ok(Role::Reader),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

/// Domain errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid role, {0} is not one of 'admin', 'member' or 'reader'")]
    InvalidRole(String),

    #[error("project name must match regex '[a-z0-9]([-a-z0-9]*[a-z0-9])?'")]
    InvalidProjectName {
        name: String,
        suggestion: Option<String>,
    },

    #[error("malformed quota key '{0}', expected 'scope:resource:limit'")]
    MalformedQuotaKey(String),

    #[error("quota entry contains no limits")]
    EmptyQuotaEntry,

    #[error("quota request must contain either 'spec' or 'QuotaList'")]
    MalformedQuotaRequest,

    #[error("cannot rename to '{key}': limits {candidates:?} all share its value")]
    AmbiguousRename {
        key: String,
        candidates: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
