//! Application State
//!
//! Shared state for the acct-mgt API server

use std::sync::Arc;

use crate::config::{AcctMgtConfig, BackendKind};
use crate::kubernetes::{ClusterApi, InMemoryCluster, K8sClient, K8sResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AcctMgtConfig>,
    pub cluster: Arc<dyn ClusterApi>,
}

impl AppState {
    pub fn new(config: AcctMgtConfig, cluster: Arc<dyn ClusterApi>) -> Self {
        Self {
            config: Arc::new(config),
            cluster,
        }
    }

    /// Build the state with the backend the configuration selects
    pub fn from_config(config: AcctMgtConfig) -> K8sResult<Self> {
        let cluster: Arc<dyn ClusterApi> = match config.cluster.backend {
            BackendKind::Rest => Arc::new(K8sClient::from_config(&config.cluster)?),
            BackendKind::Memory => Arc::new(InMemoryCluster::new()),
        };
        Ok(Self::new(config, cluster))
    }

    /// Identity provider for requests that name none
    pub fn default_provider(&self) -> &str {
        &self.config.identity.default_provider
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.config.cluster.backend)
            .field("api_url", &self.config.cluster.api_url)
            .finish_non_exhaustive()
    }
}
