//! REST client for the cluster API
//!
//! Thin wrapper over reqwest: every call is a single attempt with the
//! current bearer token, and the raw status is handed back to the caller.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::credentials::TokenSource;
use super::error::{K8sError, K8sResult};
use super::types::{Mutation, ResourceKey, ResourceKind};
use super::ClusterApi;
use crate::config::ClusterConfig;

/// Client for one cluster API server
#[derive(Clone, Debug)]
pub struct K8sClient {
    http: reqwest::Client,
    api_server: String,
    token: TokenSource,
}

impl K8sClient {
    /// Create a client with default transport settings
    pub fn new(api_server: &str, token: TokenSource) -> K8sResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_server: normalize_api_server(api_server)?,
            token,
        })
    }

    /// Create a client from the service configuration
    pub fn from_config(config: &ClusterConfig) -> K8sResult<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.insecure_skip_tls_verify);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            api_server: normalize_api_server(&config.api_url)?,
            token: config.token_source(),
        })
    }

    async fn headers(&self) -> K8sResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let token = self.token.bearer().await?;
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| K8sError::InvalidToken)?;
        headers.insert(AUTHORIZATION, value);

        Ok(headers)
    }

    /// Issue one request and return the status with the decoded body
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> K8sResult<(u16, Value)> {
        let url = format!("{}{}", self.api_server, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers().await?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(%method, %path, status, "cluster API call");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(json) => json,
                Err(_) => Value::String(text),
            }
        };

        Ok((status, body))
    }
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn fetch(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Option<Value>> {
        let (status, body) = self.send(Method::GET, &kind.item_path(key), None).await?;
        match status {
            200..=299 => Ok(Some(body)),
            404 => Ok(None),
            _ => Err(K8sError::UnexpectedStatus {
                kind,
                name: key.to_string(),
                status,
                message: Mutation::new(status, body).message(),
            }),
        }
    }

    async fn list(&self, kind: ResourceKind, namespace: &str) -> K8sResult<Value> {
        let path = kind.collection_path(Some(namespace));
        let (status, body) = self.send(Method::GET, &path, None).await?;
        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(K8sError::UnexpectedStatus {
                kind,
                name: namespace.to_string(),
                status,
                message: Mutation::new(status, body).message(),
            })
        }
    }

    async fn create(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation> {
        let path = kind.collection_path(key.namespace.as_deref());
        let (status, body) = self.send(Method::POST, &path, Some(manifest)).await?;
        Ok(Mutation::new(status, body))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        key: &ResourceKey,
        manifest: &Value,
    ) -> K8sResult<Mutation> {
        let (status, body) = self
            .send(Method::PUT, &kind.item_path(key), Some(manifest))
            .await?;
        Ok(Mutation::new(status, body))
    }

    async fn delete(&self, kind: ResourceKind, key: &ResourceKey) -> K8sResult<Mutation> {
        let (status, body) = self.send(Method::DELETE, &kind.item_path(key), None).await?;
        Ok(Mutation::new(status, body))
    }
}

/// Turn a configured cluster address into a base URL.
///
/// A bare host (`api.example.com:6443`) is taken to mean HTTPS.
pub fn normalize_api_server(raw: &str) -> K8sResult<String> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| K8sError::InvalidUrl(format!("'{}': {}", raw, e)))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(K8sError::InvalidUrl(format!("'{}' has no host", raw)));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(
            normalize_api_server("api.example.com:6443").unwrap(),
            "https://api.example.com:6443"
        );
    }

    #[test]
    fn test_scheme_kept_and_trailing_slash_dropped() {
        assert_eq!(
            normalize_api_server("http://127.0.0.1:8001/").unwrap(),
            "http://127.0.0.1:8001"
        );
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(matches!(
            normalize_api_server(""),
            Err(K8sError::InvalidUrl(_))
        ));
        assert!(normalize_api_server("https://").is_err());
    }
}
