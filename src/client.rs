//! Minimal Vault "logical" HTTP client.
//!
//! Covers exactly the slice of the Vault HTTP API the token storage needs:
//! read, write, and delete of logical paths under `/v1/`, with the auth
//! token header and per-request metrics collection. TLS, connection
//! pooling, and request cancellation (dropping the future aborts the
//! in-flight request) are reqwest's.

use crate::config::VaultStorageConfig;
use crate::metrics::HttpMetricCollector;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use thiserror::Error;

/// Errors produced by the Vault client.
#[derive(Debug, Error)]
pub enum VaultClientError {
    /// Building the underlying HTTP client failed.
    #[error("error creating the client: {0}")]
    ClientBuild(String),

    /// The HTTP request failed in transport, before any response arrived.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Vault answered with an error status.
    #[error("Vault returned status {status}: {message}")]
    Api {
        /// HTTP status code of the error response.
        status: u16,
        /// Error messages from the response body, joined.
        message: String,
    },

    /// A response body could not be parsed as a Vault secret.
    #[error("response parsing failed: {0}")]
    ResponseParseFailed(String),
}

/// Auth info attached to a login response.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretAuth {
    /// Client token to present on subsequent requests.
    #[serde(default)]
    pub client_token: String,

    /// Lease duration of the token, in seconds.
    #[serde(default)]
    pub lease_duration: u64,

    /// Whether the token can be renewed.
    #[serde(default)]
    pub renewable: bool,
}

/// A logical-path response from Vault.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secret {
    /// Vault-assigned request id.
    #[serde(default)]
    pub request_id: String,

    /// Generic string-keyed response data. Absent on login responses.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,

    /// Non-fatal warnings attached by the backend.
    #[serde(default)]
    pub warnings: Option<Vec<String>>,

    /// Auth info, present on login responses.
    #[serde(default)]
    pub auth: Option<SecretAuth>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Vault HTTP client for logical read/write/delete operations.
///
/// Cheap to clone; the auth token slot is shared between clones so a login
/// through one handle authenticates all of them. Safe for concurrent use.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    token: Arc<RwLock<Option<String>>>,
    metrics: HttpMetricCollector,
}

impl VaultClient {
    /// Create a new client for the configured Vault host.
    ///
    /// # Errors
    ///
    /// Returns [`VaultClientError::ClientBuild`] if the underlying HTTP
    /// client cannot be constructed.
    pub fn new(config: &VaultStorageConfig) -> Result<Self, VaultClientError> {
        let mut builder = reqwest::Client::builder();
        if config.insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| VaultClientError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            address: config.host.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            metrics: HttpMetricCollector,
        })
    }

    /// Set the auth token presented on subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the secret at a logical path.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error for anything but a clean read or a
    /// plain "not found".
    pub async fn read(&self, path: &str) -> Result<Option<Secret>, VaultClientError> {
        self.request(Method::GET, path, None).await
    }

    /// Write `body` to a logical path, returning the backend's response
    /// secret if it produced one.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error if the write is rejected.
    pub async fn write(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<Option<Secret>, VaultClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Delete the secret at a logical path.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error if the delete is rejected.
    pub async fn delete(&self, path: &str) -> Result<Option<Secret>, VaultClientError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Secret>, VaultClientError> {
        let url = format!("{}/v1/{}", self.address, path);

        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.current_token() {
            request = request.header("X-Vault-Token", token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            // No response, nothing to label metrics with.
            VaultClientError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        self.metrics.observe(&method, Some(status), started.elapsed());

        if status == StatusCode::NOT_FOUND {
            // A 404 with no error messages is the normal "no secret at this
            // path" outcome; with messages it is a backend error.
            let parsed: ErrorResponse = response.json().await.unwrap_or_default();
            if parsed.errors.is_empty() {
                return Ok(None);
            }
            return Err(VaultClientError::Api {
                status: status.as_u16(),
                message: parsed.errors.join("; "),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .filter(|e| !e.errors.is_empty())
                .map_or(body, |e| e.errors.join("; "));
            return Err(VaultClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| VaultClientError::RequestFailed(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Secret>(&body)
            .map(Some)
            .map_err(|e| VaultClientError::ResponseParseFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultStorageConfig;

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = VaultStorageConfig::new("http://127.0.0.1:8200///");
        let client = VaultClient::new(&config).unwrap_or_else(|_| unreachable!());
        assert_eq!(client.address, "http://127.0.0.1:8200");
    }

    #[test]
    fn test_token_shared_between_clones() {
        let config = VaultStorageConfig::new("http://127.0.0.1:8200");
        let client = VaultClient::new(&config).unwrap_or_else(|_| unreachable!());
        let clone = client.clone();

        client.set_token("s.abcdef");
        assert_eq!(clone.current_token().as_deref(), Some("s.abcdef"));
    }
}
