//! Vault storage configuration.
//!
//! Configuration values should be provided by the application, either
//! explicitly through the builder-style `with_` methods or from environment
//! variables via [`VaultStorageConfig::from_env`].

use crate::error::{Result, TokenStorageError};
use prometheus::Registry;
use std::path::PathBuf;

/// Default AppRole `role_id` file path.
pub const DEFAULT_ROLE_ID_FILE: &str = "/etc/spi/role_id";

/// Default AppRole `secret_id` file path.
pub const DEFAULT_SECRET_ID_FILE: &str = "/etc/spi/secret_id";

/// Default path prefix under which all token data is stored.
pub const DEFAULT_DATA_PATH_PREFIX: &str = "spi";

/// Authentication method used to obtain a Vault client token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultAuthMethod {
    /// AppRole authentication with `role_id`/`secret_id` credential files.
    AppRole {
        /// File containing the AppRole `role_id`.
        role_id_file: PathBuf,
        /// File containing the AppRole `secret_id`.
        secret_id_file: PathBuf,
    },

    /// Kubernetes authentication with a service account token.
    Kubernetes {
        /// Vault authentication role bound to the service account.
        role: String,
        /// Service account token file. `None` uses the default in-cluster
        /// path, useful mostly outside local development.
        token_file: Option<PathBuf>,
    },
}

impl VaultAuthMethod {
    /// AppRole authentication with the default credential file locations.
    #[must_use]
    pub fn approle_default() -> Self {
        Self::AppRole {
            role_id_file: PathBuf::from(DEFAULT_ROLE_ID_FILE),
            secret_id_file: PathBuf::from(DEFAULT_SECRET_ID_FILE),
        }
    }
}

/// Configuration for [`VaultTokenStorage`](crate::stores::VaultTokenStorage).
///
/// The metrics registry is deliberately not sourced from the environment:
/// it cannot be expressed as a string option and must be wired in by the
/// application.
#[derive(Clone)]
pub struct VaultStorageConfig {
    /// Vault host URL, trailing `/` trimmed.
    pub host: String,

    /// Authentication method. `None` disables the login handler entirely;
    /// the adapter then runs unauthenticated (degraded mode).
    pub auth_method: Option<VaultAuthMethod>,

    /// Allow `insecure` TLS connections to Vault, accepting untrusted
    /// certificates.
    pub insecure_tls: bool,

    /// Path prefix under which all data is stored. No leading or trailing
    /// `/`; trimmed on construction.
    pub data_path_prefix: String,

    /// Registry the request metrics are registered with during
    /// initialization. `None` disables metrics exposure (degraded mode).
    pub metrics_registry: Option<Registry>,
}

impl VaultStorageConfig {
    /// Create a new configuration for the given Vault host URL.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            auth_method: None,
            insecure_tls: false,
            data_path_prefix: DEFAULT_DATA_PATH_PREFIX.to_string(),
            metrics_registry: None,
        }
    }

    /// Set the authentication method.
    #[must_use]
    pub fn with_auth_method(mut self, method: VaultAuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Allow insecure TLS connections.
    #[must_use]
    pub const fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    /// Set the data path prefix, trimming any leading or trailing `/`.
    #[must_use]
    pub fn with_data_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_path_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Set the metrics registry.
    #[must_use]
    pub fn with_metrics_registry(mut self, registry: Registry) -> Self {
        self.metrics_registry = Some(registry);
        self
    }

    /// Build a configuration from environment variables.
    ///
    /// Recognized variables:
    /// - `VAULT_HOST` (mandatory) - Vault host URL
    /// - `VAULT_INSECURE_TLS` - `true` allows untrusted certificates
    /// - `VAULT_AUTH_METHOD` - `approle` (default) or `kubernetes`
    /// - `VAULT_APPROLE_ROLEID_FILEPATH` / `VAULT_APPROLE_SECRETID_FILEPATH`
    /// - `VAULT_K8S_ROLE` / `VAULT_K8S_SA_TOKEN_FILEPATH`
    /// - `VAULT_DATA_PATH_PREFIX` - defaults to `spi`
    ///
    /// # Errors
    ///
    /// Returns [`TokenStorageError::Configuration`] if `VAULT_HOST` is not
    /// set, if the auth method is unknown, or if the kubernetes method is
    /// selected without `VAULT_K8S_ROLE`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("VAULT_HOST").map_err(|_| {
            TokenStorageError::Configuration("missing VAULT_HOST environment variable".to_string())
        })?;

        let insecure = std::env::var("VAULT_INSECURE_TLS").is_ok_and(|v| v == "true");

        let auth_method = match std::env::var("VAULT_AUTH_METHOD").as_deref() {
            Ok("kubernetes") => {
                let role = std::env::var("VAULT_K8S_ROLE").map_err(|_| {
                    TokenStorageError::Configuration(
                        "VAULT_AUTH_METHOD=kubernetes requires VAULT_K8S_ROLE".to_string(),
                    )
                })?;
                VaultAuthMethod::Kubernetes {
                    role,
                    token_file: std::env::var("VAULT_K8S_SA_TOKEN_FILEPATH")
                        .ok()
                        .map(PathBuf::from),
                }
            }
            Ok("approle") | Err(_) => VaultAuthMethod::AppRole {
                role_id_file: std::env::var("VAULT_APPROLE_ROLEID_FILEPATH")
                    .map_or_else(|_| PathBuf::from(DEFAULT_ROLE_ID_FILE), PathBuf::from),
                secret_id_file: std::env::var("VAULT_APPROLE_SECRETID_FILEPATH")
                    .map_or_else(|_| PathBuf::from(DEFAULT_SECRET_ID_FILE), PathBuf::from),
            },
            Ok(other) => {
                return Err(TokenStorageError::Configuration(format!(
                    "unknown VAULT_AUTH_METHOD '{other}', expected 'approle' or 'kubernetes'"
                )));
            }
        };

        let prefix = std::env::var("VAULT_DATA_PATH_PREFIX")
            .unwrap_or_else(|_| DEFAULT_DATA_PATH_PREFIX.to_string());

        Ok(Self::new(host)
            .with_auth_method(auth_method)
            .with_insecure_tls(insecure)
            .with_data_path_prefix(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_trailing_slash_trimmed() {
        let config = VaultStorageConfig::new("https://vault.example.com/");
        assert_eq!(config.host, "https://vault.example.com");
    }

    #[test]
    fn test_data_path_prefix_trimmed() {
        let config = VaultStorageConfig::new("http://127.0.0.1:8200")
            .with_data_path_prefix("/spi/tokens/");
        assert_eq!(config.data_path_prefix, "spi/tokens");
    }

    #[test]
    fn test_defaults() {
        let config = VaultStorageConfig::new("http://127.0.0.1:8200");
        assert_eq!(config.data_path_prefix, DEFAULT_DATA_PATH_PREFIX);
        assert!(config.auth_method.is_none());
        assert!(config.metrics_registry.is_none());
        assert!(!config.insecure_tls);
    }

    #[test]
    fn test_approle_default_paths() {
        let method = VaultAuthMethod::approle_default();
        assert_eq!(
            method,
            VaultAuthMethod::AppRole {
                role_id_file: PathBuf::from("/etc/spi/role_id"),
                secret_id_file: PathBuf::from("/etc/spi/secret_id"),
            }
        );
    }
}
