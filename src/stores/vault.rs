//! Vault-backed token storage implementation.
//!
//! Persists each token record as a KV v2 secret at
//! `{prefix}/data/{namespace}/{name}`, wrapped in the secret engine's
//! `{"data": ...}` envelope. Every operation is one round trip to Vault;
//! the adapter keeps no state between calls and is safe for concurrent
//! use.

use crate::client::{Secret, VaultClient};
use crate::config::VaultStorageConfig;
use crate::error::{Result, TokenStorageError};
use crate::login::LoginHandler;
use crate::metrics;
use crate::storage::{OwnerIdentity, TokenRecord, TokenStorage};
use serde_json::{json, Map, Value};

/// Vault-backed token storage.
///
/// Construction only builds the client; authentication and metric
/// registration happen in [`TokenStorage::initialize`]. The instance is
/// effectively immutable afterwards.
#[derive(Clone)]
pub struct VaultTokenStorage {
    client: VaultClient,
    login_handler: Option<LoginHandler>,
    config: VaultStorageConfig,
}

impl VaultTokenStorage {
    /// Create a new Vault token storage from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStorageError::Vault`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: VaultStorageConfig) -> Result<Self> {
        let client = VaultClient::new(&config)
            .map_err(|e| TokenStorageError::Vault(e.to_string()))?;
        let login_handler = config.auth_method.clone().map(LoginHandler::new);

        Ok(Self {
            client,
            login_handler,
            config,
        })
    }

    /// Compute the storage path for an owner identity.
    fn data_path(&self, owner: &OwnerIdentity) -> String {
        format!(
            "{}/data/{}/{}",
            self.config.data_path_prefix, owner.namespace, owner.name
        )
    }

    fn log_warnings(secret: &Secret) {
        for warning in secret.warnings.iter().flatten() {
            tracing::info!(warning = %warning, "Vault returned a warning");
        }
    }
}

impl TokenStorage for VaultTokenStorage {
    async fn initialize(&self) -> Result<()> {
        if let Some(handler) = &self.login_handler {
            handler.login(&self.client).await?;
        } else {
            tracing::info!("no login handler configured for Vault - token refresh disabled");
        }

        if let Some(registry) = &self.config.metrics_registry {
            metrics::register(registry)?;
        } else {
            tracing::info!(
                "no metrics registry configured - metrics collection for Vault access is disabled"
            );
        }

        Ok(())
    }

    async fn store(&self, owner: &OwnerIdentity, token: &TokenRecord) -> Result<()> {
        let path = self.data_path(owner);
        let envelope = json!({ "data": token });

        let secret = self
            .client
            .write(&path, &envelope)
            .await
            .map_err(|e| TokenStorageError::Vault(format!("error writing the data: {e}")))?;

        let Some(secret) = secret else {
            return Err(TokenStorageError::UnspecifiedStore);
        };
        Self::log_warnings(&secret);

        Ok(())
    }

    async fn get(&self, owner: &OwnerIdentity) -> Result<Option<TokenRecord>> {
        let path = self.data_path(owner);

        let secret = self
            .client
            .read(&path)
            .await
            .map_err(|e| TokenStorageError::Vault(format!("error reading the data: {e}")))?;

        let Some(secret) = secret else {
            tracing::debug!(%path, "no data found in Vault");
            return Ok(None);
        };
        Self::log_warnings(&secret);

        let Some(data) = secret.data.as_ref().filter(|map| !map.is_empty()) else {
            tracing::debug!(%path, "no data found in Vault");
            return Ok(None);
        };

        match data.get("data") {
            None => Err(TokenStorageError::CorruptedData { path }),
            Some(Value::Null) => {
                tracing::debug!(%path, "no data found in Vault");
                Ok(None)
            }
            Some(value) => decode_record(value).map(Some),
        }
    }

    async fn delete(&self, owner: &OwnerIdentity) -> Result<()> {
        let path = self.data_path(owner);

        let secret = self
            .client
            .delete(&path)
            .await
            .map_err(|e| TokenStorageError::Vault(format!("error deleting the data: {e}")))?;

        tracing::debug!(
            %path,
            request_id = secret.as_ref().map(|s| s.request_id.as_str()).unwrap_or_default(),
            "deleted token record"
        );
        Ok(())
    }
}

/// Decode a token record from the nested secret data.
///
/// String fields are extracted leniently: absent or non-string values
/// default to the empty string, never an error. `expiry` is strict: absent
/// (or JSON null) decodes to 0, but any other value that is not an
/// unsigned 64-bit integer is an [`TokenStorageError::InvalidData`] error.
/// Malformed text fields are tolerated, a malformed numeric field
/// indicates deeper corruption worth failing on.
fn decode_record(data: &Value) -> Result<TokenRecord> {
    let map = data.as_object().ok_or(TokenStorageError::UnexpectedData)?;

    Ok(TokenRecord {
        username: string_field(map, "username"),
        access_token: string_field(map, "access_token"),
        token_type: string_field(map, "token_type"),
        refresh_token: string_field(map, "refresh_token"),
        expiry: u64_field(map, "expiry")?,
    })
}

fn string_field(source: &Map<String, Value>, field: &str) -> String {
    source
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

fn u64_field(source: &Map<String, Value>, field: &'static str) -> Result<u64> {
    match source.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| TokenStorageError::InvalidData {
                field,
                value: value.to_string(),
            }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn storage(prefix: &str) -> VaultTokenStorage {
        let config =
            VaultStorageConfig::new("http://127.0.0.1:8200").with_data_path_prefix(prefix);
        VaultTokenStorage::new(config).expect("storage builds")
    }

    #[test]
    fn test_data_path_format() {
        let storage = storage("spi");
        let owner = OwnerIdentity::new("team-a", "github-token");
        assert_eq!(storage.data_path(&owner), "spi/data/team-a/github-token");
    }

    #[test]
    fn test_data_path_prefix_trimmed() {
        let storage = storage("/spi/");
        let owner = OwnerIdentity::new("ns", "n");
        assert_eq!(storage.data_path(&owner), "spi/data/ns/n");
    }

    #[test]
    fn test_decode_full_record() {
        let data = json!({
            "username": "alois",
            "access_token": "at-123",
            "token_type": "Bearer",
            "refresh_token": "rt-456",
            "expiry": 1_700_000_000u64,
        });

        let record = decode_record(&data).expect("decodes");
        assert_eq!(record.username, "alois");
        assert_eq!(record.access_token, "at-123");
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.refresh_token, "rt-456");
        assert_eq!(record.expiry, 1_700_000_000);
    }

    #[test]
    fn test_decode_missing_string_field_defaults_to_empty() {
        let data = json!({ "access_token": "at-123" });

        let record = decode_record(&data).expect("decodes");
        assert_eq!(record.username, "");
        assert_eq!(record.access_token, "at-123");
        assert_eq!(record.refresh_token, "");
        assert_eq!(record.expiry, 0);
    }

    #[test]
    fn test_decode_non_string_field_defaults_to_empty() {
        let data = json!({ "username": 42, "access_token": "at-123" });

        let record = decode_record(&data).expect("decodes");
        assert_eq!(record.username, "");
    }

    #[test]
    fn test_decode_expiry_string_is_invalid_data() {
        let data = json!({ "expiry": "not-a-number" });

        let err = decode_record(&data).expect_err("must fail");
        assert!(matches!(
            err,
            TokenStorageError::InvalidData { field: "expiry", ref value }
                if value == "\"not-a-number\""
        ));
    }

    #[test]
    fn test_decode_expiry_negative_is_invalid_data() {
        let data = json!({ "expiry": -5 });

        let err = decode_record(&data).expect_err("must fail");
        assert!(matches!(
            err,
            TokenStorageError::InvalidData { field: "expiry", .. }
        ));
    }

    #[test]
    fn test_decode_expiry_null_defaults_to_zero() {
        let data = json!({ "expiry": null });
        assert_eq!(decode_record(&data).expect("decodes").expiry, 0);
    }

    #[test]
    fn test_decode_non_map_is_unexpected_data() {
        let data = json!("just a string");

        let err = decode_record(&data).expect_err("must fail");
        assert!(matches!(err, TokenStorageError::UnexpectedData));
    }
}
