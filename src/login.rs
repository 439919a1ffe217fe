//! Login collaborator for Vault authentication.
//!
//! Obtains a client token through one of the supported auth methods and
//! stores it on the [`VaultClient`]. Periodic renewal scheduling is the
//! caller's concern; `login` can simply be invoked again.

use crate::client::VaultClient;
use crate::config::VaultAuthMethod;
use crate::error::{Result, TokenStorageError};
use serde_json::json;
use std::path::Path;

const APPROLE_LOGIN_PATH: &str = "auth/approle/login";
const KUBERNETES_LOGIN_PATH: &str = "auth/kubernetes/login";

/// Default in-cluster service account token location.
const DEFAULT_SA_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Authenticates the adapter to Vault with a configured auth method.
#[derive(Debug, Clone)]
pub struct LoginHandler {
    method: VaultAuthMethod,
}

impl LoginHandler {
    /// Create a login handler for the given auth method.
    #[must_use]
    pub const fn new(method: VaultAuthMethod) -> Self {
        Self { method }
    }

    /// Authenticate against Vault and store the obtained client token on
    /// `client`.
    ///
    /// # Errors
    ///
    /// - [`TokenStorageError::CredentialsFile`] if a credential file
    ///   cannot be read
    /// - [`TokenStorageError::LoginFailed`] if Vault rejects the login
    /// - [`TokenStorageError::NoAuthInfo`] if the login response carries
    ///   no client token
    pub async fn login(&self, client: &VaultClient) -> Result<()> {
        let (path, body) = match &self.method {
            VaultAuthMethod::AppRole {
                role_id_file,
                secret_id_file,
            } => {
                let role_id = read_credential(role_id_file).await?;
                let secret_id = read_credential(secret_id_file).await?;
                (
                    APPROLE_LOGIN_PATH,
                    json!({ "role_id": role_id, "secret_id": secret_id }),
                )
            }
            VaultAuthMethod::Kubernetes { role, token_file } => {
                let token_file = token_file
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SA_TOKEN_FILE.into());
                let jwt = read_credential(&token_file).await?;
                (KUBERNETES_LOGIN_PATH, json!({ "jwt": jwt, "role": role }))
            }
        };

        let secret = client
            .write(path, &body)
            .await
            .map_err(|e| TokenStorageError::LoginFailed(e.to_string()))?;

        let token = secret
            .and_then(|s| s.auth)
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or(TokenStorageError::NoAuthInfo)?;

        client.set_token(token);
        tracing::debug!(method = auth_method_name(&self.method), "logged in to Vault");
        Ok(())
    }
}

const fn auth_method_name(method: &VaultAuthMethod) -> &'static str {
    match method {
        VaultAuthMethod::AppRole { .. } => "approle",
        VaultAuthMethod::Kubernetes { .. } => "kubernetes",
    }
}

async fn read_credential(path: &Path) -> Result<String> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|source| {
        TokenStorageError::CredentialsFile {
            path: path.display().to_string(),
            source,
        }
    })?;
    Ok(contents.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::VaultStorageConfig;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_credential_file_is_reported_with_path() {
        let config = VaultStorageConfig::new("http://127.0.0.1:8200");
        let client = VaultClient::new(&config).expect("client builds");

        let handler = LoginHandler::new(VaultAuthMethod::AppRole {
            role_id_file: PathBuf::from("/nonexistent/role_id"),
            secret_id_file: PathBuf::from("/nonexistent/secret_id"),
        });

        let err = handler.login(&client).await.expect_err("must fail");
        assert!(matches!(
            err,
            TokenStorageError::CredentialsFile { ref path, .. }
                if path == "/nonexistent/role_id"
        ));
    }
}
