//! Token storage trait and data types.
//!
//! Stores OAuth access tokens and refresh tokens keyed by an owner
//! identity.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The (namespace, name) pair identifying who a stored token belongs to.
///
/// Used only to build a storage path; neither component is validated or
/// escaped, so values containing path-meaningful characters (e.g. `/`)
/// will corrupt the computed path. The backend enforces whatever character
/// rules it has.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerIdentity {
    /// Namespace the owner lives in.
    pub namespace: String,
    /// Name of the owner within the namespace.
    pub name: String,
}

impl OwnerIdentity {
    /// Create a new owner identity.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// The OAuth credential payload persisted per owner identity.
///
/// Wire field names are exactly `username`, `access_token`, `token_type`,
/// `refresh_token`, `expiry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Username the token was issued for.
    pub username: String,

    /// OAuth access token.
    pub access_token: String,

    /// Token type (e.g. `Bearer`).
    pub token_type: String,

    /// OAuth refresh token.
    pub refresh_token: String,

    /// Expiry as seconds since epoch; 0 means "unset".
    pub expiry: u64,
}

/// Token storage keyed by owner identity.
///
/// A token record has no independent identity: it is fully replaced on
/// `store`, read in full by `get`, and removed in full by `delete`. There
/// are no partial updates and no retries at this layer. Callers cancel an
/// operation by dropping its future (or wrapping it in
/// `tokio::time::timeout`), which aborts the in-flight backend request.
pub trait TokenStorage: Send + Sync {
    /// Initialize the storage: authenticate to the backend and register
    /// metrics, where configured. Must be called before the other
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns an error if login or metric registration fails. A missing
    /// login handler or metrics registry is a valid degraded mode, not an
    /// error.
    fn initialize(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Store a token record for an owner, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write or returns no
    /// response at all.
    fn store(
        &self,
        owner: &OwnerIdentity,
        token: &TokenRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Get the token record stored for an owner.
    ///
    /// # Returns
    ///
    /// - `Some(record)` if found
    /// - `None` if no record exists for this owner
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or the stored data does
    /// not decode.
    fn get(
        &self,
        owner: &OwnerIdentity,
    ) -> impl std::future::Future<Output = Result<Option<TokenRecord>>> + Send;

    /// Delete the token record stored for an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    fn delete(&self, owner: &OwnerIdentity) -> impl std::future::Future<Output = Result<()>> + Send;
}
