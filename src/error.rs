//! Error types for token storage operations.

use thiserror::Error;

/// Result type alias for token storage operations.
pub type Result<T> = std::result::Result<T, TokenStorageError>;

/// Error taxonomy for the Vault token storage adapter.
///
/// An absent record is not an error: `get` returns `Ok(None)` when nothing
/// usable is stored under the owner identity. Error messages never include
/// token payloads, only operation context and the offending path or field.
#[derive(Debug, Error)]
pub enum TokenStorageError {
    /// Transport failure or backend-side error response, wrapped with
    /// operation context.
    #[error("error in Vault: {0}")]
    Vault(String),

    /// A write returned no response and no error. Guards against a backend
    /// contract violation, not a normal failure path.
    #[error("failed to store the token, no error but returned nil")]
    UnspecifiedStore,

    /// A read response was non-empty but missing the expected nested
    /// `"data"` key.
    #[error("corrupted data in Vault at '{path}'")]
    CorruptedData {
        /// Storage path the corrupted response was read from.
        path: String,
    },

    /// The nested secret data was not a string-keyed map.
    #[error("unexpected data")]
    UnexpectedData,

    /// A numeric field was present but not representable as a u64.
    #[error("invalid data: '{value}' in field '{field}' can't be parsed to uint64")]
    InvalidData {
        /// Name of the field that failed to decode.
        field: &'static str,
        /// Raw JSON rendering of the unparsable value.
        value: String,
    },

    /// The login collaborator failed to authenticate against Vault.
    #[error("failed to login to Vault: {0}")]
    LoginFailed(String),

    /// A login response carried no auth info (no client token).
    #[error("no auth info returned from Vault")]
    NoAuthInfo,

    /// Reading a credentials file for login failed.
    #[error("failed to read credentials file '{path}': {source}")]
    CredentialsFile {
        /// Path of the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Registering a metric with the configured registry failed, including
    /// duplicate registration.
    #[error("failed to register metric '{metric}': {message}")]
    MetricsRegistration {
        /// Name of the metric that failed to register.
        metric: &'static str,
        /// Registry error message.
        message: String,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
