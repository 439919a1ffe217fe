//! # Vault Token Storage
//!
//! A thin async adapter that persists OAuth-style access tokens in
//! HashiCorp Vault's KV v2 secret engine, keyed by an owner identity
//! (namespace + name).
//!
//! ## Features
//!
//! - `store` / `get` / `delete` of a five-field token record, one Vault
//!   round trip per operation
//! - AppRole and Kubernetes login
//! - Prometheus request-count and response-time metrics labeled by HTTP
//!   method and status code
//! - An in-memory store for tests (behind the default `test-utils`
//!   feature)
//!
//! There are no retries, no caching, and no renewal scheduling at this
//! layer; resilience belongs to the backend or to an outer collaborator.
//!
//! ## Example
//!
//! ```no_run
//! use vault_token_storage::{
//!     OwnerIdentity, TokenRecord, TokenStorage, VaultStorageConfig, VaultTokenStorage,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VaultStorageConfig::from_env()?
//!     .with_metrics_registry(prometheus::Registry::new());
//! let storage = VaultTokenStorage::new(config)?;
//! storage.initialize().await?;
//!
//! let owner = OwnerIdentity::new("team-a", "github-token");
//! let record = TokenRecord {
//!     username: "octocat".to_string(),
//!     access_token: "gho_...".to_string(),
//!     token_type: "Bearer".to_string(),
//!     refresh_token: String::new(),
//!     expiry: 0,
//! };
//!
//! storage.store(&owner, &record).await?;
//! let fetched = storage.get(&owner).await?;
//! assert_eq!(fetched.as_ref(), Some(&record));
//! storage.delete(&owner).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod login;
pub mod metrics;
pub mod storage;
pub mod stores;

// Re-export main types for convenience
pub use client::{Secret, VaultClient, VaultClientError};
pub use config::{VaultAuthMethod, VaultStorageConfig};
pub use error::{Result, TokenStorageError};
pub use login::LoginHandler;
pub use metrics::HttpMetricCollector;
pub use storage::{OwnerIdentity, TokenRecord, TokenStorage};
pub use stores::VaultTokenStorage;

#[cfg(feature = "test-utils")]
pub use stores::MemoryTokenStorage;
