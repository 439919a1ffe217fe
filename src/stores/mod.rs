//! Token storage backend implementations.

pub mod vault;

#[cfg(feature = "test-utils")]
pub mod memory;

pub use vault::VaultTokenStorage;

#[cfg(feature = "test-utils")]
pub use memory::MemoryTokenStorage;
