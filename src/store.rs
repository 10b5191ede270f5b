//! Run-scoped persistence for per-user second-factor seeds.
//!
//! A store holds one record mapping username to seed. The orchestrator clears it unconditionally
//! before provisioning so a seed from an earlier run never outlives the credential it belonged to.

pub mod file;
pub mod memory;

pub use file::FileSecretStore;
pub use memory::MemorySecretStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`SecretStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage contract for per-run secrets keyed by username.
pub trait SecretStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the secret for `username`.
	fn put<'a>(&'a self, username: &'a str, secret: TokenSecret) -> StoreFuture<'a, ()>;

	/// Fetches the secret for `username`, if present.
	fn get<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<TokenSecret>>;

	/// Drops every stored secret.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SecretStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// The persisted record could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
