//! In-process [`SecretStore`] used by tests and dry runs.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{SecretStore, StoreError, StoreFuture},
};

/// Thread-safe in-memory secret store.
#[derive(Clone, Debug, Default)]
pub struct MemorySecretStore {
	inner: Arc<RwLock<HashMap<String, TokenSecret>>>,
}
impl MemorySecretStore {
	/// Returns the number of stored secrets.
	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}
impl SecretStore for MemorySecretStore {
	fn put<'a>(&'a self, username: &'a str, secret: TokenSecret) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.inner.write().insert(username.to_owned(), secret);

			Ok::<_, StoreError>(())
		})
	}

	fn get<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.inner.read().get(username).cloned()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.inner.write().clear();

			Ok(())
		})
	}
}
