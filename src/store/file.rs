//! File-backed [`SecretStore`] shared with out-of-process test code.
//!
//! The file holds a single JSON object mapping username to seed, rewritten after every mutation.
//! Clearing deletes the file outright.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{SecretStore, StoreError, StoreFuture},
};

/// Persists secrets to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileSecretStore {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, TokenSecret>>>,
}
impl FileSecretStore {
	/// Opens a store at `path`, eagerly loading an existing record.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, TokenSecret>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, TokenSecret>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize secret record: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SecretStore for FileSecretStore {
	fn put<'a>(&'a self, username: &'a str, secret: TokenSecret) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(username.to_owned(), secret);
			self.persist_locked(&guard)
		})
	}

	fn get<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.inner.read().get(username).cloned()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.clear();

			match fs::remove_file(&self.path) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to remove {}: {e}", self.path.display()),
				}),
			}
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::{SystemTime, UNIX_EPOCH};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("System clock should be after the Unix epoch.")
			.as_nanos();

		std::env::temp_dir().join(format!("flow-provisioner-{label}-{nanos}.json"))
	}

	#[tokio::test]
	async fn put_persists_a_plain_username_to_seed_object() {
		let path = temp_path("persist");
		let store = FileSecretStore::open(&path).expect("Opening a fresh store should succeed.");

		store.put("alice", "SEEDA".into()).await.expect("Put should succeed.");
		store.put("bob", "SEEDB".into()).await.expect("Put should succeed.");

		let raw = fs::read_to_string(&path).expect("Store file should exist after a put.");
		let parsed: BTreeMap<String, String> =
			serde_json::from_str(&raw).expect("Store file should be a JSON object.");

		assert_eq!(parsed.get("alice").map(String::as_str), Some("SEEDA"));
		assert_eq!(parsed.get("bob").map(String::as_str), Some("SEEDB"));

		let reopened = FileSecretStore::open(&path).expect("Reopening the store should succeed.");
		let seed = reopened
			.get("alice")
			.await
			.expect("Get should succeed.")
			.expect("Seed should survive a reopen.");

		assert_eq!(seed.expose(), "SEEDA");

		reopened.clear().await.expect("Clear should succeed.");
	}

	#[tokio::test]
	async fn clear_removes_the_file_and_tolerates_absence() {
		let path = temp_path("clear");
		let store = FileSecretStore::open(&path).expect("Opening a fresh store should succeed.");

		store.clear().await.expect("Clearing a missing file should succeed.");
		store.put("alice", "s1".into()).await.expect("Put should succeed.");
		store.clear().await.expect("Clear should succeed.");

		assert!(!path.exists());
		assert!(store.get("alice").await.expect("Get should succeed.").is_none());
	}

	#[test]
	fn malformed_file_reports_serialization_error() {
		let path = temp_path("malformed");

		fs::write(&path, b"[not json").expect("Fixture file should be writable.");

		let err = FileSecretStore::open(&path).expect_err("Malformed files should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).expect("Fixture file should be removable.");
	}
}
