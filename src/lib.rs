//! Provision reproducible, tree-shaped authentication flows and fully built test realms through an
//! identity provider's admin API, then await the mail those realms send.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod flow;
pub mod http;
pub mod mail;
pub mod obs;
pub mod poll;
pub mod realm;
pub mod scenario;
pub mod store;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests that point the crate at an
	//! `httpmock` server. Integration tests reach this module through the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		admin::AdminClient,
		config::ProvisionerConfig,
		flow::{FlowBuilder, MemoryFlowRemote},
		realm::RealmProvisioner,
	};

	/// Token endpoint path served by the admin realm.
	pub const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";
	/// Token endpoint body accepted by [`AdminClient`] during tests.
	pub const TOKEN_BODY: &str =
		"{\"access_token\":\"admin-token\",\"token_type\":\"bearer\",\"expires_in\":300}";

	/// Builds a configuration whose admin API and mail capture both live at `base_url`.
	pub fn test_config(base_url: &str) -> ProvisionerConfig {
		ProvisionerConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock server URL should parse."))
			.mail_url(Url::parse(base_url).expect("Mock server URL should parse."))
			.admin_credentials("admin", "admin")
			.build()
			.expect("Test configuration should build successfully.")
	}

	/// Builds an [`AdminClient`] against the provided mock server URL.
	pub fn test_admin_client(base_url: &str) -> AdminClient {
		AdminClient::new(&test_config(base_url)).expect("Admin client should build for tests.")
	}

	/// Builds a [`RealmProvisioner`] against the provided mock server URL.
	pub fn test_provisioner(base_url: &str) -> RealmProvisioner {
		RealmProvisioner::new(test_admin_client(base_url))
	}

	/// Builds a [`FlowBuilder`] over a fresh in-memory remote seeded with a `browser` template.
	pub fn memory_builder(realm: &str) -> (FlowBuilder<MemoryFlowRemote>, Arc<MemoryFlowRemote>) {
		let remote = Arc::new(MemoryFlowRemote::with_browser_template());

		(FlowBuilder::new(remote.clone(), realm), remote)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method, StatusCode};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
