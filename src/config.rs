//! Provisioner configuration: where the admin API and mail capture live, which admin credentials to
//! use, and the timing defaults shared by the token source and the poller.

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, poll::PollPolicy};

/// Resolved, validated configuration for one provisioning run.
#[derive(Clone, Debug)]
pub struct ProvisionerConfig {
	/// Base URL of the identity provider (e.g. `http://localhost:8080`).
	pub base_url: Url,
	/// Realm that issues admin tokens.
	pub admin_realm: String,
	/// Public client used for the admin password grant.
	pub admin_client_id: String,
	/// Admin username.
	pub admin_username: String,
	/// Admin password.
	pub admin_password: TokenSecret,
	/// Base URL of the mail-capture API, if one is available.
	pub mail_url: Option<Url>,
	/// File backing the per-run secret store.
	pub secrets_path: PathBuf,
	/// Remaining token lifetime under which the admin token is refreshed.
	pub token_refresh_window: Duration,
	/// Per-request HTTP timeout.
	pub http_timeout: StdDuration,
	/// Default poll policy for mail waits.
	pub poll: PollPolicy,
}
impl ProvisionerConfig {
	/// Environment variable holding the identity provider base URL.
	pub const ENV_BASE_URL: &'static str = "KEYCLOAK_URL";
	/// Environment variable holding the mail-capture base URL.
	pub const ENV_MAIL_URL: &'static str = "MAILPIT_URL";
	/// Environment variable holding the admin username.
	pub const ENV_ADMIN_USERNAME: &'static str = "KEYCLOAK_ADMIN_USERNAME";
	/// Environment variable holding the admin password.
	pub const ENV_ADMIN_PASSWORD: &'static str = "KEYCLOAK_ADMIN_PASSWORD";
	/// Environment variable holding the secret store path.
	pub const ENV_SECRETS_FILE: &'static str = "TOTP_SECRETS_FILE";

	/// Returns a builder seeded with the local-development defaults.
	pub fn builder() -> ProvisionerConfigBuilder {
		ProvisionerConfigBuilder::default()
	}

	/// Loads configuration from the process environment, falling back to local defaults
	/// (`http://localhost:8080`, `http://localhost:8025`, `admin`/`admin`).
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut builder = Self::builder();

		if let Some(raw) = lookup(Self::ENV_BASE_URL) {
			builder = builder.base_url(
				Url::parse(&raw).map_err(|_| ConfigError::InvalidEnv { name: Self::ENV_BASE_URL })?,
			);
		}

		let mail_url = lookup(Self::ENV_MAIL_URL).unwrap_or_else(|| "http://localhost:8025".into());

		builder = builder.mail_url(
			Url::parse(&mail_url).map_err(|_| ConfigError::InvalidEnv { name: Self::ENV_MAIL_URL })?,
		);

		let username = lookup(Self::ENV_ADMIN_USERNAME).unwrap_or_else(|| "admin".into());
		let password = lookup(Self::ENV_ADMIN_PASSWORD).unwrap_or_else(|| "admin".into());

		builder = builder.admin_credentials(username, password);

		if let Some(path) = lookup(Self::ENV_SECRETS_FILE) {
			builder = builder.secrets_path(path);
		}

		builder.build()
	}
}

/// Builder for [`ProvisionerConfig`] values.
#[derive(Debug)]
pub struct ProvisionerConfigBuilder {
	base_url: Option<Url>,
	admin_realm: String,
	admin_client_id: String,
	admin_username: Option<String>,
	admin_password: Option<String>,
	mail_url: Option<Url>,
	secrets_path: PathBuf,
	token_refresh_window: Duration,
	http_timeout: StdDuration,
	poll: PollPolicy,
}
impl Default for ProvisionerConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			admin_realm: "master".into(),
			admin_client_id: "admin-cli".into(),
			admin_username: None,
			admin_password: None,
			mail_url: None,
			secrets_path: PathBuf::from(".totp-secrets.json"),
			token_refresh_window: Duration::seconds(30),
			http_timeout: StdDuration::from_secs(30),
			poll: PollPolicy::default(),
		}
	}
}
impl ProvisionerConfigBuilder {
	/// Sets the identity provider base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the realm that issues admin tokens (defaults to `master`).
	pub fn admin_realm(mut self, realm: impl Into<String>) -> Self {
		self.admin_realm = realm.into();

		self
	}

	/// Overrides the admin client id (defaults to `admin-cli`).
	pub fn admin_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.admin_client_id = client_id.into();

		self
	}

	/// Sets the admin username and password.
	pub fn admin_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.admin_username = Some(username.into());
		self.admin_password = Some(password.into());

		self
	}

	/// Sets the mail-capture base URL.
	pub fn mail_url(mut self, url: Url) -> Self {
		self.mail_url = Some(url);

		self
	}

	/// Sets the file backing the secret store.
	pub fn secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.secrets_path = path.into();

		self
	}

	/// Overrides the token refresh window (defaults to 30 seconds).
	pub fn token_refresh_window(mut self, window: Duration) -> Self {
		self.token_refresh_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the per-request HTTP timeout (defaults to 30 seconds).
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Overrides the default poll policy.
	pub fn poll(mut self, policy: PollPolicy) -> Self {
		self.poll = policy;

		self
	}

	/// Validates the collected settings and produces a [`ProvisionerConfig`].
	pub fn build(self) -> Result<ProvisionerConfig, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse("http://localhost:8080")
				.map_err(|e| ConfigError::invalid_url("base", e))?,
		};

		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidUrl { what: "base", source: None });
		}
		if self.mail_url.as_ref().is_some_and(Url::cannot_be_a_base) {
			return Err(ConfigError::InvalidUrl { what: "mail capture", source: None });
		}

		let username = self.admin_username.ok_or(ConfigError::Missing("admin_username"))?;
		let password = self.admin_password.ok_or(ConfigError::Missing("admin_password"))?;

		if username.trim().is_empty() || password.is_empty() {
			return Err(ConfigError::EmptyCredentials);
		}
		if self.poll.interval.is_zero() {
			return Err(ConfigError::ZeroPollInterval);
		}

		Ok(ProvisionerConfig {
			base_url,
			admin_realm: self.admin_realm,
			admin_client_id: self.admin_client_id,
			admin_username: username,
			admin_password: TokenSecret::new(password),
			mail_url: self.mail_url,
			secrets_path: self.secrets_path,
			token_refresh_window: self.token_refresh_window,
			http_timeout: self.http_timeout,
			poll: self.poll,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn lookup_falls_back_to_local_defaults() {
		let config = ProvisionerConfig::from_lookup(|_| None)
			.expect("Default configuration should build without any variables.");

		assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
		assert_eq!(config.admin_username, "admin");
		assert_eq!(config.admin_password.expose(), "admin");
		assert_eq!(config.admin_realm, "master");
		assert_eq!(config.admin_client_id, "admin-cli");
		assert_eq!(
			config.mail_url.as_ref().map(Url::as_str),
			Some("http://localhost:8025/")
		);
		assert_eq!(config.secrets_path, PathBuf::from(".totp-secrets.json"));
	}

	#[test]
	fn lookup_reads_overrides_and_rejects_bad_urls() {
		let config = ProvisionerConfig::from_lookup(|name| match name {
			"KEYCLOAK_URL" => Some("http://keycloak:8080".into()),
			"MAILPIT_URL" => Some("http://mailpit:8025".into()),
			"TOTP_SECRETS_FILE" => Some("/tmp/seeds.json".into()),
			_ => None,
		})
		.expect("Configuration with overrides should build.");

		assert_eq!(config.base_url.host_str(), Some("keycloak"));
		assert_eq!(
			config.mail_url.as_ref().map(Url::as_str),
			Some("http://mailpit:8025/")
		);
		assert_eq!(config.secrets_path, PathBuf::from("/tmp/seeds.json"));

		let err = ProvisionerConfig::from_lookup(|name| {
			(name == "KEYCLOAK_URL").then(|| "not a url".to_string())
		})
		.expect_err("An unparsable base URL should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEnv { name: "KEYCLOAK_URL" }));
	}

	#[test]
	fn builder_rejects_empty_credentials_and_zero_interval() {
		let err = ProvisionerConfig::builder()
			.admin_credentials(" ", "secret")
			.build()
			.expect_err("Blank usernames should be rejected.");

		assert!(matches!(err, ConfigError::EmptyCredentials));

		let err = ProvisionerConfig::builder()
			.admin_credentials("admin", "admin")
			.poll(PollPolicy::new(StdDuration::from_secs(1), StdDuration::ZERO))
			.build()
			.expect_err("A zero poll interval should be rejected.");

		assert!(matches!(err, ConfigError::ZeroPollInterval));

		let err = ProvisionerConfig::builder()
			.build()
			.expect_err("Missing credentials should be rejected.");

		assert!(matches!(err, ConfigError::Missing("admin_username")));
	}
}
