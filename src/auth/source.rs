//! Token sources injected into every admin call site.
//!
//! Admin calls never hold a token of their own: they ask a [`TokenSource`] right before each
//! request. [`PasswordGrantTokenSource`] keeps the last [`AdminToken`] together with its issue and
//! expiry instants and re-runs the password grant once the remaining lifetime drops inside the
//! configured refresh window, so long provisioning runs survive token expiry.

// crates.io
use oauth2::{
	ClientId, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	ResourceOwnerPassword, ResourceOwnerUsername, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AdminToken, TokenSecret},
	config::ProvisionerConfig,
	error::{ConfigError, TransportError},
	http::ReqwestHttpClient,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future returned by [`TokenSource::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenSecret>> + 'a + Send>>;

/// Supplies bearer tokens for admin API calls.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token that is valid for at least the source's refresh window.
	fn access_token(&self) -> TokenFuture<'_>;

	/// Drops any cached token so the next call obtains a fresh one.
	fn invalidate(&self) -> Pin<Box<dyn Future<Output = ()> + '_ + Send>>;
}

/// Fixed token supplied by the caller; never refreshes.
#[derive(Clone, Debug)]
pub struct StaticTokenSource(TokenSecret);
impl StaticTokenSource {
	/// Wraps a token obtained elsewhere.
	pub fn new(token: impl Into<TokenSecret>) -> Self {
		Self(token.into())
	}
}
impl TokenSource for StaticTokenSource {
	fn access_token(&self) -> TokenFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}

	fn invalidate(&self) -> Pin<Box<dyn Future<Output = ()> + '_ + Send>> {
		Box::pin(async {})
	}
}

/// OAuth 2.0 password grant against the admin realm, cached until the refresh window opens.
pub struct PasswordGrantTokenSource {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	username: ResourceOwnerUsername,
	password: ResourceOwnerPassword,
	refresh_window: Duration,
	cached: AsyncMutex<Option<AdminToken>>,
}
impl PasswordGrantTokenSource {
	/// Builds a source for the admin realm and credentials named in `config`.
	pub fn new(config: &ProvisionerConfig, http_client: ReqwestHttpClient) -> Result<Self> {
		let mut token_url = config.base_url.clone();

		token_url
			.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl { what: "base", source: None })?
			.pop_if_empty()
			.extend(["realms", &config.admin_realm, "protocol", "openid-connect", "token"]);

		let token_url = TokenUrl::from_url(token_url);
		let oauth_client = BasicClient::new(ClientId::new(config.admin_client_id.clone()))
			.set_token_uri(token_url);

		Ok(Self {
			oauth_client,
			http_client,
			username: ResourceOwnerUsername::new(config.admin_username.clone()),
			password: ResourceOwnerPassword::new(config.admin_password.expose().to_owned()),
			refresh_window: config.token_refresh_window,
			cached: AsyncMutex::new(None),
		})
	}

	/// Returns the cached token record, if one has been obtained.
	pub async fn current(&self) -> Option<AdminToken> {
		self.cached.lock().await.clone()
	}

	async fn fetch(&self) -> Result<AdminToken> {
		let issued_at = OffsetDateTime::now_utc();
		let response = self
			.oauth_client
			.exchange_password(&self.username, &self.password)
			.request_async(&self.http_client)
			.await
			.map_err(map_token_error)?;
		let lifetime = response
			.expires_in()
			.and_then(|d| i64::try_from(d.as_secs()).ok())
			.map(Duration::seconds);

		#[cfg(feature = "tracing")]
		tracing::debug!(?lifetime, "obtained admin token");

		Ok(AdminToken::new(response.access_token().secret().as_str(), issued_at, lifetime))
	}
}
impl TokenSource for PasswordGrantTokenSource {
	fn access_token(&self) -> TokenFuture<'_> {
		Box::pin(async move {
			// Held across the grant so concurrent callers share one refresh.
			let mut guard = self.cached.lock().await;
			let now = OffsetDateTime::now_utc();

			if let Some(token) =
				guard.as_ref().filter(|token| !token.needs_refresh(now, self.refresh_window))
			{
				return Ok(token.access_token.clone());
			}

			let token = self.fetch().await?;
			let secret = token.access_token.clone();

			*guard = Some(token);

			Ok(secret)
		})
	}

	fn invalidate(&self) -> Pin<Box<dyn Future<Output = ()> + '_ + Send>> {
		Box::pin(async move {
			self.cached.lock().await.take();
		})
	}
}
impl Debug for PasswordGrantTokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordGrantTokenSource")
			.field("token_url", &self.oauth_client.token_uri().as_str())
			.field("username", &self.username.as_str())
			.field("refresh_window", &self.refresh_window)
			.finish()
	}
}

fn map_token_error(err: BasicRequestTokenError<HttpClientError<ReqwestError>>) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) =>
			Error::TokenRejected { reason: response.to_string() },
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) =>
			TransportError::network(*inner).into(),
		RequestTokenError::Request(HttpClientError::Http(inner)) => ConfigError::from(inner).into(),
		RequestTokenError::Request(HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
		RequestTokenError::Request(other) => TransportError::network(other).into(),
		RequestTokenError::Parse(source, _) =>
			Error::Decode { endpoint: "token endpoint".into(), source },
		RequestTokenError::Other(message) => Error::TokenRejected { reason: message },
	}
}
