//! Bearer-authenticated client for the identity provider's admin REST API.
//!
//! Every call asks the injected [`TokenSource`] for a token right before sending, retries once
//! with a fresh token on `401`, and maps responses onto the crate's error taxonomy:
//! `409` on creation becomes [`Creation::AlreadyExists`], any other non-success becomes
//! [`Error::RemoteRejected`], and bodies are decoded through `serde_path_to_error` so a shape
//! mismatch names the offending JSON path.

pub mod flows;
pub mod realms;

pub use realms::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{PasswordGrantTokenSource, TokenSource},
	config::ProvisionerConfig,
	error::ConfigError,
	flow::Creation,
	http::ReqwestHttpClient,
};

/// Admin API client scoped to one identity provider.
#[derive(Clone)]
pub struct AdminClient {
	http: ReqwestHttpClient,
	base_url: Url,
	tokens: Arc<dyn TokenSource>,
}
impl AdminClient {
	/// Builds a client that authenticates through the password grant described by `config`.
	pub fn new(config: &ProvisionerConfig) -> Result<Self> {
		let http = ReqwestHttpClient::with_timeout(config.http_timeout)?;
		let tokens = Arc::new(PasswordGrantTokenSource::new(config, http.clone())?);

		Self::with_token_source(config.base_url.clone(), http, tokens)
	}

	/// Builds a client around an explicit token source.
	pub fn with_token_source(
		base_url: Url,
		http: ReqwestHttpClient,
		tokens: Arc<dyn TokenSource>,
	) -> Result<Self> {
		if base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidUrl { what: "base", source: None }.into());
		}

		Ok(Self { http, base_url, tokens })
	}

	/// Token source used for every call.
	pub fn tokens(&self) -> &Arc<dyn TokenSource> {
		&self.tokens
	}

	/// Builds `<base>/admin/realms/<segments...>`, percent-encoding each segment.
	pub fn endpoint<I>(&self, segments: I) -> Result<Url>
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl { what: "base", source: None })?
			.pop_if_empty()
			.extend(["admin", "realms"])
			.extend(segments);

		Ok(url)
	}

	pub(crate) async fn send<B>(
		&self,
		method: Method,
		url: Url,
		body: Option<&B>,
	) -> Result<reqwest::Response>
	where
		B: ?Sized + Serialize + Sync,
	{
		let mut retried = false;

		loop {
			let token = self.tokens.access_token().await?;
			let mut request =
				self.http.request(method.clone(), url.clone()).bearer_auth(token.expose());

			if let Some(body) = body {
				request = request.json(body);
			}

			let response = request.send().await?;

			if response.status() == StatusCode::UNAUTHORIZED && !retried {
				#[cfg(feature = "tracing")]
				tracing::debug!(%method, path = url.path(), "admin token rejected, refreshing");

				self.tokens.invalidate().await;

				retried = true;

				continue;
			}

			return Ok(response);
		}
	}

	/// Sends a request that must succeed.
	pub(crate) async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<()>
	where
		B: ?Sized + Serialize + Sync,
	{
		let response = self.send(method.clone(), url.clone(), body).await?;

		ensure_success(&method, &url, response).await.map(|_| ())
	}

	/// Sends a creation request, absorbing `409 Conflict`.
	pub(crate) async fn create<B>(&self, url: Url, body: &B) -> Result<Creation>
	where
		B: ?Sized + Serialize + Sync,
	{
		let response = self.send(Method::POST, url.clone(), Some(body)).await?;

		if response.status() == StatusCode::CONFLICT {
			#[cfg(feature = "tracing")]
			tracing::debug!(path = url.path(), "resource already exists");

			return Ok(Creation::AlreadyExists);
		}

		ensure_success(&Method::POST, &url, response).await?;

		Ok(Creation::Created)
	}

	/// Fetches and decodes a JSON body.
	pub(crate) async fn get_json<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send::<()>(Method::GET, url.clone(), None).await?;
		let response = ensure_success(&Method::GET, &url, response).await?;

		decode(&url, response).await
	}

	/// Like [`Self::get_json`], mapping `404 Not Found` to `None`.
	pub(crate) async fn get_optional_json<T>(&self, url: Url) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		let response = self.send::<()>(Method::GET, url.clone(), None).await?;

		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let response = ensure_success(&Method::GET, &url, response).await?;

		decode(&url, response).await.map(Some)
	}
}
impl Debug for AdminClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminClient").field("base_url", &self.base_url.as_str()).finish()
	}
}

async fn ensure_success(
	method: &Method,
	url: &Url,
	response: reqwest::Response,
) -> Result<reqwest::Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.unwrap_or_default();

	Err(Error::rejected(method, url.path(), status, body))
}

async fn decode<T>(url: &Url, response: reqwest::Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let bytes = response.bytes().await?;
	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { endpoint: url.path().to_owned(), source })
}
