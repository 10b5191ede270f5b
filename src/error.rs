//! Provisioner-level error types shared across the admin client, flow builder, poller, and stores.

// self
use crate::{_prelude::*, flow::NodeState};

/// Provisioner-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical provisioner error exposed by public APIs.
///
/// Every variant is fatal to the enclosing provisioning step; "already exists" responses never
/// reach this type because creation helpers absorb them.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Secret store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A freshly created node could not be found under its parent.
	#[error("No child of `{parent}` matches {key}.")]
	ResolutionFailed {
		/// Alias of the parent whose child list was searched.
		parent: String,
		/// Human-readable match key (provider id or display name).
		key: String,
	},
	/// More than one child of the parent matched, so the new node cannot be told apart.
	#[error("{matches} children of `{parent}` match {key}; refusing to guess.")]
	AmbiguousResolution {
		/// Alias of the parent whose child list was searched.
		parent: String,
		/// Human-readable match key (provider id or display name).
		key: String,
		/// Number of matching children.
		matches: usize,
	},
	/// The remote service answered with a non-success, non-conflict status.
	#[error("{method} {endpoint} was rejected with status {status}: {body}")]
	RemoteRejected {
		/// HTTP method of the rejected call.
		method: String,
		/// Endpoint path of the rejected call.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Response body, verbatim.
		body: String,
	},
	/// A poll deadline passed without a satisfying element.
	#[error("Timed out after {elapsed:?} waiting for {criteria}.")]
	Timeout {
		/// Description of what was awaited.
		criteria: String,
		/// Time spent polling.
		elapsed: StdDuration,
	},
	/// A response body did not match the expected shape.
	#[error("Response from {endpoint} could not be decoded.")]
	Decode {
		/// Endpoint path that produced the body.
		endpoint: String,
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The admin token endpoint refused the grant.
	#[error("Admin token request was rejected: {reason}.")]
	TokenRejected {
		/// Error code and description reported by the token endpoint.
		reason: String,
	},
	/// A value the caller relies on was absent from an otherwise valid response.
	#[error("Missing {what}.")]
	MissingValue {
		/// Description of the absent value.
		what: String,
	},
	/// A node was asked to move backwards through its construction states.
	#[error("Node `{node}` cannot move from {from} to {to}.")]
	InvalidTransition {
		/// Node identifier or alias.
		node: String,
		/// Current state.
		from: NodeState,
		/// Requested state.
		to: NodeState,
	},
}
impl Error {
	/// Builds a [`Error::RemoteRejected`] from the pieces of a failed call.
	pub fn rejected(
		method: &Method,
		endpoint: impl Into<String>,
		status: StatusCode,
		body: impl Into<String>,
	) -> Self {
		Self::RemoteRejected {
			method: method.to_string(),
			endpoint: endpoint.into(),
			status: status.as_u16(),
			body: body.into(),
		}
	}
}

/// Configuration and validation failures raised before any remote call is made.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured URL is invalid or cannot carry path segments.
	#[error("The {what} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed validation.
		what: &'static str,
		/// Underlying parsing failure, when one exists.
		#[source]
		source: Option<url::ParseError>,
	},
	/// A required setting was never supplied.
	#[error("Missing required setting `{0}`.")]
	Missing(&'static str),
	/// Admin username or password is empty.
	#[error("Admin credentials must not be empty.")]
	EmptyCredentials,
	/// Poll interval of zero would spin.
	#[error("Poll interval must be greater than zero.")]
	ZeroPollInterval,
	/// An environment variable holds an unusable value.
	#[error("Environment variable `{name}` holds an invalid value.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a URL parse failure for the named setting.
	pub fn invalid_url(what: &'static str, source: url::ParseError) -> Self {
		Self::InvalidUrl { what, source: Some(source) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		TransportError::from(e).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejected_error_carries_endpoint_status_and_body() {
		let err = Error::rejected(
			&Method::POST,
			"/admin/realms/demo/roles",
			StatusCode::BAD_REQUEST,
			"{\"error\":\"bad\"}",
		);

		assert!(matches!(err, Error::RemoteRejected { status: 400, .. }));
		assert_eq!(
			err.to_string(),
			"POST /admin/realms/demo/roles was rejected with status 400: {\"error\":\"bad\"}"
		);
	}

	#[test]
	fn resolution_errors_name_parent_and_key() {
		let err = Error::ResolutionFailed {
			parent: "email-otp-forms".into(),
			key: "provider `email-otp-form`".into(),
		};

		assert_eq!(err.to_string(), "No child of `email-otp-forms` matches provider `email-otp-form`.");
	}
}
