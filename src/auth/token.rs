//! Admin access tokens with explicit issue and expiry instants.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const FALLBACK_LIFETIME: Duration = Duration::seconds(60);

/// Bearer token used for admin API calls.
#[derive(Clone)]
pub struct AdminToken {
	/// Bearer value; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must not be used.
	pub expires_at: OffsetDateTime,
}
impl AdminToken {
	/// Builds a token issued at `issued_at` that lives for `lifetime` (or [`FALLBACK_LIFETIME`]).
	pub fn new(
		access_token: impl Into<TokenSecret>,
		issued_at: OffsetDateTime,
		lifetime: Option<Duration>,
	) -> Self {
		let lifetime = lifetime.filter(|d| d.is_positive()).unwrap_or(FALLBACK_LIFETIME);

		Self { access_token: access_token.into(), issued_at, expires_at: issued_at + lifetime }
	}

	/// Returns `true` once `instant` has reached the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` when the token is expired or will expire within `window` of `now`.
	pub fn needs_refresh(&self, now: OffsetDateTime, window: Duration) -> bool {
		if self.is_expired_at(now) {
			return true;
		}

		self.expires_at - now <= window
	}
}
impl Debug for AdminToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
