//! Second-factor enrollment for scenario users.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	obs::{self, StepKind},
	realm::RealmProvisioner,
};

/// Required action that prompts a user to register TOTP.
pub const CONFIGURE_TOTP: &str = "CONFIGURE_TOTP";

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const SEED_LENGTH: usize = 32;

/// Boxed future returned by [`SecondFactorEnroller::enroll`].
pub type EnrollFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenSecret>> + 'a + Send>>;

/// Registers a TOTP credential for a user who has the `CONFIGURE_TOTP` action pending.
///
/// Implementations return the base32 seed so callers can generate matching codes later. A
/// browser-driven enrollment can implement this trait in place of [`AdminCredentialEnroller`].
pub trait SecondFactorEnroller
where
	Self: Send + Sync,
{
	/// Enrolls `username` (id `user_id`) in `realm` and returns the seed.
	fn enroll<'a>(&'a self, realm: &'a str, user_id: &'a str, username: &'a str)
	-> EnrollFuture<'a>;
}

/// Enrolls users by writing the credential through the admin API.
#[derive(Clone, Debug)]
pub struct AdminCredentialEnroller {
	provisioner: RealmProvisioner,
}
impl AdminCredentialEnroller {
	/// Uses `provisioner`'s admin client for credential writes.
	pub fn new(provisioner: RealmProvisioner) -> Self {
		Self { provisioner }
	}
}
impl SecondFactorEnroller for AdminCredentialEnroller {
	fn enroll<'a>(
		&'a self,
		realm: &'a str,
		user_id: &'a str,
		username: &'a str,
	) -> EnrollFuture<'a> {
		let seed = generate_seed();

		Box::pin(obs::observe(StepKind::Enroll, realm, async move {
			self.provisioner.admin().put_otp_credential(realm, user_id, &seed).await?;
			self.provisioner.remove_user_required_action(realm, user_id, CONFIGURE_TOTP).await?;

			#[cfg(feature = "tracing")]
			tracing::debug!(realm, username, "second factor enrolled");
			#[cfg(not(feature = "tracing"))]
			let _ = username;

			Ok(seed)
		}))
	}
}

/// Random base32 TOTP seed.
pub fn generate_seed() -> TokenSecret {
	let mut rng = rand::rng();
	let seed: String = (0..SEED_LENGTH)
		.map(|_| char::from(BASE32_ALPHABET[rng.random_range(0..BASE32_ALPHABET.len())]))
		.collect();

	TokenSecret::new(seed)
}
