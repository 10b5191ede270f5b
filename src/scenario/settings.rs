//! Typed second-factor authenticator settings, flattened into the string bag the remote stores.

// self
use crate::{_prelude::*, mail::DEFAULT_CODE_ALPHABET};

/// One trust mechanism's configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrustSetting {
	/// Keys are omitted; the authenticator's default applies.
	#[default]
	Unset,
	/// Explicitly disabled.
	Disabled,
	/// Enabled for `duration` units (minutes for IP trust, days for device trust).
	Enabled {
		/// Trust lifetime in the mechanism's unit.
		duration: u32,
	},
}

/// Settings for the email one-time-code authenticator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpSettings {
	/// Role that gates the second factor, if any.
	pub user_role: Option<String>,
	/// Characters codes are drawn from.
	pub code_alphabet: String,
	/// Code length.
	pub code_length: u32,
	/// Code lifetime in seconds.
	pub code_lifetime_secs: u64,
	/// IP-based trust, duration in minutes.
	pub ip_trust: TrustSetting,
	/// Device-based trust, duration in days.
	pub device_trust: TrustSetting,
	/// Only honor trust when the code is the user's sole second factor.
	pub trust_only_when_sole: Option<bool>,
}
impl Default for OtpSettings {
	fn default() -> Self {
		Self {
			user_role: None,
			code_alphabet: DEFAULT_CODE_ALPHABET.into(),
			code_length: 6,
			code_lifetime_secs: 600,
			ip_trust: TrustSetting::Unset,
			device_trust: TrustSetting::Unset,
			trust_only_when_sole: None,
		}
	}
}
impl OtpSettings {
	/// Gates the factor on `role`.
	pub fn user_role(mut self, role: impl Into<String>) -> Self {
		self.user_role = Some(role.into());

		self
	}

	/// Overrides the code lifetime.
	pub fn code_lifetime(mut self, lifetime: StdDuration) -> Self {
		self.code_lifetime_secs = lifetime.as_secs();

		self
	}

	/// Sets IP trust.
	pub fn ip_trust(mut self, trust: TrustSetting) -> Self {
		self.ip_trust = trust;

		self
	}

	/// Sets device trust.
	pub fn device_trust(mut self, trust: TrustSetting) -> Self {
		self.device_trust = trust;

		self
	}

	/// Sets the sole-authenticator gate.
	pub fn trust_only_when_sole(mut self, enabled: bool) -> Self {
		self.trust_only_when_sole = Some(enabled);

		self
	}

	/// Flattens the settings into the remote's key/value form.
	pub fn to_settings(&self) -> BTreeMap<String, String> {
		let mut settings = BTreeMap::new();

		if let Some(role) = &self.user_role {
			settings.insert("user-role".into(), role.clone());
			settings.insert("negate-user-role".into(), "false".into());
		}

		settings.insert("code-alphabet".into(), self.code_alphabet.clone());
		settings.insert("code-length".into(), self.code_length.to_string());
		settings.insert("code-lifetime".into(), self.code_lifetime_secs.to_string());

		trust_entries(&mut settings, "ip-trust", self.ip_trust);
		trust_entries(&mut settings, "device-trust", self.device_trust);

		if let Some(sole) = self.trust_only_when_sole {
			settings.insert("trust-only-when-sole".into(), sole.to_string());
		}

		settings
	}
}

fn trust_entries(settings: &mut BTreeMap<String, String>, prefix: &str, trust: TrustSetting) {
	match trust {
		TrustSetting::Unset => {},
		TrustSetting::Disabled => {
			settings.insert(format!("{prefix}-enabled"), "false".into());
		},
		TrustSetting::Enabled { duration } => {
			settings.insert(format!("{prefix}-enabled"), "true".into());
			settings.insert(format!("{prefix}-duration"), duration.to_string());
		},
	}
}
