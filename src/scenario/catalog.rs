//! The built-in scenario catalog, provisioned in order by a default run.

// self
use crate::{
	_prelude::*,
	admin::MailTransport,
	flow::{FlowTree, Node, Requirement},
	scenario::{FlowPlan, Localization, OtpSettings, Scenario, ScenarioUser, TrustSetting},
};

/// Password of every scenario user.
pub const TEST_PASSWORD: &str = "testpassword";
/// Role that gates the email code.
pub const OTP_ROLE: &str = "otp-required";
/// Public client created in every realm.
pub const TEST_CLIENT_ID: &str = "test-client";
/// Email domain of scenario users.
pub const USER_DOMAIN: &str = "test.local";
/// Authenticator provider of the email code.
pub const EMAIL_OTP_PROVIDER: &str = "email-otp-form";
/// Authenticator provider of TOTP.
pub const TOTP_PROVIDER: &str = "auth-otp-form";
/// Already-authenticated shortcut provider.
pub const COOKIE_PROVIDER: &str = "auth-cookie";
/// Username/password form provider.
pub const PASSWORD_PROVIDER: &str = "auth-username-password-form";
/// Condition satisfied when the user has any configured second factor.
pub const USER_CONFIGURED_CONDITION: &str = "conditional-user-configured";
/// Alias of the injected alternatives subflow.
pub const TWO_FACTOR_OPTIONS: &str = "2FA Options";

/// Mail transport pointing at the capture service.
pub fn mail_transport() -> MailTransport {
	MailTransport {
		host: "mailpit".into(),
		port: "1025".into(),
		from: format!("keycloak@{USER_DOMAIN}"),
		from_display_name: "Keycloak Test".into(),
	}
}

/// Fresh flow: cookie shortcut as an alternative to a forms subflow holding the password form
/// followed by the configured email code.
pub fn email_otp_tree(
	alias: &str,
	forms_alias: &str,
	forms_requirement: Requirement,
	config_alias: &str,
	settings: &OtpSettings,
) -> FlowTree {
	FlowTree::new(alias).child(Node::leaf(COOKIE_PROVIDER, Requirement::Alternative)).child(
		Node::subflow(
			forms_alias,
			forms_requirement,
			[
				Node::leaf(PASSWORD_PROVIDER, Requirement::Required),
				Node::leaf(EMAIL_OTP_PROVIDER, Requirement::Required)
					.with_config(config_alias, settings.to_settings()),
			],
		),
	)
}

/// Conditional subflow offering the email code and TOTP as alternatives, gated by the
/// user-configured condition.
pub fn two_factor_options(config_alias: &str, settings: &OtpSettings) -> Node {
	Node::subflow(
		TWO_FACTOR_OPTIONS,
		Requirement::Conditional,
		[
			Node::leaf(USER_CONFIGURED_CONDITION, Requirement::Required),
			Node::leaf(EMAIL_OTP_PROVIDER, Requirement::Alternative)
				.with_config(config_alias, settings.to_settings()),
			Node::leaf(TOTP_PROVIDER, Requirement::Alternative),
		],
	)
}

/// Copy of the stock `browser` flow with [`two_factor_options`] injected into its forms subflow.
pub fn copied_browser_plan(alias: &str, config_alias: &str, settings: &OtpSettings) -> FlowPlan {
	FlowPlan::CopyAndInject {
		source: "browser".into(),
		alias: alias.into(),
		forms_marker: "forms".into(),
		nodes: vec![two_factor_options(config_alias, settings)],
	}
}

fn fresh(
	realm: &str,
	flow_alias: &str,
	forms_alias: &str,
	config_alias: &str,
	settings: OtpSettings,
) -> Scenario {
	Scenario {
		realm: realm.into(),
		roles: Vec::new(),
		users: Vec::new(),
		localization: None,
		flow: FlowPlan::Fresh(email_otp_tree(
			flow_alias,
			forms_alias,
			Requirement::Required,
			config_alias,
			&settings,
		)),
	}
}

/// The eight scenarios of a default run.
pub fn catalog() -> Vec<Scenario> {
	let gated = OtpSettings::default().user_role(OTP_ROLE);
	let ip_trust = TrustSetting::Enabled { duration: 60 };
	let device_trust = TrustSetting::Enabled { duration: 30 };
	let trust_user = || vec![ScenarioUser::new("trust-user")];
	let required = Scenario {
		roles: vec![OTP_ROLE.into()],
		users: vec![
			ScenarioUser::new("user-with-role").role(OTP_ROLE),
			ScenarioUser::new("user-without-role"),
		],
		..fresh(
			"test-otp-required",
			"browser-with-email-otp",
			"email-otp-forms",
			"email-otp-config",
			gated.clone(),
		)
	};
	let alternative = Scenario {
		realm: "test-otp-alternative".into(),
		roles: vec![OTP_ROLE.into()],
		users: vec![
			ScenarioUser::new("user-with-role").role(OTP_ROLE),
			ScenarioUser::new("user-without-role"),
			ScenarioUser::new("user-totp-only").with_second_factor(),
			ScenarioUser::new("user-both-options").role(OTP_ROLE).with_second_factor(),
		],
		localization: None,
		flow: copied_browser_plan("browser-2fa-alternative", "email-otp-config", &gated),
	};
	let trust_alternatives = Scenario {
		realm: "test-trust-alternatives".into(),
		roles: vec![OTP_ROLE.into()],
		users: vec![
			ScenarioUser::new("user-both-options").role(OTP_ROLE).with_second_factor(),
			ScenarioUser::new("user-email-only").role(OTP_ROLE),
		],
		localization: None,
		flow: copied_browser_plan(
			"browser-trust-alternatives",
			"email-otp-trust-alt-config",
			&gated
				.clone()
				.ip_trust(ip_trust)
				.device_trust(TrustSetting::Disabled)
				.trust_only_when_sole(true),
		),
	};

	vec![
		required,
		alternative,
		Scenario {
			users: trust_user(),
			..fresh(
				"test-ip-trust",
				"browser-ip-trust",
				"ip-trust-forms",
				"email-otp-ip-trust-config",
				OtpSettings::default().ip_trust(ip_trust).device_trust(TrustSetting::Disabled),
			)
		},
		Scenario {
			users: trust_user(),
			..fresh(
				"test-device-trust",
				"browser-device-trust",
				"device-trust-forms",
				"email-otp-device-trust-config",
				OtpSettings::default().ip_trust(TrustSetting::Disabled).device_trust(device_trust),
			)
		},
		Scenario {
			users: trust_user(),
			..fresh(
				"test-both-trust",
				"browser-both-trust",
				"both-trust-forms",
				"email-otp-both-trust-config",
				OtpSettings::default().ip_trust(ip_trust).device_trust(device_trust),
			)
		},
		trust_alternatives,
		Scenario {
			users: vec![ScenarioUser::new("ttl-user")],
			..fresh(
				"test-short-ttl",
				"browser-short-ttl",
				"short-ttl-forms",
				"email-otp-short-ttl-config",
				OtpSettings::default().code_lifetime(StdDuration::from_secs(3)),
			)
		},
		Scenario {
			users: vec![ScenarioUser::new("i18n-user")],
			localization: Some(Localization {
				supported: vec!["en", "ar", "ru", "pl", "cs", "sl", "uk", "de", "fr"],
				default: "en",
			}),
			..fresh(
				"test-i18n",
				"browser-i18n",
				"i18n-forms",
				"email-otp-i18n-config",
				OtpSettings::default()
					.ip_trust(TrustSetting::Disabled)
					.device_trust(TrustSetting::Enabled { duration: 3 }),
			)
		},
	]
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn catalog_lists_eight_realms_in_run_order() {
		let realms: Vec<_> = catalog().into_iter().map(|scenario| scenario.realm).collect();

		assert_eq!(
			realms,
			[
				"test-otp-required",
				"test-otp-alternative",
				"test-ip-trust",
				"test-device-trust",
				"test-both-trust",
				"test-trust-alternatives",
				"test-short-ttl",
				"test-i18n",
			]
		);
	}

	#[test]
	fn fresh_flows_follow_the_forms_naming_scheme() {
		let scenarios = catalog();
		let aliases: Vec<_> = scenarios.iter().map(|scenario| scenario.flow.alias()).collect();

		assert_eq!(
			aliases,
			[
				"browser-with-email-otp",
				"browser-2fa-alternative",
				"browser-ip-trust",
				"browser-device-trust",
				"browser-both-trust",
				"browser-trust-alternatives",
				"browser-short-ttl",
				"browser-i18n",
			]
		);

		let FlowPlan::Fresh(tree) = &scenarios[0].flow else {
			panic!("The required scenario should build a fresh flow.");
		};

		assert_eq!(tree.children[1].label(), "email-otp-forms");
		assert_eq!(tree.children[1].requirement(), Requirement::Required);
		assert_eq!(tree.size(), 4);
	}

	#[test]
	fn enrollment_is_requested_only_where_totp_is_offered() {
		let enrolled: Vec<_> = catalog()
			.into_iter()
			.flat_map(|scenario| {
				let realm = scenario.realm;

				scenario
					.users
					.into_iter()
					.filter(|user| user.second_factor)
					.map(move |user| format!("{realm}/{}", user.username))
			})
			.collect();

		assert_eq!(
			enrolled,
			[
				"test-otp-alternative/user-totp-only",
				"test-otp-alternative/user-both-options",
				"test-trust-alternatives/user-both-options",
			]
		);
	}
}
