//! Idempotent realm-level primitives: realm reset, mail transport, client, roles, users,
//! required actions, and localization.
//!
//! Every operation tolerates the target already being in the desired state, so a failed run can
//! simply be repeated. Flow construction is delegated to a [`FlowBuilder`] bound to the same
//! admin client.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	admin::{AdminClient, MailTransport, RequiredAction, Role},
	auth::TokenSecret,
	flow::{Creation, FlowBuilder},
	obs::{self, StepKind},
};

/// Required action disabled on every freshly reset realm.
pub const VERIFY_PROFILE: &str = "VERIFY_PROFILE";

/// Test user to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSpec {
	/// Login name.
	pub username: String,
	/// Verified email address.
	pub email: String,
	/// Non-temporary password.
	pub password: TokenSecret,
}
impl UserSpec {
	/// Builds a user specification.
	pub fn new(
		username: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<TokenSecret>,
	) -> Self {
		Self { username: username.into(), email: email.into(), password: password.into() }
	}
}

/// Realm-level provisioning over an [`AdminClient`].
#[derive(Clone, Debug)]
pub struct RealmProvisioner {
	admin: Arc<AdminClient>,
}
impl RealmProvisioner {
	/// Wraps an admin client.
	pub fn new(admin: AdminClient) -> Self {
		Self { admin: Arc::new(admin) }
	}

	/// Underlying admin client.
	pub fn admin(&self) -> &AdminClient {
		&self.admin
	}

	/// Flow builder targeting `realm` through the same admin client.
	pub fn flows(&self, realm: &str) -> FlowBuilder<AdminClient> {
		FlowBuilder::new(self.admin.clone(), realm)
	}

	/// Deletes `name` if present and recreates it with the test baseline.
	///
	/// The baseline disables registration and brute-force protection, enables email login,
	/// clears default required actions, and disables profile verification.
	pub async fn reset_realm(&self, name: &str) -> Result<()> {
		obs::observe(StepKind::ResetRealm, name, async {
			let existed = self.admin.delete_realm(name).await?;
			let representation = json!({
				"realm": name,
				"enabled": true,
				"registrationAllowed": false,
				"loginWithEmailAllowed": true,
				"duplicateEmailsAllowed": false,
				"resetPasswordAllowed": false,
				"editUsernameAllowed": false,
				"bruteForceProtected": false,
				"requiredActions": [],
			});

			self.admin.create_realm(&representation).await?;
			self.disable_required_action(name, VERIFY_PROFILE).await?;

			#[cfg(feature = "tracing")]
			tracing::info!(realm = name, existed, "realm reset");
			#[cfg(not(feature = "tracing"))]
			let _ = existed;

			Ok(())
		})
		.await
	}

	/// Sets the realm's outbound mail transport.
	pub async fn configure_mail(&self, name: &str, transport: &MailTransport) -> Result<()> {
		obs::observe(StepKind::ConfigureMail, name, async {
			self.admin.update_realm(name, &json!({ "realm": name, "smtpServer": transport })).await
		})
		.await
	}

	/// Creates a public client named `client_id` unless one already exists.
	pub async fn ensure_client(&self, name: &str, client_id: &str) -> Result<Creation> {
		obs::observe(StepKind::EnsureClient, name, async {
			if self.admin.get_client_by_client_id(name, client_id).await?.is_some() {
				return Ok(Creation::AlreadyExists);
			}

			let representation = json!({
				"clientId": client_id,
				"enabled": true,
				"publicClient": true,
				"redirectUris": ["http://localhost:8080/*", "http://keycloak:8080/*", "*"],
				"webOrigins": ["http://localhost:8080", "http://keycloak:8080", "*"],
				"directAccessGrantsEnabled": true,
				"standardFlowEnabled": true,
			});

			self.admin.create_client(name, &representation).await
		})
		.await
	}

	/// Creates a realm role; an existing role counts as success.
	pub async fn ensure_role(&self, name: &str, role: &str) -> Result<Creation> {
		obs::observe(StepKind::EnsureRole, name, self.admin.create_role(name, role)).await
	}

	/// Creates `user` if absent and returns its id, resolved by exact username.
	pub async fn create_user(&self, name: &str, user: &UserSpec) -> Result<String> {
		obs::observe(StepKind::CreateUser, name, async {
			let representation = json!({
				"username": user.username,
				"email": user.email,
				"emailVerified": true,
				"enabled": true,
				"credentials": [{
					"type": "password",
					"value": user.password.expose(),
					"temporary": false,
				}],
			});

			self.admin.create_user(name, &representation).await?;

			let found = self.admin.find_user(name, &user.username).await?;

			found.map(|record| record.id).ok_or_else(|| Error::MissingValue {
				what: format!("user `{}` in realm `{name}`", user.username),
			})
		})
		.await
	}

	/// Maps realm role `role` onto the user.
	pub async fn assign_role(&self, name: &str, user_id: &str, role: &str) -> Result<()> {
		obs::observe(StepKind::AssignRole, name, async {
			let role = self.admin.get_role(name, role).await?;

			self.admin.add_realm_roles(name, user_id, &[role]).await
		})
		.await
	}

	/// Realm roles directly mapped to the user.
	pub async fn user_realm_roles(&self, name: &str, user_id: &str) -> Result<Vec<Role>> {
		self.admin.list_user_realm_roles(name, user_id).await
	}

	/// Lists the realm's required actions.
	pub async fn list_required_actions(&self, name: &str) -> Result<Vec<RequiredAction>> {
		self.admin.list_required_actions(name).await
	}

	/// Registers a required-action provider; an existing registration counts as success.
	pub async fn register_required_action(&self, name: &str, provider_id: &str) -> Result<Creation> {
		obs::observe(
			StepKind::RequiredAction,
			name,
			self.admin.register_required_action(name, provider_id),
		)
		.await
	}

	/// Enables `alias`, registering it first when the realm does not know it.
	pub async fn enable_required_action(&self, name: &str, alias: &str) -> Result<()> {
		obs::observe(StepKind::RequiredAction, name, async {
			let known = self.admin.list_required_actions(name).await?;

			if !known.iter().any(|action| action.alias == alias) {
				self.admin.register_required_action(name, alias).await?;
			}

			let Some(mut action) = self.admin.get_required_action(name, alias).await? else {
				return Err(Error::MissingValue {
					what: format!("required action `{alias}` in realm `{name}`"),
				});
			};

			if action.enabled {
				return Ok(());
			}

			action.enabled = true;

			self.admin.put_required_action(name, &action).await
		})
		.await
	}

	/// Disables `alias` and removes it from the defaults; absent actions are left alone.
	pub async fn disable_required_action(&self, name: &str, alias: &str) -> Result<()> {
		obs::observe(StepKind::RequiredAction, name, async {
			let Some(mut action) = self.admin.get_required_action(name, alias).await? else {
				return Ok(());
			};

			if !action.enabled && !action.default_action {
				return Ok(());
			}

			action.enabled = false;
			action.default_action = false;

			self.admin.put_required_action(name, &action).await
		})
		.await
	}

	/// Adds `alias` to the user's pending required actions.
	pub async fn add_user_required_action(
		&self,
		name: &str,
		user_id: &str,
		alias: &str,
	) -> Result<()> {
		obs::observe(StepKind::RequiredAction, name, async {
			let mut user = self.admin.get_user(name, user_id).await?;

			if user.required_actions.iter().any(|pending| pending == alias) {
				return Ok(());
			}

			user.required_actions.push(alias.to_owned());

			self.admin.put_user(name, &user).await
		})
		.await
	}

	/// Removes `alias` from the user's pending required actions.
	pub async fn remove_user_required_action(
		&self,
		name: &str,
		user_id: &str,
		alias: &str,
	) -> Result<()> {
		obs::observe(StepKind::RequiredAction, name, async {
			let mut user = self.admin.get_user(name, user_id).await?;
			let before = user.required_actions.len();

			user.required_actions.retain(|pending| pending != alias);

			if user.required_actions.len() == before {
				return Ok(());
			}

			self.admin.put_user(name, &user).await
		})
		.await
	}

	/// Enables localization with the given locales.
	pub async fn enable_localization(
		&self,
		name: &str,
		supported_locales: &[&str],
		default_locale: &str,
	) -> Result<()> {
		obs::observe(StepKind::Localization, name, async {
			let patch = json!({
				"realm": name,
				"internationalizationEnabled": true,
				"supportedLocales": supported_locales,
				"defaultLocale": default_locale,
			});

			self.admin.update_realm(name, &patch).await
		})
		.await
	}

	/// Alias of the realm's bound browser flow.
	pub async fn entry_point(&self, name: &str) -> Result<Option<String>> {
		self.admin.realm_entry_point(name).await
	}
}
