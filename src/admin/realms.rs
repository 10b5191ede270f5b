//! Realm, role, user, client, required-action, and credential endpoints.

// crates.io
use serde_json::{Map, Value, json};
use uuid::Uuid;
// self
use crate::{_prelude::*, admin::AdminClient, auth::TokenSecret, flow::Creation};

/// Realm representation fields the provisioner reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmSummary {
	/// Realm name.
	pub realm: String,
	/// Whether the realm accepts logins.
	#[serde(default)]
	pub enabled: bool,
	/// Alias of the bound browser flow.
	#[serde(default)]
	pub browser_flow: Option<String>,
	/// Whether localization is enabled.
	#[serde(default)]
	pub internationalization_enabled: bool,
	/// Supported locales.
	#[serde(default)]
	pub supported_locales: Vec<String>,
	/// Default locale.
	#[serde(default)]
	pub default_locale: Option<String>,
}

/// Realm role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	/// Role id.
	pub id: String,
	/// Role name.
	pub name: String,
}

/// Outbound mail transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailTransport {
	/// SMTP host.
	pub host: String,
	/// SMTP port, as the remote stores it.
	pub port: String,
	/// Envelope sender.
	pub from: String,
	/// Display name of the sender.
	pub from_display_name: String,
}

/// User representation, preserving fields the provisioner does not model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
	/// User id.
	pub id: String,
	/// Login name.
	pub username: String,
	/// Email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Pending required actions.
	#[serde(default)]
	pub required_actions: Vec<String>,
	/// Every other field, sent back unchanged on update.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Required-action provider registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAction {
	/// Action alias (e.g. `CONFIGURE_TOTP`).
	pub alias: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Whether the action may be assigned.
	#[serde(default)]
	pub enabled: bool,
	/// Whether new users receive the action.
	#[serde(default)]
	pub default_action: bool,
	/// Every other field, sent back unchanged on update.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// OAuth client fields the provisioner reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
	/// Internal id.
	pub id: String,
	/// Public client id.
	pub client_id: String,
}

impl AdminClient {
	/// Returns `true` when `realm` exists.
	pub async fn realm_exists(&self, realm: &str) -> Result<bool> {
		Ok(self.get_optional_json::<RealmSummary>(self.endpoint([realm])?).await?.is_some())
	}

	/// Reads the realm representation.
	pub async fn get_realm(&self, realm: &str) -> Result<RealmSummary> {
		self.get_json(self.endpoint([realm])?).await
	}

	/// Alias of the realm's bound browser flow.
	pub async fn realm_entry_point(&self, realm: &str) -> Result<Option<String>> {
		Ok(self.get_realm(realm).await?.browser_flow)
	}

	/// Creates a realm from a full representation; an existing realm counts as success.
	pub async fn create_realm(&self, representation: &Value) -> Result<Creation> {
		self.create(self.endpoint::<[&str; 0]>([])?, representation).await
	}

	/// Deletes `realm`; returns `false` when it did not exist.
	pub async fn delete_realm(&self, realm: &str) -> Result<bool> {
		let url = self.endpoint([realm])?;
		let response = self.send::<()>(Method::DELETE, url.clone(), None).await?;
		let status = response.status();

		if status == StatusCode::NOT_FOUND {
			return Ok(false);
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::rejected(&Method::DELETE, url.path(), status, body));
		}

		Ok(true)
	}

	/// Applies a partial realm update.
	pub async fn update_realm(&self, realm: &str, patch: &Value) -> Result<()> {
		self.execute(Method::PUT, self.endpoint([realm])?, Some(patch)).await
	}

	/// Lists the realm's required actions.
	pub async fn list_required_actions(&self, realm: &str) -> Result<Vec<RequiredAction>> {
		self.get_json(self.endpoint([realm, "authentication", "required-actions"])?).await
	}

	/// Reads one required action, or `None` when the realm does not know it.
	pub async fn get_required_action(
		&self,
		realm: &str,
		alias: &str,
	) -> Result<Option<RequiredAction>> {
		self.get_optional_json(self.endpoint([realm, "authentication", "required-actions", alias])?)
			.await
	}

	/// Writes back a required action.
	pub async fn put_required_action(&self, realm: &str, action: &RequiredAction) -> Result<()> {
		let url = self.endpoint([realm, "authentication", "required-actions", &action.alias])?;

		self.execute(Method::PUT, url, Some(action)).await
	}

	/// Registers a required-action provider the realm does not list yet.
	pub async fn register_required_action(
		&self,
		realm: &str,
		provider_id: &str,
	) -> Result<Creation> {
		let url = self.endpoint([realm, "authentication", "register-required-action"])?;

		self.create(url, &json!({ "providerId": provider_id, "name": provider_id })).await
	}

	/// Creates a realm role; an existing role counts as success.
	pub async fn create_role(&self, realm: &str, name: &str) -> Result<Creation> {
		self.create(self.endpoint([realm, "roles"])?, &json!({ "name": name })).await
	}

	/// Reads a realm role by name.
	pub async fn get_role(&self, realm: &str, name: &str) -> Result<Role> {
		self.get_json(self.endpoint([realm, "roles", name])?).await
	}

	/// Creates a user from a full representation; an existing user counts as success.
	pub async fn create_user(&self, realm: &str, representation: &Value) -> Result<Creation> {
		self.create(self.endpoint([realm, "users"])?, representation).await
	}

	/// Finds a user by exact username.
	pub async fn find_user(&self, realm: &str, username: &str) -> Result<Option<UserRecord>> {
		let mut url = self.endpoint([realm, "users"])?;

		url.query_pairs_mut().append_pair("username", username).append_pair("exact", "true");

		let users: Vec<UserRecord> = self.get_json(url).await?;

		Ok(users.into_iter().find(|user| user.username.eq_ignore_ascii_case(username)))
	}

	/// Reads a user by id.
	pub async fn get_user(&self, realm: &str, user_id: &str) -> Result<UserRecord> {
		self.get_json(self.endpoint([realm, "users", user_id])?).await
	}

	/// Writes back a user.
	pub async fn put_user(&self, realm: &str, user: &UserRecord) -> Result<()> {
		self.execute(Method::PUT, self.endpoint([realm, "users", &user.id])?, Some(user)).await
	}

	/// Adds realm roles to a user's role mappings.
	pub async fn add_realm_roles(&self, realm: &str, user_id: &str, roles: &[Role]) -> Result<()> {
		let url = self.endpoint([realm, "users", user_id, "role-mappings", "realm"])?;

		self.execute(Method::POST, url, Some(roles)).await
	}

	/// Lists the realm roles directly mapped to a user.
	pub async fn list_user_realm_roles(&self, realm: &str, user_id: &str) -> Result<Vec<Role>> {
		self.get_json(self.endpoint([realm, "users", user_id, "role-mappings", "realm"])?).await
	}

	/// Finds a client by its public client id.
	pub async fn get_client_by_client_id(
		&self,
		realm: &str,
		client_id: &str,
	) -> Result<Option<ClientSummary>> {
		let mut url = self.endpoint([realm, "clients"])?;

		url.query_pairs_mut().append_pair("clientId", client_id);

		let clients: Vec<ClientSummary> = self.get_json(url).await?;

		Ok(clients.into_iter().find(|client| client.client_id == client_id))
	}

	/// Creates a client from a full representation; an existing client counts as success.
	pub async fn create_client(&self, realm: &str, representation: &Value) -> Result<Creation> {
		self.create(self.endpoint([realm, "clients"])?, representation).await
	}

	/// Stores a TOTP credential (SHA-1, 6 digits, 30 s period) holding `seed` for a user.
	pub async fn put_otp_credential(
		&self,
		realm: &str,
		user_id: &str,
		seed: &TokenSecret,
	) -> Result<()> {
		let credential_id = Uuid::new_v4().to_string();
		let url = self.endpoint([realm, "users", user_id, "credentials", &credential_id])?;
		let credential_data =
			json!({ "subType": "totp", "period": 30, "digits": 6, "algorithm": "HmacSHA1" });
		let secret_data = json!({ "value": seed.expose() });
		let body = json!({
			"id": credential_id,
			"type": "otp",
			"userLabel": "Authenticator",
			"credentialData": credential_data.to_string(),
			"secretData": secret_data.to_string(),
		});

		self.execute(Method::PUT, url, Some(&body)).await
	}
}
