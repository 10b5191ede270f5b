//! Sequential provisioning of every scenario realm.

// self
use crate::{
	_prelude::*,
	admin::{AdminClient, MailTransport},
	config::ProvisionerConfig,
	flow::BuildReport,
	mail::MailCapture,
	obs::{self, StepKind},
	realm::{RealmProvisioner, UserSpec},
	scenario::{
		AdminCredentialEnroller, CONFIGURE_TOTP, Scenario, SecondFactorEnroller, TEST_CLIENT_ID,
		TEST_PASSWORD, catalog, mail_transport,
	},
	store::{FileSecretStore, SecretStore},
};

/// Outcome of provisioning one realm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealmReport {
	/// Realm name.
	pub realm: String,
	/// Alias of the bound entry-point flow.
	pub entry_point: String,
	/// User ids by username.
	pub users: BTreeMap<String, String>,
	/// Usernames that received a second-factor seed.
	pub enrolled: Vec<String>,
	/// Flow construction record.
	pub build: BuildReport,
}

/// Outcome of a complete run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
	/// Realms in provisioning order.
	pub realms: Vec<RealmReport>,
}

/// Builds every scenario realm, one after another, stopping at the first failure.
pub struct Orchestrator {
	provisioner: RealmProvisioner,
	secrets: Arc<dyn SecretStore>,
	enroller: Arc<dyn SecondFactorEnroller>,
	mail: Option<MailCapture>,
	transport: MailTransport,
	scenarios: Vec<Scenario>,
}
impl Orchestrator {
	/// Orchestrator over the built-in catalog, enrolling through the admin API.
	pub fn new(provisioner: RealmProvisioner, secrets: Arc<dyn SecretStore>) -> Self {
		let enroller = Arc::new(AdminCredentialEnroller::new(provisioner.clone()));

		Self {
			provisioner,
			secrets,
			enroller,
			mail: None,
			transport: mail_transport(),
			scenarios: catalog(),
		}
	}

	/// Wires the admin client, file secret store, and mail capture described by `config`.
	pub fn from_config(config: &ProvisionerConfig) -> Result<Self> {
		let provisioner = RealmProvisioner::new(AdminClient::new(config)?);
		let secrets = Arc::new(FileSecretStore::open(&config.secrets_path)?);
		let mut orchestrator = Self::new(provisioner, secrets);

		orchestrator.mail = MailCapture::from_config(config)?;

		Ok(orchestrator)
	}

	/// Purges this mail capture at the start of each run.
	pub fn with_mail(mut self, mail: MailCapture) -> Self {
		self.mail = Some(mail);

		self
	}

	/// Replaces the second-factor enroller.
	pub fn with_enroller(mut self, enroller: Arc<dyn SecondFactorEnroller>) -> Self {
		self.enroller = enroller;

		self
	}

	/// Replaces the scenario list.
	pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
		self.scenarios = scenarios;

		self
	}

	/// Replaces the realms' outbound mail transport.
	pub fn with_transport(mut self, transport: MailTransport) -> Self {
		self.transport = transport;

		self
	}

	/// Scenarios provisioned by [`Self::run`].
	pub fn scenarios(&self) -> &[Scenario] {
		&self.scenarios
	}

	/// Clears stale seeds and captured mail, then provisions every scenario in order.
	pub async fn run(&self) -> Result<RunReport> {
		self.secrets.clear().await?;

		if let Some(mail) = &self.mail {
			mail.delete_all().await?;
		}

		let mut report = RunReport::default();

		for scenario in &self.scenarios {
			report.realms.push(self.provision(scenario).await?);
		}

		#[cfg(feature = "tracing")]
		tracing::info!(realms = report.realms.len(), "provisioning run complete");

		Ok(report)
	}

	/// Builds one scenario realm from scratch.
	pub async fn provision(&self, scenario: &Scenario) -> Result<RealmReport> {
		let realm = scenario.realm.as_str();

		obs::observe(StepKind::Scenario, realm, async {
			let provisioner = &self.provisioner;

			provisioner.reset_realm(realm).await?;
			provisioner.configure_mail(realm, &self.transport).await?;
			provisioner.ensure_client(realm, TEST_CLIENT_ID).await?;

			if let Some(localization) = &scenario.localization {
				provisioner
					.enable_localization(realm, &localization.supported, localization.default)
					.await?;
			}

			for role in &scenario.roles {
				provisioner.ensure_role(realm, role).await?;
			}

			let mut users = BTreeMap::new();

			for user in &scenario.users {
				let spec = UserSpec::new(&user.username, user.email(), TEST_PASSWORD);
				let id = provisioner.create_user(realm, &spec).await?;

				for role in &user.roles {
					provisioner.assign_role(realm, &id, role).await?;
				}

				users.insert(user.username.clone(), id);
			}

			let mut enrolled = Vec::new();

			for user in scenario.users.iter().filter(|user| user.second_factor) {
				let id = users.get(&user.username).ok_or_else(|| Error::MissingValue {
					what: format!("id of `{}`", user.username),
				})?;

				provisioner.enable_required_action(realm, CONFIGURE_TOTP).await?;
				provisioner.add_user_required_action(realm, id, CONFIGURE_TOTP).await?;

				let seed = self.enroller.enroll(realm, id, &user.username).await?;

				self.secrets.put(&user.username, seed).await?;
				enrolled.push(user.username.clone());
			}

			let build = scenario.apply_flow(&provisioner.flows(realm)).await?;

			Ok(RealmReport {
				realm: realm.to_owned(),
				entry_point: build.flow_alias.clone(),
				users,
				enrolled,
				build,
			})
		})
		.await
	}
}
impl Debug for Orchestrator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Orchestrator")
			.field("provisioner", &self.provisioner)
			.field("mail", &self.mail)
			.field("scenarios", &self.scenarios.len())
			.finish()
	}
}
