//! Provisions every catalog realm against a running identity provider and mail capture.
//!
//! Reads `KEYCLOAK_URL`, `MAILPIT_URL`, `KEYCLOAK_ADMIN_USERNAME`, `KEYCLOAK_ADMIN_PASSWORD`, and
//! `TOTP_SECRETS_FILE`, falling back to local defaults. Set `RUST_LOG` to adjust verbosity.

// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use flow_provisioner::{config::ProvisionerConfig, scenario::Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let config = ProvisionerConfig::from_env()?;
	let orchestrator = Orchestrator::from_config(&config)?;
	let report = orchestrator.run().await?;

	for realm in &report.realms {
		println!(
			"{:<28} entry point {:<28} users {:>2} enrolled {}",
			realm.realm,
			realm.entry_point,
			realm.users.len(),
			realm.enrolled.join(", ")
		);
	}

	println!("Seeds written to {}.", config.secrets_path.display());

	Ok(())
}
