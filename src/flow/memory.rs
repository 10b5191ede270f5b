//! In-process [`FlowRemote`] reproducing the admin API's observable flow behavior.
//!
//! Creations return no ids, listings are flattened depth-first with levels and indices, duplicate
//! aliases report [`Creation::AlreadyExists`], copies rename nested subflows after the new flow,
//! and every call is appended to a log so tests can assert ordering.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	flow::{
		AuthenticatorConfig, Creation, FlowKind, FlowRemote, FlowSummary, NodeId, NodeInfo,
		RemoteFuture, Requirement,
	},
};

#[derive(Clone, Debug)]
struct FlowRecord {
	id: String,
	alias: String,
	description: String,
	kind: FlowKind,
	top_level: bool,
	built_in: bool,
	executions: Vec<ExecutionRecord>,
}

#[derive(Clone, Debug)]
struct ExecutionRecord {
	id: String,
	requirement: Requirement,
	target: Target,
	config_id: Option<String>,
}

#[derive(Clone, Debug)]
enum Target {
	Provider(String),
	Flow(String),
}

#[derive(Debug, Default)]
struct RealmFlows {
	flows: Vec<FlowRecord>,
	configs: HashMap<String, AuthenticatorConfig>,
	browser_flow: Option<String>,
}
impl RealmFlows {
	fn flow(&self, alias: &str) -> Option<&FlowRecord> {
		self.flows.iter().find(|flow| flow.alias == alias)
	}

	fn flow_mut(&mut self, alias: &str) -> Result<&mut FlowRecord> {
		self.flows.iter_mut().find(|flow| flow.alias == alias).ok_or_else(|| not_found(alias))
	}

	fn flatten(&self, alias: &str, level: u32, out: &mut Vec<NodeInfo>) {
		let Some(flow) = self.flow(alias) else { return };

		for (index, execution) in flow.executions.iter().enumerate() {
			let (display_name, provider_id, is_flow, flow_id, nested) = match &execution.target {
				Target::Provider(provider) =>
					(provider.clone(), Some(provider.clone()), false, None, None),
				Target::Flow(nested) => {
					let record = self.flow(nested);

					(
						nested.clone(),
						record.map(|r| r.kind.provider_id().to_owned()),
						true,
						record.map(|r| r.id.clone()),
						Some(nested),
					)
				},
			};

			out.push(NodeInfo {
				id: NodeId::new(execution.id.clone()),
				requirement: execution.requirement,
				display_name,
				alias: None,
				is_flow,
				provider_id,
				level,
				index: u32::try_from(index).unwrap_or(u32::MAX),
				config_id: execution.config_id.clone(),
				flow_id,
			});

			if let Some(nested) = nested {
				self.flatten(nested, level + 1, out);
			}
		}
	}

	fn subtree_aliases(&self, alias: &str, out: &mut Vec<String>) {
		out.push(alias.to_owned());

		let nested: Vec<String> = self
			.flow(alias)
			.map(|flow| {
				flow.executions
					.iter()
					.filter_map(|execution| match &execution.target {
						Target::Flow(nested) => Some(nested.clone()),
						Target::Provider(_) => None,
					})
					.collect()
			})
			.unwrap_or_default();

		for child in nested {
			self.subtree_aliases(&child, out);
		}
	}

	fn locate(&mut self, id: &str) -> Option<(usize, usize)> {
		self.flows.iter().enumerate().find_map(|(flow_index, flow)| {
			flow.executions
				.iter()
				.position(|execution| execution.id == id)
				.map(|position| (flow_index, position))
		})
	}
}

/// In-memory admin API covering the flow endpoints.
#[derive(Debug, Default)]
pub struct MemoryFlowRemote {
	realms: Mutex<HashMap<String, RealmFlows>>,
	calls: Mutex<Vec<String>>,
	seed_browser: bool,
	next_id: AtomicU64,
}
impl MemoryFlowRemote {
	/// Remote whose realms start without any flows.
	pub fn new() -> Self {
		Self::default()
	}

	/// Remote whose realms start with the stock `browser` flow bound as entry point.
	pub fn with_browser_template() -> Self {
		Self { seed_browser: true, ..Self::default() }
	}

	/// Calls received so far, formatted as `operation realm target`.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	/// Number of top-level flows in `realm`.
	pub fn top_level_flow_count(&self, realm: &str) -> usize {
		self.realms
			.lock()
			.get(realm)
			.map(|flows| flows.flows.iter().filter(|flow| flow.top_level).count())
			.unwrap_or(0)
	}

	fn next_id(&self, prefix: &str) -> String {
		format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
	}

	fn log(&self, entry: String) {
		self.calls.lock().push(entry);
	}

	fn with_realm<T>(&self, realm: &str, f: impl FnOnce(&mut RealmFlows) -> Result<T>) -> Result<T> {
		let mut realms = self.realms.lock();
		let flows = realms.entry(realm.to_owned()).or_insert_with(|| self.seeded());

		f(flows)
	}

	fn seeded(&self) -> RealmFlows {
		let mut flows = RealmFlows::default();

		if !self.seed_browser {
			return flows;
		}

		let exec = |requirement, target| ExecutionRecord {
			id: self.next_id("exec"),
			requirement,
			target,
			config_id: None,
		};
		let otp = FlowRecord {
			id: self.next_id("flow"),
			alias: "Browser - Conditional OTP".into(),
			description: "Flow to determine if the OTP is required for the authentication".into(),
			kind: FlowKind::Basic,
			top_level: false,
			built_in: true,
			executions: vec![
				exec(Requirement::Required, Target::Provider("conditional-user-configured".into())),
				exec(Requirement::Required, Target::Provider("auth-otp-form".into())),
			],
		};
		let forms = FlowRecord {
			id: self.next_id("flow"),
			alias: "forms".into(),
			description: "Username, password, otp and other auth forms.".into(),
			kind: FlowKind::Basic,
			top_level: false,
			built_in: true,
			executions: vec![
				exec(Requirement::Required, Target::Provider("auth-username-password-form".into())),
				exec(Requirement::Conditional, Target::Flow(otp.alias.clone())),
			],
		};
		let browser = FlowRecord {
			id: self.next_id("flow"),
			alias: "browser".into(),
			description: "browser based authentication".into(),
			kind: FlowKind::Basic,
			top_level: true,
			built_in: true,
			executions: vec![
				exec(Requirement::Alternative, Target::Provider("auth-cookie".into())),
				exec(Requirement::Disabled, Target::Provider("auth-spnego".into())),
				exec(Requirement::Alternative, Target::Provider("identity-provider-redirector".into())),
				exec(Requirement::Alternative, Target::Flow(forms.alias.clone())),
			],
		};

		flows.browser_flow = Some(browser.alias.clone());
		flows.flows = vec![browser, forms, otp];

		flows
	}
}
impl FlowRemote for MemoryFlowRemote {
	fn create_flow<'a>(
		&'a self,
		realm: &'a str,
		alias: &'a str,
		description: &'a str,
		kind: FlowKind,
	) -> RemoteFuture<'a, Creation> {
		Box::pin(async move {
			self.log(format!("create_flow {realm} {alias}"));
			self.with_realm(realm, |flows| {
				if flows.flow(alias).is_some() {
					return Ok(Creation::AlreadyExists);
				}

				flows.flows.push(FlowRecord {
					id: self.next_id("flow"),
					alias: alias.to_owned(),
					description: description.to_owned(),
					kind,
					top_level: true,
					built_in: false,
					executions: Vec::new(),
				});

				Ok(Creation::Created)
			})
		})
	}

	fn copy_flow<'a>(
		&'a self,
		realm: &'a str,
		source: &'a str,
		dest: &'a str,
	) -> RemoteFuture<'a, Creation> {
		Box::pin(async move {
			self.log(format!("copy_flow {realm} {source} {dest}"));
			self.with_realm(realm, |flows| {
				if flows.flow(dest).is_some() {
					return Ok(Creation::AlreadyExists);
				}
				if flows.flow(source).is_none() {
					return Err(not_found(source));
				}

				let mut aliases = Vec::new();

				flows.subtree_aliases(source, &mut aliases);

				let rename = |alias: &str| {
					if alias == source { dest.to_owned() } else { format!("{dest} {alias}") }
				};
				let copies: Vec<FlowRecord> = aliases
					.iter()
					.filter_map(|alias| flows.flow(alias))
					.map(|original| FlowRecord {
						id: self.next_id("flow"),
						alias: rename(&original.alias),
						description: original.description.clone(),
						kind: original.kind,
						top_level: original.alias == source,
						built_in: false,
						executions: original
							.executions
							.iter()
							.map(|execution| ExecutionRecord {
								id: self.next_id("exec"),
								requirement: execution.requirement,
								target: match &execution.target {
									Target::Flow(nested) => Target::Flow(rename(nested)),
									provider => provider.clone(),
								},
								config_id: execution.config_id.clone(),
							})
							.collect(),
					})
					.collect();

				flows.flows.extend(copies);

				Ok(Creation::Created)
			})
		})
	}

	fn list_flows<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Vec<FlowSummary>> {
		Box::pin(async move {
			self.with_realm(realm, |flows| {
				Ok(flows
					.flows
					.iter()
					.filter(|flow| flow.top_level)
					.map(|flow| FlowSummary {
						id: flow.id.clone(),
						alias: flow.alias.clone(),
						description: Some(flow.description.clone()),
						provider_id: flow.kind.provider_id().to_owned(),
						top_level: true,
						built_in: flow.built_in,
					})
					.collect())
			})
		})
	}

	fn delete_flow<'a>(&'a self, realm: &'a str, flow_id: &'a str) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("delete_flow {realm} {flow_id}"));
			self.with_realm(realm, |flows| {
				let alias = flows
					.flows
					.iter()
					.find(|flow| flow.id == flow_id)
					.map(|flow| flow.alias.clone())
					.ok_or_else(|| not_found(flow_id))?;
				let mut doomed = Vec::new();

				flows.subtree_aliases(&alias, &mut doomed);
				flows.flows.retain(|flow| !doomed.contains(&flow.alias));

				Ok(())
			})
		})
	}

	fn list_executions<'a>(
		&'a self,
		realm: &'a str,
		flow_alias: &'a str,
	) -> RemoteFuture<'a, Vec<NodeInfo>> {
		Box::pin(async move {
			self.with_realm(realm, |flows| {
				if flows.flow(flow_alias).is_none() {
					return Err(not_found(flow_alias));
				}

				let mut out = Vec::new();

				flows.flatten(flow_alias, 0, &mut out);

				Ok(out)
			})
		})
	}

	fn add_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		provider: &'a str,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("add_execution {realm} {parent_alias} {provider}"));
			self.with_realm(realm, |flows| {
				let id = self.next_id("exec");

				flows.flow_mut(parent_alias)?.executions.push(ExecutionRecord {
					id,
					requirement: Requirement::Disabled,
					target: Target::Provider(provider.to_owned()),
					config_id: None,
				});

				Ok(())
			})
		})
	}

	fn add_subflow<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		alias: &'a str,
		kind: FlowKind,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("add_subflow {realm} {parent_alias} {alias}"));
			self.with_realm(realm, |flows| {
				if flows.flow(alias).is_some() {
					return Err(Error::RemoteRejected {
						method: "POST".into(),
						endpoint: format!("flows/{parent_alias}/executions/flow"),
						status: 409,
						body: format!("New flow alias name already exists: {alias}"),
					});
				}

				flows.flow_mut(parent_alias)?;
				flows.flows.push(FlowRecord {
					id: self.next_id("flow"),
					alias: alias.to_owned(),
					description: String::new(),
					kind,
					top_level: false,
					built_in: false,
					executions: Vec::new(),
				});

				let id = self.next_id("exec");

				flows.flow_mut(parent_alias)?.executions.push(ExecutionRecord {
					id,
					requirement: Requirement::Disabled,
					target: Target::Flow(alias.to_owned()),
					config_id: None,
				});

				Ok(())
			})
		})
	}

	fn update_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		node: &'a NodeInfo,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("update_execution {realm} {parent_alias} {} {}", node.id, node.requirement));
			self.with_realm(realm, |flows| {
				let (flow, position) =
					flows.locate(node.id.as_str()).ok_or_else(|| not_found(node.id.as_str()))?;

				flows.flows[flow].executions[position].requirement = node.requirement;

				Ok(())
			})
		})
	}

	fn raise_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("raise_priority {realm} {node_id}"));
			self.with_realm(realm, |flows| {
				let (flow, position) =
					flows.locate(node_id.as_str()).ok_or_else(|| not_found(node_id.as_str()))?;

				if position > 0 {
					flows.flows[flow].executions.swap(position, position - 1);
				}

				Ok(())
			})
		})
	}

	fn lower_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("lower_priority {realm} {node_id}"));
			self.with_realm(realm, |flows| {
				let (flow, position) =
					flows.locate(node_id.as_str()).ok_or_else(|| not_found(node_id.as_str()))?;
				let executions = &mut flows.flows[flow].executions;

				if position + 1 < executions.len() {
					executions.swap(position, position + 1);
				}

				Ok(())
			})
		})
	}

	fn create_config<'a>(
		&'a self,
		realm: &'a str,
		node_id: &'a NodeId,
		config: &'a AuthenticatorConfig,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("create_config {realm} {node_id} {}", config.alias));
			self.with_realm(realm, |flows| {
				let (flow, position) =
					flows.locate(node_id.as_str()).ok_or_else(|| not_found(node_id.as_str()))?;
				let id = self.next_id("config");

				flows.flows[flow].executions[position].config_id = Some(id.clone());
				flows.configs.insert(id.clone(), AuthenticatorConfig { id: Some(id), ..config.clone() });

				Ok(())
			})
		})
	}

	fn get_config<'a>(
		&'a self,
		realm: &'a str,
		config_id: &'a str,
	) -> RemoteFuture<'a, AuthenticatorConfig> {
		Box::pin(async move {
			self.with_realm(realm, |flows| {
				flows.configs.get(config_id).cloned().ok_or_else(|| not_found(config_id))
			})
		})
	}

	fn bind_browser_flow<'a>(&'a self, realm: &'a str, alias: &'a str) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.log(format!("bind_browser_flow {realm} {alias}"));
			self.with_realm(realm, |flows| {
				if flows.flow(alias).is_none() {
					return Err(not_found(alias));
				}

				flows.browser_flow = Some(alias.to_owned());

				Ok(())
			})
		})
	}

	fn browser_flow<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Option<String>> {
		Box::pin(async move { self.with_realm(realm, |flows| Ok(flows.browser_flow.clone())) })
	}
}

fn not_found(what: &str) -> Error {
	Error::RemoteRejected {
		method: "GET".into(),
		endpoint: what.to_owned(),
		status: 404,
		body: "Could not find resource".into(),
	}
}
