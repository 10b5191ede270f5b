//! [`FlowRemote`] over the authentication-management endpoints.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	admin::AdminClient,
	flow::{
		AuthenticatorConfig, Creation, FlowKind, FlowRemote, FlowSummary, NodeId, NodeInfo,
		RemoteFuture,
	},
};

impl FlowRemote for AdminClient {
	fn create_flow<'a>(
		&'a self,
		realm: &'a str,
		alias: &'a str,
		description: &'a str,
		kind: FlowKind,
	) -> RemoteFuture<'a, Creation> {
		Box::pin(async move {
			let url = self.endpoint([realm, "authentication", "flows"])?;
			let body = json!({
				"alias": alias,
				"description": description,
				"providerId": kind.provider_id(),
				"topLevel": true,
				"builtIn": false,
			});

			self.create(url, &body).await
		})
	}

	fn copy_flow<'a>(
		&'a self,
		realm: &'a str,
		source: &'a str,
		dest: &'a str,
	) -> RemoteFuture<'a, Creation> {
		Box::pin(async move {
			let url = self.endpoint([realm, "authentication", "flows", source, "copy"])?;

			self.create(url, &json!({ "newName": dest })).await
		})
	}

	fn list_flows<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Vec<FlowSummary>> {
		Box::pin(async move {
			self.get_json(self.endpoint([realm, "authentication", "flows"])?).await
		})
	}

	fn delete_flow<'a>(&'a self, realm: &'a str, flow_id: &'a str) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url = self.endpoint([realm, "authentication", "flows", flow_id])?;

			self.execute::<()>(Method::DELETE, url, None).await
		})
	}

	fn list_executions<'a>(
		&'a self,
		realm: &'a str,
		flow_alias: &'a str,
	) -> RemoteFuture<'a, Vec<NodeInfo>> {
		Box::pin(async move {
			let url =
				self.endpoint([realm, "authentication", "flows", flow_alias, "executions"])?;

			self.get_json(url).await
		})
	}

	fn add_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		provider: &'a str,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url = self.endpoint([
				realm,
				"authentication",
				"flows",
				parent_alias,
				"executions",
				"execution",
			])?;

			self.execute(Method::POST, url, Some(&json!({ "provider": provider }))).await
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
			let url = self.endpoint([
				realm,
				"authentication",
				"flows",
				parent_alias,
				"executions",
				"flow",
			])?;
			let body = json!({
				"alias": alias,
				"type": kind.provider_id(),
				"provider": "registration-page-form",
				"description": "",
			});

			self.execute(Method::POST, url, Some(&body)).await
		})
	}

	fn update_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		node: &'a NodeInfo,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url =
				self.endpoint([realm, "authentication", "flows", parent_alias, "executions"])?;

			self.execute(Method::PUT, url, Some(node)).await
		})
	}

	fn raise_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url = self.endpoint([
				realm,
				"authentication",
				"executions",
				node_id.as_str(),
				"raise-priority",
			])?;

			self.execute::<()>(Method::POST, url, None).await
		})
	}

	fn lower_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url = self.endpoint([
				realm,
				"authentication",
				"executions",
				node_id.as_str(),
				"lower-priority",
			])?;

			self.execute::<()>(Method::POST, url, None).await
		})
	}

	fn create_config<'a>(
		&'a self,
		realm: &'a str,
		node_id: &'a NodeId,
		config: &'a AuthenticatorConfig,
	) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			let url =
				self.endpoint([realm, "authentication", "executions", node_id.as_str(), "config"])?;

			self.execute(Method::POST, url, Some(config)).await
		})
	}

	fn get_config<'a>(
		&'a self,
		realm: &'a str,
		config_id: &'a str,
	) -> RemoteFuture<'a, AuthenticatorConfig> {
		Box::pin(async move {
			self.get_json(self.endpoint([realm, "authentication", "config", config_id])?).await
		})
	}

	fn bind_browser_flow<'a>(&'a self, realm: &'a str, alias: &'a str) -> RemoteFuture<'a, ()> {
		Box::pin(async move {
			self.update_realm(realm, &json!({ "realm": realm, "browserFlow": alias })).await
		})
	}

	fn browser_flow<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Option<String>> {
		Box::pin(async move { self.realm_entry_point(realm).await })
	}
}
