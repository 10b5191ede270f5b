//! The remote seam the flow builder drives.

// self
use crate::{
	_prelude::*,
	flow::{AuthenticatorConfig, FlowKind, FlowSummary, NodeId, NodeInfo},
};

/// Boxed future returned by [`FlowRemote`] operations.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Outcome of a conflict-tolerant creation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Creation {
	/// The resource was created by this call.
	Created,
	/// The remote reported the resource as already present.
	AlreadyExists,
}
impl Creation {
	/// Returns `true` when this call created the resource.
	pub fn is_created(self) -> bool {
		matches!(self, Creation::Created)
	}
}

/// Flow-management calls of an identity provider's admin API, scoped by realm.
///
/// Creation calls acknowledge without returning identifiers. Implementations report a duplicate
/// alias as [`Creation::AlreadyExists`] and every other non-success as an [`Error`].
pub trait FlowRemote
where
	Self: Send + Sync,
{
	/// Creates a top-level flow.
	fn create_flow<'a>(
		&'a self,
		realm: &'a str,
		alias: &'a str,
		description: &'a str,
		kind: FlowKind,
	) -> RemoteFuture<'a, Creation>;

	/// Deep-copies `source` into a new flow named `dest`.
	fn copy_flow<'a>(
		&'a self,
		realm: &'a str,
		source: &'a str,
		dest: &'a str,
	) -> RemoteFuture<'a, Creation>;

	/// Lists the realm's top-level flows.
	fn list_flows<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Vec<FlowSummary>>;

	/// Deletes a flow and its subtree by id.
	fn delete_flow<'a>(&'a self, realm: &'a str, flow_id: &'a str) -> RemoteFuture<'a, ()>;

	/// Lists every execution below `flow_alias`, depth-first, with levels and indices.
	fn list_executions<'a>(
		&'a self,
		realm: &'a str,
		flow_alias: &'a str,
	) -> RemoteFuture<'a, Vec<NodeInfo>>;

	/// Appends a leaf execution for `provider` to `parent_alias`.
	fn add_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		provider: &'a str,
	) -> RemoteFuture<'a, ()>;

	/// Appends a subflow named `alias` to `parent_alias`.
	fn add_subflow<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		alias: &'a str,
		kind: FlowKind,
	) -> RemoteFuture<'a, ()>;

	/// Writes back an execution listed under `parent_alias` (used for requirement changes).
	fn update_execution<'a>(
		&'a self,
		realm: &'a str,
		parent_alias: &'a str,
		node: &'a NodeInfo,
	) -> RemoteFuture<'a, ()>;

	/// Moves an execution one position earlier among its siblings.
	fn raise_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()>;

	/// Moves an execution one position later among its siblings.
	fn lower_priority<'a>(&'a self, realm: &'a str, node_id: &'a NodeId) -> RemoteFuture<'a, ()>;

	/// Binds a new configuration to an execution.
	fn create_config<'a>(
		&'a self,
		realm: &'a str,
		node_id: &'a NodeId,
		config: &'a AuthenticatorConfig,
	) -> RemoteFuture<'a, ()>;

	/// Reads a configuration back by id.
	fn get_config<'a>(
		&'a self,
		realm: &'a str,
		config_id: &'a str,
	) -> RemoteFuture<'a, AuthenticatorConfig>;

	/// Sets the realm's browser entry-point flow.
	fn bind_browser_flow<'a>(&'a self, realm: &'a str, alias: &'a str) -> RemoteFuture<'a, ()>;

	/// Returns the realm's browser entry-point flow alias.
	fn browser_flow<'a>(&'a self, realm: &'a str) -> RemoteFuture<'a, Option<String>>;
}
