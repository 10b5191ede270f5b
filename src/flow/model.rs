//! Tree model for authentication flows plus the wire shapes exchanged with the remote.

// self
use crate::_prelude::*;

/// Per-node evaluation policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
	/// Must succeed.
	Required,
	/// One of the alternatives at this level must succeed.
	Alternative,
	/// Evaluated only when the subflow's condition leaves hold.
	Conditional,
	/// Skipped.
	Disabled,
}
impl Requirement {
	/// Wire label of the requirement.
	pub const fn as_str(self) -> &'static str {
		match self {
			Requirement::Required => "REQUIRED",
			Requirement::Alternative => "ALTERNATIVE",
			Requirement::Conditional => "CONDITIONAL",
			Requirement::Disabled => "DISABLED",
		}
	}
}
impl Display for Requirement {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Kind of flow container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowKind {
	/// Plain flow of authenticators.
	#[default]
	#[serde(rename = "basic-flow")]
	Basic,
	/// Form-rendering flow.
	#[serde(rename = "form-flow")]
	Form,
}
impl FlowKind {
	/// Provider id the remote expects for this kind.
	pub const fn provider_id(self) -> &'static str {
		match self {
			FlowKind::Basic => "basic-flow",
			FlowKind::Form => "form-flow",
		}
	}
}

/// Opaque execution identifier assigned by the remote.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);
impl NodeId {
	/// Wraps a remote identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Borrows the identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for NodeId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// One row of a flow's flattened execution listing.
///
/// `level` is the depth below the listed flow (direct children are level 0) and `index` the
/// position among siblings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
	/// Execution identifier.
	pub id: NodeId,
	/// Current requirement.
	pub requirement: Requirement,
	/// Provider name for leaves, alias for subflows.
	#[serde(default)]
	pub display_name: String,
	/// Subflow alias, when reported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alias: Option<String>,
	/// `true` for subflow rows.
	#[serde(default, rename = "authenticationFlow")]
	pub is_flow: bool,
	/// Authenticator provider id for leaves.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub provider_id: Option<String>,
	/// Depth below the listed flow.
	#[serde(default)]
	pub level: u32,
	/// Position among siblings.
	#[serde(default)]
	pub index: u32,
	/// Attached configuration id.
	#[serde(default, rename = "authenticationConfig", skip_serializing_if = "Option::is_none")]
	pub config_id: Option<String>,
	/// Nested flow id for subflow rows.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flow_id: Option<String>,
}
impl NodeInfo {
	/// Returns `true` for direct children of the listed flow.
	pub fn is_direct_child(&self) -> bool {
		self.level == 0
	}

	/// Alias to address this node as a parent (subflows only).
	pub fn subflow_alias(&self) -> Option<&str> {
		if !self.is_flow {
			return None;
		}

		Some(self.alias.as_deref().unwrap_or(&self.display_name))
	}
}

/// Top-level flow summary returned by the flow listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
	/// Flow identifier.
	pub id: String,
	/// Realm-unique alias.
	pub alias: String,
	/// Free-form description.
	#[serde(default)]
	pub description: Option<String>,
	/// Container provider id; stock flows also report kinds such as `client-flow`.
	#[serde(default)]
	pub provider_id: String,
	/// `true` for flows that are not nested in another flow.
	#[serde(default)]
	pub top_level: bool,
	/// `true` for flows shipped by the remote.
	#[serde(default)]
	pub built_in: bool,
}

/// Named settings bag bound to one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorConfig {
	/// Identifier assigned by the remote.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Config alias.
	pub alias: String,
	/// Opaque key/value settings.
	#[serde(default)]
	pub config: BTreeMap<String, String>,
}
impl AuthenticatorConfig {
	/// Builds an unsaved configuration.
	pub fn new(alias: impl Into<String>, config: BTreeMap<String, String>) -> Self {
		Self { id: None, alias: alias.into(), config }
	}
}

/// Configuration attached to a leaf while the tree is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSpec {
	/// Config alias.
	pub alias: String,
	/// Settings sent verbatim.
	pub settings: BTreeMap<String, String>,
}

/// Node of a flow tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
	/// Invokes one authenticator.
	Leaf {
		/// Authenticator provider id.
		provider: String,
		/// Requirement applied after creation.
		requirement: Requirement,
		/// Optional configuration attached after the requirement.
		config: Option<ConfigSpec>,
	},
	/// Nests an ordered child flow.
	Subflow {
		/// Realm-unique alias of the nested flow.
		alias: String,
		/// Container kind.
		kind: FlowKind,
		/// Requirement applied after creation.
		requirement: Requirement,
		/// Children in creation order.
		children: Vec<Node>,
	},
}
impl Node {
	/// Leaf without configuration.
	pub fn leaf(provider: impl Into<String>, requirement: Requirement) -> Self {
		Self::Leaf { provider: provider.into(), requirement, config: None }
	}

	/// Basic subflow with the given children.
	pub fn subflow(
		alias: impl Into<String>,
		requirement: Requirement,
		children: impl IntoIterator<Item = Node>,
	) -> Self {
		Self::Subflow {
			alias: alias.into(),
			kind: FlowKind::Basic,
			requirement,
			children: children.into_iter().collect(),
		}
	}

	/// Attaches a configuration to a leaf; subflows are returned unchanged.
	pub fn with_config<I, K, V>(self, alias: impl Into<String>, settings: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		match self {
			Self::Leaf { provider, requirement, .. } => Self::Leaf {
				provider,
				requirement,
				config: Some(ConfigSpec {
					alias: alias.into(),
					settings: settings.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
				}),
			},
			subflow => subflow,
		}
	}

	/// Requirement of the node.
	pub fn requirement(&self) -> Requirement {
		match self {
			Self::Leaf { requirement, .. } | Self::Subflow { requirement, .. } => *requirement,
		}
	}

	/// Provider id for leaves, alias for subflows.
	pub fn label(&self) -> &str {
		match self {
			Self::Leaf { provider, .. } => provider,
			Self::Subflow { alias, .. } => alias,
		}
	}

	/// Number of nodes in this subtree, including itself.
	pub fn size(&self) -> usize {
		match self {
			Self::Leaf { .. } => 1,
			Self::Subflow { children, .. } => 1 + children.iter().map(Node::size).sum::<usize>(),
		}
	}
}

/// Top-level flow to build from scratch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowTree {
	/// Realm-unique alias.
	pub alias: String,
	/// Description stored with the flow.
	pub description: String,
	/// Container kind.
	pub kind: FlowKind,
	/// Direct children in creation order.
	pub children: Vec<Node>,
}
impl FlowTree {
	/// Empty basic flow.
	pub fn new(alias: impl Into<String>) -> Self {
		Self {
			alias: alias.into(),
			description: String::new(),
			kind: FlowKind::Basic,
			children: Vec::new(),
		}
	}

	/// Sets the description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();

		self
	}

	/// Appends a direct child.
	pub fn child(mut self, node: Node) -> Self {
		self.children.push(node);

		self
	}

	/// Total number of nodes below the flow.
	pub fn size(&self) -> usize {
		self.children.iter().map(Node::size).sum()
	}
}

/// Construction state of a node or flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeState {
	/// Not yet created.
	Absent,
	/// Created and resolved.
	Created,
	/// Configuration attached.
	Configured,
	/// Bound as the realm's entry point.
	Bound,
}
impl NodeState {
	/// Moves forward to `to`, rejecting any backward or repeated transition.
	pub fn advance(self, node: &str, to: NodeState) -> Result<NodeState> {
		if to <= self || (self == NodeState::Absent && to != NodeState::Created) {
			return Err(Error::InvalidTransition { node: node.to_owned(), from: self, to });
		}

		Ok(to)
	}
}
impl Display for NodeState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			NodeState::Absent => "absent",
			NodeState::Created => "created",
			NodeState::Configured => "configured",
			NodeState::Bound => "bound",
		})
	}
}
