//! Create-then-resolve: find a just-created node in its parent's re-fetched child list.

// self
use crate::{_prelude::*, flow::NodeInfo};

/// What identifies a freshly created child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKey<'a> {
	/// Leaf whose provider id equals the value.
	Provider(&'a str),
	/// Subflow whose display name equals the value.
	DisplayName(&'a str),
}
impl MatchKey<'_> {
	/// Returns `true` when `node` carries this key.
	pub fn matches(&self, node: &NodeInfo) -> bool {
		match self {
			MatchKey::Provider(provider) =>
				!node.is_flow && node.provider_id.as_deref() == Some(*provider),
			MatchKey::DisplayName(name) => node.is_flow && node.display_name == *name,
		}
	}
}
impl Display for MatchKey<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			MatchKey::Provider(provider) => write!(f, "provider `{provider}`"),
			MatchKey::DisplayName(name) => write!(f, "display name `{name}`"),
		}
	}
}

/// Returns the single direct child of `parent` matching `key`.
///
/// Only level-0 rows are considered, so a matching grandchild never shadows the new node. Zero
/// matches raise [`Error::ResolutionFailed`]; more than one raises [`Error::AmbiguousResolution`]
/// instead of guessing.
pub fn resolve_or_fail(parent: &str, children: &[NodeInfo], key: MatchKey) -> Result<NodeInfo> {
	let mut matches = children.iter().filter(|node| node.is_direct_child() && key.matches(node));
	let Some(first) = matches.next() else {
		return Err(Error::ResolutionFailed { parent: parent.to_owned(), key: key.to_string() });
	};
	let extra = matches.count();

	if extra > 0 {
		return Err(Error::AmbiguousResolution {
			parent: parent.to_owned(),
			key: key.to_string(),
			matches: extra + 1,
		});
	}

	Ok(first.clone())
}

/// Returns the first direct child of `parent` accepted by `predicate`.
///
/// `description` names the search in the [`Error::ResolutionFailed`] raised when nothing matches.
pub fn find_direct_child<P>(
	parent: &str,
	children: &[NodeInfo],
	description: &str,
	mut predicate: P,
) -> Result<NodeInfo>
where
	P: FnMut(&NodeInfo) -> bool,
{
	children
		.iter()
		.find(|node| node.is_direct_child() && predicate(node))
		.cloned()
		.ok_or_else(|| Error::ResolutionFailed {
			parent: parent.to_owned(),
			key: description.to_owned(),
		})
}
