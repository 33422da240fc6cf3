use core::fmt::{self, Display, Formatter};

/// Failures reported by [`Dom`](`crate::Dom`) backends and the value resolvers.
///
/// Only the structural variants ever reach a caller through an awaited entry point like [`mount`](`crate::render::mount`).
/// Invalid input is logged where it is found and doesn't abort sibling branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The node can't be inserted at the requested position, for example below itself or below a text node.
	HierarchyRequest,
	/// A reference or removed node is not a child of the expected parent.
	NotFound,
	/// The browser rejected the operation. Contains the debug representation of the thrown value.
	Js(String),
	/// A value that isn't renderable reached the value resolver.
	InvalidRenderable(String),
	/// A value that isn't a list action reached the action interpreter.
	InvalidAction(String),
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Error::HierarchyRequest => f.write_str("the node can't be inserted at this position in the tree"),
			Error::NotFound => f.write_str("the node is not a child of the expected parent"),
			Error::Js(value) => write!(f, "DOM operation failed: {}", value),
			Error::InvalidRenderable(description) => write!(f, "invalid renderable: {}", description),
			Error::InvalidAction(description) => write!(f, "invalid list action: {}", description),
		}
	}
}

impl std::error::Error for Error {}
