//! The ordered-tree capability everything else in this crate is written against.

use crate::Error;
use core::fmt::Debug;
use futures_util::future::LocalBoxFuture;

/// A mutable ordered tree of nodes, plus a way to run detached local tasks.
///
/// Node handles are cheap to clone and compare by identity.
/// Operations follow [***Node***](https://developer.mozilla.org/en-US/docs/Web/API/Node) semantics:
///
/// - Inserting a node that already has a parent moves it.
/// - Inserting a fragment moves its children (in order) instead, leaving the fragment empty.
///
/// Implementations: [`MemoryDom`](`crate::memory::MemoryDom`) and [`WebDom`](`crate::web::WebDom`).
pub trait Dom: Clone + Debug + 'static {
	type Node: Clone + PartialEq + Debug + 'static;

	/// # Errors
	///
	/// Iff the tag name is rejected.
	fn create_element(&self, tag: &str) -> Result<Self::Node, Error>;
	fn create_text(&self, text: &str) -> Self::Node;
	/// Creates a comment-like node that renders as nothing.
	fn create_marker(&self, label: &str) -> Self::Node;
	fn create_fragment(&self) -> Self::Node;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts `node` into `parent` before `reference`, or at the end if `reference` is [`None`].
	///
	/// # Errors
	///
	/// [`Error::NotFound`] if `reference` isn't a child of `parent`,
	/// [`Error::HierarchyRequest`] if `node` can't be placed there.
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Error>;

	/// # Errors
	///
	/// [`Error::NotFound`] if `node` isn't a child of `parent`.
	fn remove_child(&self, parent: &Self::Node, node: &Self::Node) -> Result<(), Error>;

	/// Replaces all content of `node` with `text`.
	fn set_text_content(&self, node: &Self::Node, text: &str);

	/// Removes all siblings strictly between `start` and `end`, as one bulk operation where the implementation allows it.
	///
	/// # Errors
	///
	/// [`Error::NotFound`] if `start` or `end` isn't a child of `parent`, or `end` doesn't follow `start`.
	fn clear_between(&self, parent: &Self::Node, start: &Self::Node, end: &Self::Node) -> Result<(), Error> {
		if self.parent(start).as_ref() != Some(parent) {
			return Err(Error::NotFound);
		}
		let mut next = self.next_sibling(start);
		while let Some(node) = next {
			if node == *end {
				return Ok(());
			}
			next = self.next_sibling(&node);
			self.remove_child(parent, &node)?;
		}
		Err(Error::NotFound)
	}

	/// Whether `node` is part of the live document.
	fn is_connected(&self, node: &Self::Node) -> bool;

	/// Launches a detached task on the current thread.
	///
	/// The task is responsible for reporting its own failures.
	fn spawn(&self, task: LocalBoxFuture<'static, ()>);

	/// # Errors
	///
	/// See [`Dom::insert_before`].
	fn append_child(&self, parent: &Self::Node, node: &Self::Node) -> Result<(), Error> {
		self.insert_before(parent, node, None)
	}
}
