//! An in-memory [`Dom`] for native targets and tests.

use crate::{Dom, Error};
use core::{cell::RefCell, fmt::Write as _};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use tracing::trace;

/// Handle to a node in a [`MemoryDom`]. Only meaningful for the [`MemoryDom`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Document,
	Element(String),
	Text(String),
	Comment(String),
	Fragment,
}

#[derive(Debug)]
struct NodeData {
	kind: NodeKind,
	parent: Option<usize>,
	children: Vec<usize>,
}

/// A shared arena of nodes with a single document root.
///
/// Nodes are never freed; removed nodes simply become parentless.
///
/// [`Dom::spawn`] forwards to [`tokio::task::spawn_local`], so tasks can only be spawned from within a [`tokio::task::LocalSet`].
#[derive(Debug, Clone)]
pub struct MemoryDom {
	nodes: Rc<RefCell<Vec<NodeData>>>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	const DOCUMENT: usize = 0;

	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: Rc::new(RefCell::new(vec![NodeData {
				kind: NodeKind::Document,
				parent: None,
				children: Vec::new(),
			}])),
		}
	}

	/// The root node. Nodes below it are [connected](`Dom::is_connected`).
	#[must_use]
	pub fn document(&self) -> NodeId {
		NodeId(Self::DOCUMENT)
	}

	fn create(&self, kind: NodeKind) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		NodeId(nodes.len() - 1)
	}

	/// # Panics
	///
	/// Iff `node` was created by another [`MemoryDom`].
	#[must_use]
	pub fn kind(&self, node: NodeId) -> NodeKind {
		self.nodes.borrow()[node.0].kind.clone()
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.nodes.borrow()[node.0].children.iter().copied().map(NodeId).collect()
	}

	/// Concatenated text of all text nodes below `node`. Comments are skipped.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		fn collect(nodes: &[NodeData], i: usize, out: &mut String) {
			match &nodes[i].kind {
				NodeKind::Text(text) => out.push_str(text),
				NodeKind::Comment(_) => (),
				NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment => {
					for &child in &nodes[i].children {
						collect(nodes, child, out)
					}
				}
			}
		}

		let mut out = String::new();
		collect(&self.nodes.borrow(), node.0, &mut out);
		out
	}

	/// Serializes `node` and its descendants. Markers show up as `<!--…-->`, text is not escaped.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		fn write(nodes: &[NodeData], i: usize, out: &mut String) {
			let children = |out: &mut String| {
				for &child in &nodes[i].children {
					write(nodes, child, out)
				}
			};
			match &nodes[i].kind {
				NodeKind::Text(text) => out.push_str(text),
				NodeKind::Comment(comment) => {
					let _ = write!(out, "<!--{}-->", comment);
				}
				NodeKind::Element(tag) => {
					let _ = write!(out, "<{}>", tag);
					children(out);
					let _ = write!(out, "</{}>", tag);
				}
				NodeKind::Document | NodeKind::Fragment => children(out),
			}
		}

		let mut out = String::new();
		write(&self.nodes.borrow(), node.0, &mut out);
		out
	}

	fn is_inclusive_ancestor(nodes: &[NodeData], ancestor: usize, mut node: usize) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match nodes[node].parent {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn unlink(nodes: &mut [NodeData], node: usize) {
		if let Some(parent) = nodes[node].parent.take() {
			nodes[parent].children.retain(|&child| child != node);
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn create_element(&self, tag: &str) -> Result<NodeId, Error> {
		if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
			return Err(Error::InvalidRenderable(format!("invalid tag name {:?}", tag)));
		}
		Ok(self.create(NodeKind::Element(tag.to_owned())))
	}

	fn create_text(&self, text: &str) -> NodeId {
		self.create(NodeKind::Text(text.to_owned()))
	}

	fn create_marker(&self, label: &str) -> NodeId {
		self.create(NodeKind::Comment(label.to_owned()))
	}

	fn create_fragment(&self) -> NodeId {
		self.create(NodeKind::Fragment)
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].parent.map(NodeId)
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes.borrow()[node.0].children.first().copied().map(NodeId)
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		let parent = nodes[node.0].parent?;
		let siblings = &nodes[parent].children;
		let index = siblings.iter().position(|&sibling| sibling == node.0)?;
		siblings.get(index + 1).copied().map(NodeId)
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) -> Result<(), Error> {
		let mut nodes = self.nodes.borrow_mut();
		match nodes[parent.0].kind {
			NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment => (),
			NodeKind::Text(_) | NodeKind::Comment(_) => return Err(Error::HierarchyRequest),
		}
		if let Some(reference) = reference {
			if nodes[reference.0].parent != Some(parent.0) {
				return Err(Error::NotFound);
			}
			if reference == node {
				return Ok(());
			}
		}

		let moved = match nodes[node.0].kind {
			NodeKind::Document => return Err(Error::HierarchyRequest),
			NodeKind::Fragment => {
				let children = nodes[node.0].children.clone();
				if children.iter().any(|&child| Self::is_inclusive_ancestor(&nodes, child, parent.0)) {
					return Err(Error::HierarchyRequest);
				}
				children
			}
			NodeKind::Element(_) | NodeKind::Text(_) | NodeKind::Comment(_) => {
				if Self::is_inclusive_ancestor(&nodes, node.0, parent.0) {
					return Err(Error::HierarchyRequest);
				}
				vec![node.0]
			}
		};
		if node.0 == parent.0 {
			return Err(Error::HierarchyRequest);
		}

		for &child in &moved {
			Self::unlink(&mut nodes, child);
		}
		let index = match reference {
			Some(reference) => nodes[parent.0].children.iter().position(|&child| child == reference.0).ok_or(Error::NotFound)?,
			None => nodes[parent.0].children.len(),
		};
		for &child in &moved {
			nodes[child].parent = Some(parent.0);
		}
		nodes[parent.0].children.splice(index..index, moved);
		Ok(())
	}

	fn remove_child(&self, parent: &NodeId, node: &NodeId) -> Result<(), Error> {
		let mut nodes = self.nodes.borrow_mut();
		if nodes[node.0].parent != Some(parent.0) {
			return Err(Error::NotFound);
		}
		Self::unlink(&mut nodes, node.0);
		Ok(())
	}

	fn clear_between(&self, parent: &NodeId, start: &NodeId, end: &NodeId) -> Result<(), Error> {
		let mut nodes = self.nodes.borrow_mut();
		let (first, last) = {
			let children = &nodes[parent.0].children;
			let position = |node: &NodeId| children.iter().position(|&child| child == node.0).ok_or(Error::NotFound);
			(position(start)?, position(end)?)
		};
		if last <= first {
			return Err(Error::NotFound);
		}
		let removed = nodes[parent.0].children.drain(first + 1..last).collect::<Vec<_>>();
		trace!(count = removed.len(), "Cleared between markers.");
		for child in removed {
			nodes[child].parent = None;
		}
		Ok(())
	}

	fn set_text_content(&self, node: &NodeId, text: &str) {
		let mut nodes = self.nodes.borrow_mut();
		match &mut nodes[node.0].kind {
			NodeKind::Text(data) | NodeKind::Comment(data) => {
				text.clone_into(data);
				return;
			}
			NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment => (),
		}

		for child in core::mem::take(&mut nodes[node.0].children) {
			nodes[child].parent = None;
		}
		if !text.is_empty() {
			nodes.push(NodeData {
				kind: NodeKind::Text(text.to_owned()),
				parent: Some(node.0),
				children: Vec::new(),
			});
			let text_node = nodes.len() - 1;
			nodes[node.0].children.push(text_node);
		}
	}

	fn is_connected(&self, node: &NodeId) -> bool {
		Self::is_inclusive_ancestor(&self.nodes.borrow(), Self::DOCUMENT, node.0)
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		trace!("Spawning local task.");
		drop(tokio::task::spawn_local(task));
	}
}
