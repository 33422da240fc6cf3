//! Marker-bounded ranges of sibling nodes.

use crate::{Dom, Error};
use core::{
	cell::Cell,
	fmt::{self, Debug, Formatter},
	hash::{BuildHasher, Hasher},
};
use hashbrown::hash_map::DefaultHashBuilder;
use tracing::{error, instrument, trace};

/// A mutable window over the siblings between two persistent marker nodes.
///
/// The markers stay siblings and are only ever removed together, by [`DynamicRange::delete`], [`DynamicRange::replace`]
/// or (temporarily) [`DynamicRange::detach`]. Everything strictly between them is the range's content.
///
/// Clones refer to the same markers and compare equal.
///
/// # Leaks
///
/// Dropping the last handle doesn't remove anything from the tree.
/// Whoever places a range is responsible for [deleting](`DynamicRange::delete`) it.
///
/// # Detached ranges
///
/// Once the markers have no parent, all mutations succeed without effect and all projections are empty.
#[derive(Clone)]
pub struct DynamicRange<D: Dom> {
	dom: D,
	start: D::Node,
	end: D::Node,
}

impl<D: Dom> PartialEq for DynamicRange<D> {
	fn eq(&self, other: &Self) -> bool {
		self.start == other.start && self.end == other.end
	}
}

impl<D: Dom> Debug for DynamicRange<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("DynamicRange").field("start", &self.start).field("end", &self.end).finish()
	}
}

thread_local! {
	static ANONYMOUS_COUNTER: Cell<u64> = Cell::new(0);
}

/// A fresh pseudo-random identifier.
pub(crate) fn anonymous_name() -> String {
	let n = ANONYMOUS_COUNTER.with(|counter| {
		let n = counter.get();
		counter.set(n.wrapping_add(1));
		n
	});
	let mut hasher = DefaultHashBuilder::default().build_hasher();
	hasher.write_u64(n);
	format!("{:016x}", hasher.finish())
}

impl<D: Dom> DynamicRange<D> {
	/// Creates an empty range with markers labelled `name` and `/name`.
	///
	/// The markers start out in a fresh fragment, which [`DynamicRange::detach`] returns for placement.
	/// Content can be added before that.
	#[must_use]
	pub fn new(dom: &D, name: &str) -> Self {
		let start = dom.create_marker(name);
		let end = dom.create_marker(&format!("/{}", name));
		let fragment = dom.create_fragment();
		for marker in [&start, &end] {
			if let Err(error) = dom.append_child(&fragment, marker) {
				error!("Failed to place range marker into fresh fragment: {}", error);
			}
		}
		Self { dom: dom.clone(), start, end }
	}

	/// [`DynamicRange::new`] with a random name.
	#[must_use]
	pub fn anonymous(dom: &D) -> Self {
		Self::new(dom, &anonymous_name())
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn start(&self) -> &D::Node {
		&self.start
	}

	#[must_use]
	pub fn end(&self) -> &D::Node {
		&self.end
	}

	#[must_use]
	pub fn parent_node(&self) -> Option<D::Node> {
		self.dom.parent(&self.start)
	}

	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.dom.is_connected(&self.start)
	}

	/// [`None`] iff the range is empty or detached.
	#[must_use]
	pub fn first_child(&self) -> Option<D::Node> {
		self.parent_node()?;
		self.dom.next_sibling(&self.start).filter(|next| *next != self.end)
	}

	/// The content nodes, in tree order.
	#[must_use]
	pub fn child_nodes(&self) -> Vec<D::Node> {
		let mut nodes = Vec::new();
		let mut next = self.first_child();
		while let Some(node) = next {
			next = self.dom.next_sibling(&node).filter(|next| *next != self.end);
			nodes.push(node);
		}
		nodes
	}

	/// Whether `node` is a content node of this range.
	#[must_use]
	pub fn contains(&self, node: &D::Node) -> bool {
		match self.parent_node() {
			Some(parent) if self.dom.parent(node).as_ref() == Some(&parent) => (),
			_ => return false,
		}
		let mut next = self.first_child();
		while let Some(current) = next {
			if current == *node {
				return true;
			}
			next = self.dom.next_sibling(&current).filter(|next| *next != self.end);
		}
		false
	}

	/// Inserts `node` before `reference`, which must be a content node of this range or its end marker.
	/// Without `reference`, `node` is appended to the range's content.
	///
	/// Insertions relative to nodes outside the range are ignored.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects the insertion.
	#[instrument(skip(node, reference))]
	pub fn insert_before(&self, node: &D::Node, reference: Option<&D::Node>) -> Result<(), Error> {
		let parent = match self.parent_node() {
			Some(parent) => parent,
			None => {
				trace!("Ignoring insertion into detached range.");
				return Ok(());
			}
		};
		let reference = match reference {
			None => &self.end,
			Some(reference) if *reference == self.end || self.contains(reference) => reference,
			Some(reference) => {
				trace!(?reference, "Ignoring insertion before node outside of the range.");
				return Ok(());
			}
		};
		self.dom.insert_before(&parent, node, Some(reference))
	}

	/// # Errors
	///
	/// Iff the [`Dom`] rejects the insertion.
	pub fn append_child(&self, node: &D::Node) -> Result<(), Error> {
		self.insert_before(node, None)
	}

	/// Removes all content nodes in one [`Dom::clear_between`] call, keeping the markers.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects the removal.
	#[instrument]
	pub fn clear(&self) -> Result<(), Error> {
		match self.parent_node() {
			Some(parent) => self.dom.clear_between(&parent, &self.start, &self.end),
			None => Ok(()),
		}
	}

	/// Moves the markers and everything between them into a new fragment, which is returned.
	///
	/// Inserting the fragment somewhere places the range there, with its content intact.
	///
	/// Returns [`None`] iff the range has no parent.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects a move.
	#[instrument]
	pub fn detach(&self) -> Result<Option<D::Node>, Error> {
		if self.parent_node().is_none() {
			return Ok(None);
		}
		let fragment = self.dom.create_fragment();
		let mut nodes = Vec::with_capacity(2);
		nodes.push(self.start.clone());
		nodes.extend(self.child_nodes());
		nodes.push(self.end.clone());
		for node in &nodes {
			self.dom.append_child(&fragment, node)?;
		}
		Ok(Some(fragment))
	}

	/// Collapses the range into `node`: The content and start marker are removed, the end marker is replaced.
	///
	/// The range is unusable afterwards.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects a removal or the insertion.
	#[instrument(skip(node))]
	pub fn replace(&self, node: &D::Node) -> Result<(), Error> {
		let parent = match self.parent_node() {
			Some(parent) => parent,
			None => return Ok(()),
		};
		self.clear()?;
		self.dom.remove_child(&parent, &self.start)?;
		self.dom.insert_before(&parent, node, Some(&self.end))?;
		self.dom.remove_child(&parent, &self.end)
	}

	/// Removes the content and both markers.
	///
	/// The range is unusable afterwards. Deleting it again does nothing.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects a removal.
	#[instrument]
	pub fn delete(&self) -> Result<(), Error> {
		let parent = match self.parent_node() {
			Some(parent) => parent,
			None => return Ok(()),
		};
		self.clear()?;
		self.dom.remove_child(&parent, &self.start)?;
		self.dom.remove_child(&parent, &self.end)
	}
}
