//! Keyed list reconciliation: one [`DynamicRange`] per item, inside one root range.

use crate::{
	loggable,
	range::anonymous_name,
	render::{spawn_mutate_range, Render, Target},
	Dom, DynamicRange, Error,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span, warn};

/// How a [`RangeList`] keys and renders its values.
///
/// The methods are called while the list is being modified.
/// They must not access the same [`RangeList`] synchronously (return a [`Render::Thunk`] or [`Render::Deferred`] for that instead).
pub trait Renderer<D: Dom, T>: 'static {
	/// Identifies `value` across updates. Must stay stable for as long as `value` is in the list.
	///
	/// If two live items share a key, the first one wins all lookups.
	fn key(&self, value: &T) -> String;

	/// The initial content of a new item's range.
	fn render(&self, value: &T) -> Render<D>;

	/// Incrementally updates an item whose value changed without changing its key.
	/// The returned value is resolved into `range`, which keeps its position.
	///
	/// Returns [`None`] (the default) to delete the item's range and render `new` in its place instead.
	fn update(&self, range: &DynamicRange<D>, new: &T, old: &T) -> Option<Render<D>> {
		let _ = (range, new, old);
		None
	}

	/// Used to name the list's ranges. Random if [`None`].
	fn id(&self) -> Option<String> {
		None
	}
}

type UpdateFn<D, T> = Box<dyn Fn(&DynamicRange<D>, &T, &T) -> Render<D>>;

/// A [`Renderer`] assembled from closures.
pub struct FnRenderer<D: Dom, T> {
	key: Box<dyn Fn(&T) -> String>,
	render: Box<dyn Fn(&T) -> Render<D>>,
	update: Option<UpdateFn<D, T>>,
	id: Option<String>,
	_phantom: PhantomData<fn(T)>,
}

impl<D: Dom, T> FnRenderer<D, T> {
	pub fn new(key: impl Fn(&T) -> String + 'static, render: impl Fn(&T) -> Render<D> + 'static) -> Self {
		Self {
			key: Box::new(key),
			render: Box::new(render),
			update: None,
			id: None,
			_phantom: PhantomData,
		}
	}

	#[must_use]
	pub fn with_update(mut self, update: impl Fn(&DynamicRange<D>, &T, &T) -> Render<D> + 'static) -> Self {
		self.update = Some(Box::new(update));
		self
	}

	#[must_use]
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}
}

impl<D: Dom, T> Debug for FnRenderer<D, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnRenderer")
			.field("update", &self.update.is_some())
			.field("id", &self.id)
			.finish_non_exhaustive()
	}
}

impl<D: Dom, T: 'static> Renderer<D, T> for FnRenderer<D, T> {
	fn key(&self, value: &T) -> String {
		(self.key)(value)
	}

	fn render(&self, value: &T) -> Render<D> {
		(self.render)(value)
	}

	fn update(&self, range: &DynamicRange<D>, new: &T, old: &T) -> Option<Render<D>> {
		self.update.as_ref().map(|update| update(range, new, old))
	}

	fn id(&self) -> Option<String> {
		self.id.clone()
	}
}

struct Item<D: Dom, T> {
	key: String,
	value: T,
	range: DynamicRange<D>,
}

struct Shared<D: Dom, T, R> {
	dom: D,
	renderer: R,
	id: String,
	root: DynamicRange<D>,
	items: RefCell<Vec<Item<D, T>>>,
}

/// A keyed list of values, each rendered into its own [`DynamicRange`] inside a common root range.
///
/// Item ranges are owned by the list: They are deleted when their item is removed, replaced or [cleared](`RangeList::clear`).
/// Item content is resolved by detached tasks, so it may lag behind the list structure.
///
/// Clones refer to the same list. Calls must not overlap, which on one thread means not calling into a list from its [`Renderer`].
pub struct RangeList<D: Dom, T, R = FnRenderer<D, T>> {
	shared: Rc<Shared<D, T, R>>,
}

impl<D: Dom, T, R> Clone for RangeList<D, T, R> {
	fn clone(&self) -> Self {
		Self { shared: self.shared.clone() }
	}
}

impl<D: Dom, T, R> Debug for RangeList<D, T, R> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RangeList")
			.field("id", &self.shared.id)
			.field("root", &self.shared.root)
			.field("len", &self.shared.items.try_borrow().map(|items| items.len()).ok())
			.finish_non_exhaustive()
	}
}

impl<D: Dom, T: Clone + PartialEq + 'static, R: Renderer<D, T>> Shared<D, T, R> {
	/// Moves `range` (with its content) before `next`, or to the end of the list.
	fn place(&self, range: &DynamicRange<D>, next: Option<&D::Node>) -> Result<(), Error> {
		match range.detach()? {
			Some(fragment) => self.root.insert_before(&fragment, next),
			None => {
				trace!("Item range is detached, not placing it.");
				Ok(())
			}
		}
	}

	fn create(&self, key: String, value: T, next: Option<&D::Node>) -> Result<Item<D, T>, Error> {
		let range = DynamicRange::new(&self.dom, &format!("{}:{}", self.id, key));
		spawn_mutate_range(range.clone(), self.renderer.render(&value));
		self.place(&range, next)?;
		Ok(Item { key, value, range })
	}

	fn update(&self, item: &mut Item<D, T>, value: T) -> Result<(), Error> {
		if item.value != value {
			match self.renderer.update(&item.range, &value, &item.value) {
				Some(render) => {
					trace!("Updating item in place.");
					spawn_mutate_range(item.range.clone(), render);
				}
				None => {
					trace!("Re-rendering item.");
					let range = DynamicRange::new(&self.dom, &format!("{}:{}", self.id, item.key));
					spawn_mutate_range(range.clone(), self.renderer.render(&value));
					self.place(&range, Some(item.range.start()))?;
					item.range.delete()?;
					item.range = range;
				}
			}
		}
		item.value = value;
		Ok(())
	}

	fn position(items: &[Item<D, T>], key: &str) -> Option<usize> {
		items.iter().position(|item| item.key == key)
	}

	/// Inserts new items for `values` as one block, starting at `index`.
	fn insert_block(&self, items: &mut Vec<Item<D, T>>, index: usize, values: Vec<T>) -> Result<(), Error> {
		let next = items.get(index).map(|item| item.range.start().clone());
		for (offset, value) in values.into_iter().enumerate() {
			let key = self.renderer.key(&value);
			let span = trace_span!("insert item", index = index + offset, key = loggable(&key));
			let _enter = span.enter();
			let item = self.create(key, value, next.as_ref())?;
			items.insert(index + offset, item);
		}
		Ok(())
	}

	/// Drops `values` whose keys are already present or repeat earlier in `values`.
	fn unique(&self, items: &[Item<D, T>], values: Vec<T>) -> Vec<T> {
		let mut keys = items.iter().map(|item| item.key.clone()).collect::<HashSet<_>>();
		values.into_iter().filter(|value| keys.insert(self.renderer.key(value))).collect()
	}
}

impl<D: Dom, T: Clone + PartialEq + 'static, R: Renderer<D, T>> RangeList<D, T, R> {
	/// Creates a list with `initial` values. Its root range starts out in a fragment, see [`RangeList::render`].
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation while rendering `initial`.
	pub fn new(dom: &D, renderer: R, initial: Vec<T>) -> Result<Self, Error> {
		let id = renderer.id().unwrap_or_else(anonymous_name);
		let list = Self {
			shared: Rc::new(Shared {
				dom: dom.clone(),
				root: DynamicRange::new(dom, &id),
				renderer,
				id,
				items: RefCell::new(Vec::new()),
			}),
		};
		list.assign(initial)?;
		Ok(list)
	}

	#[must_use]
	pub fn id(&self) -> &str {
		&self.shared.id
	}

	/// The range bounding all items.
	#[must_use]
	pub fn root(&self) -> &DynamicRange<D> {
		&self.shared.root
	}

	/// A snapshot of the current values, in order.
	#[must_use]
	pub fn values(&self) -> Vec<T> {
		self.shared.items.borrow().iter().map(|item| item.value.clone()).collect()
	}

	#[must_use]
	pub fn keys(&self) -> Vec<String> {
		self.shared.items.borrow().iter().map(|item| item.key.clone()).collect()
	}

	/// The range currently rendering the first item with `key`.
	#[must_use]
	pub fn range(&self, key: &str) -> Option<DynamicRange<D>> {
		let items = self.shared.items.borrow();
		Shared::<D, T, R>::position(&items, key).map(|i| items[i].range.clone())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.shared.items.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Places the list where the returned value is resolved, moving it there if it was placed before.
	#[must_use]
	pub fn render(&self) -> Render<D> {
		let root = self.shared.root.clone();
		Render::thunk(move |_: &Target<D>| match root.detach() {
			Ok(fragment) => Render::from(fragment.map(Render::Node)),
			Err(error) => {
				error!("Failed to detach list root: {}", error);
				Render::Empty
			}
		})
	}

	/// Reconciles the list with `values` in one pass.
	///
	/// For each target index, the current items are scanned from that index onwards for the target's key.
	/// Matches keep their range (updated per [`Renderer::update`] if the value changed) and are moved into position if necessary.
	/// Misses get a new range. Items left over at the end are deleted.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation. The list may be partially reconciled in that case.
	#[instrument(skip(self, values), fields(list = %self.shared.id, count = values.len()))]
	pub fn assign(&self, values: Vec<T>) -> Result<(), Error> {
		let shared = &*self.shared;
		let mut items = shared.items.borrow_mut();
		let count = values.len();
		let mut seen = HashSet::with_capacity(count);

		for (i, value) in values.into_iter().enumerate() {
			let key = shared.renderer.key(&value);
			let span = trace_span!("assign item", i, key = loggable(&key));
			let _enter = span.enter();

			if !seen.insert(key.clone()) {
				warn!("Duplicate key {:?} in assigned values. Lookups will only find the first item.", loggable(&key));
			}

			match items[i..].iter().position(|item| item.key == key) {
				Some(0) => shared.update(&mut items[i], value)?,
				Some(offset) => {
					trace!(from = i + offset, "Relocating item.");
					let item = items.remove(i + offset);
					items.insert(i, item);
					shared.update(&mut items[i], value)?;
					let next = items.get(i + 1).map(|next| next.range.start().clone());
					shared.place(&items[i].range, next.as_ref())?;
				}
				None => {
					trace!("Creating item.");
					let next = items.get(i).map(|next| next.range.start().clone());
					let item = shared.create(key, value, next.as_ref())?;
					items.insert(i, item);
				}
			}
		}

		if items.len() > count {
			trace!(count = items.len() - count, "Deleting surplus items.");
			for item in items.drain(count..) {
				item.range.delete()?;
			}
		}
		Ok(())
	}

	/// Inserts `values` as a block after the first item keyed `after`, or at the end.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	#[instrument(skip(self, values, after), fields(list = %self.shared.id, count = values.len()))]
	pub fn append(&self, values: Vec<T>, after: Option<&str>) -> Result<(), Error> {
		let mut items = self.shared.items.borrow_mut();
		let index = after.and_then(|after| Shared::<D, T, R>::position(&items, after)).map_or(items.len(), |i| i + 1);
		self.shared.insert_block(&mut items, index, values)
	}

	/// Inserts `values` as a block before the first item keyed `before`, or at the start.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	#[instrument(skip(self, values, before), fields(list = %self.shared.id, count = values.len()))]
	pub fn prepend(&self, values: Vec<T>, before: Option<&str>) -> Result<(), Error> {
		let mut items = self.shared.items.borrow_mut();
		let index = before.and_then(|before| Shared::<D, T, R>::position(&items, before)).unwrap_or(0);
		self.shared.insert_block(&mut items, index, values)
	}

	/// [`RangeList::append`] without values whose keys are already present.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	pub fn append_unique(&self, values: Vec<T>, after: Option<&str>) -> Result<(), Error> {
		let values = self.shared.unique(&self.shared.items.borrow(), values);
		self.append(values, after)
	}

	/// [`RangeList::prepend`] without values whose keys are already present.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	pub fn prepend_unique(&self, values: Vec<T>, before: Option<&str>) -> Result<(), Error> {
		let values = self.shared.unique(&self.shared.items.borrow(), values);
		self.prepend(values, before)
	}

	/// Removes the first item for each of `keys`. Missing keys are ignored.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	#[instrument(skip(self, keys), fields(list = %self.shared.id, count = keys.len()))]
	pub fn remove<K: AsRef<str>>(&self, keys: &[K]) -> Result<(), Error> {
		let mut items = self.shared.items.borrow_mut();
		for key in keys {
			let key = key.as_ref();
			match Shared::<D, T, R>::position(&items, key) {
				Some(i) => items.remove(i).range.delete()?,
				None => trace!(key = loggable(key), "Ignoring removal of missing key."),
			}
		}
		Ok(())
	}

	/// Removes all items at once by clearing the root range, which stays in place.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	#[instrument(skip(self), fields(list = %self.shared.id))]
	pub fn clear(&self) -> Result<(), Error> {
		self.shared.items.borrow_mut().clear();
		self.shared.root.clear()
	}
}

impl<D: Dom, T: Clone + PartialEq + 'static, R: Renderer<D, T>> From<RangeList<D, T, R>> for Render<D> {
	fn from(list: RangeList<D, T, R>) -> Self {
		list.render()
	}
}
