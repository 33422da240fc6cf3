//! The browser [`Dom`], and conversion of arbitrary [`JsValue`]s into renderables.

use crate::{Dom, Error, Render, Target};
use futures_util::{
	future::LocalBoxFuture,
	stream::{self, StreamExt as _},
};
use js_sys::{Function, Promise, Reflect, Symbol};
use tracing::{error, trace};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, DomException, Node};

/// A [`Dom`] over a browser [`Document`]. Tasks are spawned with [`wasm_bindgen_futures::spawn_local`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDom {
	document: Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// The current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window or it has no document, for example in a worker.
	pub fn from_window() -> Result<Self, Error> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| Error::Js("no window document available".to_owned()))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn js_error(value: JsValue) -> Error {
	match value.dyn_ref::<DomException>().map(DomException::name).as_deref() {
		Some("HierarchyRequestError") => Error::HierarchyRequest,
		Some("NotFoundError") => Error::NotFound,
		_ => Error::Js(format!("{:?}", value)),
	}
}

impl Dom for WebDom {
	type Node = Node;

	fn create_element(&self, tag: &str) -> Result<Node, Error> {
		self.document.create_element(tag).map(Into::into).map_err(js_error)
	}

	fn create_text(&self, text: &str) -> Node {
		self.document.create_text_node(text).into()
	}

	fn create_marker(&self, label: &str) -> Node {
		self.document.create_comment(label).into()
	}

	fn create_fragment(&self) -> Node {
		self.document.create_document_fragment().into()
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) -> Result<(), Error> {
		parent.insert_before(node, reference).map(drop).map_err(js_error)
	}

	fn remove_child(&self, parent: &Node, node: &Node) -> Result<(), Error> {
		parent.remove_child(node).map(drop).map_err(js_error)
	}

	fn clear_between(&self, parent: &Node, start: &Node, end: &Node) -> Result<(), Error> {
		if start.parent_node().as_ref() != Some(parent) || end.parent_node().as_ref() != Some(parent) {
			return Err(Error::NotFound);
		}
		if start.compare_document_position(end) & Node::DOCUMENT_POSITION_FOLLOWING == 0 {
			return Err(Error::NotFound);
		}
		let range = self.document.create_range().map_err(js_error)?;
		range.set_start_after(start).map_err(js_error)?;
		range.set_end_before(end).map_err(js_error)?;
		range.delete_contents().map_err(js_error)
	}

	fn set_text_content(&self, node: &Node, text: &str) {
		node.set_text_content(Some(text));
	}

	fn is_connected(&self, node: &Node) -> bool {
		node.is_connected()
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		trace!("Spawning local task.");
		wasm_bindgen_futures::spawn_local(task);
	}
}

fn describe(value: &JsValue) -> String {
	if cfg!(feature = "dangerous-logging") {
		format!("{:?}", value)
	} else {
		value.js_typeof().as_string().unwrap_or_default()
	}
}

fn method(value: &JsValue, key: &JsValue) -> Option<Function> {
	Reflect::get(value, key).ok()?.dyn_into::<Function>().ok()
}

/// Resolves an async iterator's items one by one. Rejections end the stream.
fn async_iterator(iterator: JsValue) -> Render<WebDom> {
	Render::Stream(
		stream::unfold(iterator, |iterator| async move {
			let next = match method(&iterator, &"next".into()).map(|next| next.call0(&iterator)) {
				Some(Ok(next)) => next,
				Some(Err(error)) => {
					error!("Async iterator `next` threw: {}", describe(&error));
					return None;
				}
				None => {
					error!("Async iterator has no `next` method.");
					return None;
				}
			};
			let result = match JsFuture::from(Promise::resolve(&next)).await {
				Ok(result) => result,
				Err(error) => {
					error!("Async iterator rejected: {}", describe(&error));
					return None;
				}
			};
			if Reflect::get(&result, &"done".into()).map_or(true, |done| done.is_truthy()) {
				trace!("Async iterator is done.");
				return None;
			}
			let value = Reflect::get(&result, &"value".into()).unwrap_or(JsValue::UNDEFINED);
			Some((Render::from(value), iterator))
		})
		.boxed_local(),
	)
}

/// Converts in this order, the first match winning:
///
/// 1. `undefined`, `null` and booleans render nothing.
/// 2. [`Node`]s.
/// 3. Strings and numbers, as text.
/// 4. Iterables (like arrays), item by item. The iterator is advanced lazily, after the previous item is resolved.
/// 5. Async iterables, item by item as they arrive.
/// 6. Thenables (like promises), once they settle. Rejections are logged and render nothing.
/// 7. Functions, called with the target node as `this` and only argument.
///
/// Anything else is [unrecognized](`Render::Unrecognized`).
///
/// # Functions rendering into ranges
///
/// JavaScript has no handle for a [`DynamicRange`](`crate::DynamicRange`), so a function resolved into a range receives
/// the range's **parent node** (or `undefined` while the range is detached), not the range itself.
/// Anything it does to that node affects the range's siblings too. In particular, a function that removes its
/// argument once it's no longer needed removes the whole parent.
/// Use [`Producer::while_connected`](`crate::producer::Producer::while_connected`) on the Rust side to end content with its range instead.
impl From<JsValue> for Render<WebDom> {
	fn from(value: JsValue) -> Self {
		if value.is_undefined() || value.is_null() || value.as_bool().is_some() {
			return Render::Empty;
		}
		if let Some(node) = value.dyn_ref::<Node>() {
			return Render::Node(node.clone());
		}
		if let Some(text) = value.as_string() {
			return Render::Text(text);
		}
		if let Some(number) = value.as_f64() {
			return Render::Text(number.to_string());
		}

		match js_sys::try_iter(&value) {
			Ok(Some(items)) => {
				// Advanced only once the previous item is resolved.
				let items = items.map_while(|item| match item {
					Ok(item) => Some(Render::from(item)),
					Err(error) => {
						error!("Iteration threw: {}", describe(&error));
						None
					}
				});
				return Render::Stream(stream::iter(items).boxed_local());
			}
			Ok(None) => (),
			Err(error) => {
				error!("Iterator protocol failed: {}", describe(&error));
				return Render::Empty;
			}
		}

		if let Some(async_iterator_method) = method(&value, &Symbol::async_iterator().into()) {
			return match async_iterator_method.call0(&value) {
				Ok(iterator) => async_iterator(iterator),
				Err(error) => {
					error!("`Symbol.asyncIterator` threw: {}", describe(&error));
					Render::Empty
				}
			};
		}

		if method(&value, &"then".into()).is_some() {
			let promise = Promise::resolve(&value);
			return Render::deferred(async move {
				match JsFuture::from(promise).await {
					Ok(value) => Render::from(value),
					Err(error) => {
						error!("Renderable promise rejected: {}", describe(&error));
						Render::Empty
					}
				}
			});
		}

		if let Some(function) = value.dyn_ref::<Function>() {
			let function = function.clone();
			return Render::thunk(move |target: &Target<WebDom>| {
				let this: JsValue = match target {
					Target::Node(_, node) => node.clone().into(),
					Target::Range(range) => range.parent_node().map_or(JsValue::UNDEFINED, Into::into),
				};
				match function.call1(&this, &this) {
					Ok(value) => Render::from(value),
					Err(error) => {
						error!("Renderable function threw: {}", describe(&error));
						Render::Empty
					}
				}
			});
		}

		Render::Unrecognized(describe(&value))
	}
}
