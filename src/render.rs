//! Renderable values and the resolver that materializes them into nodes and ranges.

use crate::{range::anonymous_name, Dom, DynamicRange, Error};
use core::{
	fmt::{self, Debug, Formatter},
	future::Future,
};
use futures_util::{
	future::{FutureExt as _, LocalBoxFuture},
	stream::{LocalBoxStream, Stream, StreamExt as _},
};
use tracing::{error, instrument, trace, trace_span, Instrument as _};

/// Anything the resolver can put into a [`Target`].
///
/// Resolution order is the variant order: Each value is exactly one of these, so no shape can shadow another.
pub enum Render<D: Dom> {
	/// Renders nothing. Absent values and booleans convert into this, for conditional content.
	Empty,
	/// Appended to the end of the target.
	Node(D::Node),
	/// Replaces the target's entire text content.
	Text(String),
	/// Resolved one after another, each completely before the next.
	Sequence(Vec<Render<D>>),
	/// Each item is resolved before the next one is requested.
	///
	/// The stream is never cancelled by the resolver and should end itself, see [`Producer`](`crate::producer::Producer`).
	Stream(LocalBoxStream<'static, Render<D>>),
	/// Resolved once it completes.
	Deferred(LocalBoxFuture<'static, Render<D>>),
	/// Called with the target it renders into. The return value is resolved in turn.
	Thunk(Box<dyn FnOnce(&Target<D>) -> Render<D>>),
	/// A foreign value that didn't convert into any of the above, with a description for diagnostics.
	Unrecognized(String),
}

impl<D: Dom> Render<D> {
	#[must_use]
	pub fn node(node: D::Node) -> Self {
		Self::Node(node)
	}

	pub fn sequence<I: Into<Self>>(items: impl IntoIterator<Item = I>) -> Self {
		Self::Sequence(items.into_iter().map(|item| -> Self { item.into() }).collect())
	}

	pub fn stream<I: Into<Self>>(stream: impl Stream<Item = I> + 'static) -> Self {
		Self::Stream(stream.map(|item| -> Self { item.into() }).boxed_local())
	}

	pub fn deferred<I: Into<Self>>(future: impl Future<Output = I> + 'static) -> Self {
		Self::Deferred(future.map(|value| -> Self { value.into() }).boxed_local())
	}

	pub fn thunk<I: Into<Self>>(f: impl FnOnce(&Target<D>) -> I + 'static) -> Self {
		Self::Thunk(Box::new(move |target| f(target).into()))
	}
}

impl<D: Dom> Debug for Render<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Render::Empty => f.write_str("Empty"),
			Render::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Render::Text(text) => {
				if cfg!(feature = "dangerous-logging") {
					f.debug_tuple("Text").field(text).finish()
				} else {
					write!(f, "Text(<{} bytes>)", text.len())
				}
			}
			Render::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
			Render::Stream(_) => f.write_str("Stream(..)"),
			Render::Deferred(_) => f.write_str("Deferred(..)"),
			Render::Thunk(_) => f.write_str("Thunk(..)"),
			Render::Unrecognized(description) => f.debug_tuple("Unrecognized").field(description).finish(),
		}
	}
}

impl<D: Dom> From<()> for Render<D> {
	fn from((): ()) -> Self {
		Self::Empty
	}
}

impl<D: Dom> From<bool> for Render<D> {
	fn from(_: bool) -> Self {
		Self::Empty
	}
}

impl<D: Dom> From<&str> for Render<D> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<D: Dom> From<String> for Render<D> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

macro_rules! render_display {
	($($ty:ty),*$(,)?) => {$(
		impl<D: Dom> From<$ty> for Render<D> {
			fn from(value: $ty) -> Self {
				Self::Text(value.to_string())
			}
		}
	)*};
}
render_display!(char, i32, i64, u32, u64, usize, f64);

impl<D: Dom, I: Into<Render<D>>> From<Option<I>> for Render<D> {
	fn from(value: Option<I>) -> Self {
		value.map_or(Self::Empty, Into::into)
	}
}

impl<D: Dom, I: Into<Render<D>>> From<Vec<I>> for Render<D> {
	fn from(items: Vec<I>) -> Self {
		Self::sequence(items)
	}
}

/// Where a [`Render`] is materialized.
#[derive(Debug, Clone)]
pub enum Target<D: Dom> {
	/// A plain node. Text replaces its content, nodes are appended to it.
	Node(D, D::Node),
	/// Text clears the range first, nodes are appended to the range's content.
	Range(DynamicRange<D>),
}

impl<D: Dom> Target<D> {
	#[must_use]
	pub fn dom(&self) -> &D {
		match self {
			Target::Node(dom, _) => dom,
			Target::Range(range) => range.dom(),
		}
	}

	#[must_use]
	pub fn is_connected(&self) -> bool {
		match self {
			Target::Node(dom, node) => dom.is_connected(node),
			Target::Range(range) => range.is_connected(),
		}
	}

	/// # Errors
	///
	/// Iff the [`Dom`] rejects the insertion.
	pub fn append_child(&self, node: &D::Node) -> Result<(), Error> {
		match self {
			Target::Node(dom, parent) => dom.append_child(parent, node),
			Target::Range(range) => range.append_child(node),
		}
	}

	/// # Errors
	///
	/// Iff the [`Dom`] rejects clearing the range or the insertion.
	pub fn set_text(&self, text: &str) -> Result<(), Error> {
		match self {
			Target::Node(dom, node) => {
				dom.set_text_content(node, text);
				Ok(())
			}
			Target::Range(range) => {
				range.clear()?;
				range.append_child(&range.dom().create_text(text))
			}
		}
	}
}

/// Resolves `value` into `target` completely.
///
/// Unrecognized values are logged and skipped without affecting siblings.
///
/// # Errors
///
/// Iff the [`Dom`] rejects an operation. Resolution stops at that point.
pub fn resolve<D: Dom>(target: Target<D>, value: Render<D>) -> LocalBoxFuture<'static, Result<(), Error>> {
	async move {
		match value {
			Render::Empty => Ok(()),
			Render::Node(node) => target.append_child(&node),
			Render::Text(text) => target.set_text(&text),
			Render::Sequence(items) => {
				for item in items {
					resolve(target.clone(), item).await?;
				}
				Ok(())
			}
			Render::Stream(mut stream) => {
				while let Some(item) = stream.next().await {
					resolve(target.clone(), item).await?;
				}
				trace!("Stream ended.");
				Ok(())
			}
			Render::Deferred(future) => {
				let value = future.await;
				resolve(target, value).await
			}
			Render::Thunk(f) => {
				let value = f(&target);
				resolve(target, value).await
			}
			Render::Unrecognized(description) => {
				error!("{}", Error::InvalidRenderable(description));
				Ok(())
			}
		}
	}
	.boxed_local()
}

/// Resolves `value` into the content of `node`. See [`resolve`].
///
/// # Errors
///
/// Iff the [`Dom`] rejects an operation.
pub fn mutate<D: Dom>(dom: &D, node: D::Node, value: impl Into<Render<D>>) -> LocalBoxFuture<'static, Result<(), Error>> {
	resolve(Target::Node(dom.clone(), node), value.into())
}

/// Resolves `value` into `range`. See [`resolve`].
///
/// # Errors
///
/// Iff the [`Dom`] rejects an operation.
pub fn mutate_range<D: Dom>(range: DynamicRange<D>, value: impl Into<Render<D>>) -> LocalBoxFuture<'static, Result<(), Error>> {
	resolve(Target::Range(range), value.into())
}

/// Resolves `value` into `target` as a detached task. Failures are logged.
pub fn spawn_resolve<D: Dom>(target: Target<D>, value: Render<D>) {
	let dom = target.dom().clone();
	let span = trace_span!("render task", ?value);
	dom.spawn(
		async move {
			if let Err(error) = resolve(target, value).await {
				error!("Rendering failed: {}", error);
			}
		}
		.instrument(span)
		.boxed_local(),
	);
}

/// [`spawn_resolve`] into the content of `node`.
pub fn spawn_mutate<D: Dom>(dom: &D, node: D::Node, value: impl Into<Render<D>>) {
	spawn_resolve(Target::Node(dom.clone(), node), value.into());
}

/// [`spawn_resolve`] into `range`.
pub fn spawn_mutate_range<D: Dom>(range: DynamicRange<D>, value: impl Into<Render<D>>) {
	spawn_resolve(Target::Range(range), value.into());
}

/// Resolves `content` into `parent` and waits for it, unlike the other constructors here.
///
/// # Errors
///
/// Iff the [`Dom`] rejects an operation.
pub fn mount<D: Dom>(dom: &D, parent: D::Node, content: impl Into<Render<D>>) -> LocalBoxFuture<'static, Result<(), Error>> {
	let span = trace_span!("mount", ?parent);
	mutate(dom, parent, content).instrument(span).boxed_local()
}

/// Creates a `tag` element and starts rendering `content` into it.
///
/// The element is returned immediately, so it may not be populated yet.
///
/// # Errors
///
/// Iff the [`Dom`] rejects the tag name.
#[instrument(skip(dom, content))]
pub fn element<D: Dom>(dom: &D, tag: &str, content: impl Into<Render<D>>) -> Result<D::Node, Error> {
	let element = dom.create_element(tag)?;
	spawn_mutate(dom, element.clone(), content);
	Ok(element)
}

/// Creates a text node and starts rendering `content` into it.
///
/// Only text (by replacement) is meaningful here. Nodes can't be appended to a text node and are reported as failures.
pub fn text<D: Dom>(dom: &D, content: impl Into<Render<D>>) -> D::Node {
	let text = dom.create_text("");
	spawn_mutate(dom, text.clone(), content);
	text
}

/// Creates a fragment and starts rendering `content` into it.
pub fn fragment<D: Dom>(dom: &D, content: impl Into<Render<D>>) -> D::Node {
	let fragment = dom.create_fragment();
	spawn_mutate(dom, fragment.clone(), content);
	fragment
}

/// A renderable [`DynamicRange`] with `content`.
///
/// The range is placed where this value is resolved and then filled as a detached task, so that unbounded content
/// doesn't hold up later siblings.
///
/// Without a `name`, a random one is used.
pub fn range<D: Dom>(name: Option<&str>, content: impl Into<Render<D>>) -> Render<D> {
	let name = name.map_or_else(anonymous_name, ToOwned::to_owned);
	let content = content.into();
	Render::thunk(move |target: &Target<D>| {
		let range = DynamicRange::new(target.dom(), &name);
		spawn_mutate_range(range.clone(), content);
		match range.detach() {
			Ok(fragment) => Render::from(fragment.map(Render::Node)),
			Err(error) => {
				error!("Failed to detach new range: {}", error);
				Render::Empty
			}
		}
	})
}
