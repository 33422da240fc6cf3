//! Declarative [`RangeList`] operations, and their interpreter.

use crate::{list::Renderer, Dom, Error, RangeList};
use core::{
	fmt::{self, Debug, Formatter},
	future::Future,
};
use futures_util::{
	future::{FutureExt as _, LocalBoxFuture},
	stream::{LocalBoxStream, Stream, StreamExt as _},
};
use tracing::{error, trace, trace_span, Instrument as _};

/// A single list operation. Keys are matched against [`Renderer::key`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
	/// See [`RangeList::assign`].
	Assign(Vec<T>),
	/// See [`RangeList::append`].
	Append { values: Vec<T>, after: Option<String> },
	/// See [`RangeList::prepend`].
	Prepend { values: Vec<T>, before: Option<String> },
	/// See [`RangeList::remove`].
	Remove(Vec<String>),
	/// See [`RangeList::clear`].
	Clear,
}

impl<T> Action<T> {
	fn name(&self) -> &'static str {
		match self {
			Action::Assign(_) => "Assign",
			Action::Append { .. } => "Append",
			Action::Prepend { .. } => "Prepend",
			Action::Remove(_) => "Remove",
			Action::Clear => "Clear",
		}
	}
}

/// Any composition of [`Action`]s, in the same shapes as [`Render`](`crate::Render`).
pub enum Actions<T> {
	Empty,
	Action(Action<T>),
	/// Applied in order, each completely before the next.
	Sequence(Vec<Actions<T>>),
	/// Each item is applied before the next one is requested.
	Stream(LocalBoxStream<'static, Actions<T>>),
	Deferred(LocalBoxFuture<'static, Actions<T>>),
	/// Computes actions from the list's values at the time it is applied (not when it was queued).
	Compute(Box<dyn FnOnce(&[T]) -> Actions<T>>),
	/// A foreign value that isn't an action, with a description for diagnostics.
	Unrecognized(String),
}

impl<T: 'static> Actions<T> {
	pub fn sequence<I: Into<Self>>(items: impl IntoIterator<Item = I>) -> Self {
		Self::Sequence(items.into_iter().map(|item| -> Self { item.into() }).collect())
	}

	pub fn stream<I: Into<Self>>(stream: impl Stream<Item = I> + 'static) -> Self {
		Self::Stream(stream.map(|item| -> Self { item.into() }).boxed_local())
	}

	pub fn deferred<I: Into<Self>>(future: impl Future<Output = I> + 'static) -> Self {
		Self::Deferred(future.map(|actions| -> Self { actions.into() }).boxed_local())
	}

	pub fn compute<I: Into<Self>>(f: impl FnOnce(&[T]) -> I + 'static) -> Self {
		Self::Compute(Box::new(move |values| f(values).into()))
	}
}

impl<T: Debug> Debug for Actions<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Actions::Empty => f.write_str("Empty"),
			Actions::Action(action) => {
				if cfg!(feature = "dangerous-logging") {
					f.debug_tuple("Action").field(action).finish()
				} else {
					write!(f, "Action({}(..))", action.name())
				}
			}
			Actions::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
			Actions::Stream(_) => f.write_str("Stream(..)"),
			Actions::Deferred(_) => f.write_str("Deferred(..)"),
			Actions::Compute(_) => f.write_str("Compute(..)"),
			Actions::Unrecognized(description) => f.debug_tuple("Unrecognized").field(description).finish(),
		}
	}
}

impl<T> From<Action<T>> for Actions<T> {
	fn from(action: Action<T>) -> Self {
		Self::Action(action)
	}
}

impl<T> From<()> for Actions<T> {
	fn from((): ()) -> Self {
		Self::Empty
	}
}

impl<T, I: Into<Actions<T>>> From<Option<I>> for Actions<T> {
	fn from(actions: Option<I>) -> Self {
		actions.map_or(Self::Empty, Into::into)
	}
}

impl<T> From<Vec<Action<T>>> for Actions<T> {
	fn from(actions: Vec<Action<T>>) -> Self {
		Self::Sequence(actions.into_iter().map(Self::Action).collect())
	}
}

impl<T> From<Vec<Actions<T>>> for Actions<T> {
	fn from(actions: Vec<Actions<T>>) -> Self {
		Self::Sequence(actions)
	}
}

impl<D: Dom, T: Clone + PartialEq + 'static, R: Renderer<D, T>> RangeList<D, T, R> {
	/// Applies one terminal action.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation.
	pub fn apply(&self, action: Action<T>) -> Result<(), Error> {
		trace!(action = action.name(), "Applying action.");
		match action {
			Action::Assign(values) => self.assign(values),
			Action::Append { values, after } => self.append(values, after.as_deref()),
			Action::Prepend { values, before } => self.prepend(values, before.as_deref()),
			Action::Remove(keys) => self.remove(&keys[..]),
			Action::Clear => self.clear(),
		}
	}

	/// Applies `actions` completely, in order.
	///
	/// Calls are only serialized within one evaluation.
	/// Unrecognized actions are logged and skipped.
	///
	/// # Errors
	///
	/// Iff the [`Dom`] rejects an operation. Evaluation stops at that point.
	pub fn eval(&self, actions: impl Into<Actions<T>>) -> LocalBoxFuture<'static, Result<(), Error>> {
		let span = trace_span!("eval", list = %self.id());
		self.clone().eval_actions(actions.into()).instrument(span).boxed_local()
	}

	fn eval_actions(self, actions: Actions<T>) -> LocalBoxFuture<'static, Result<(), Error>> {
		async move {
			match actions {
				Actions::Empty => Ok(()),
				Actions::Action(action) => self.apply(action),
				Actions::Sequence(items) => {
					for item in items {
						self.clone().eval_actions(item).await?;
					}
					Ok(())
				}
				Actions::Stream(mut stream) => {
					while let Some(item) = stream.next().await {
						self.clone().eval_actions(item).await?;
					}
					trace!("Action stream ended.");
					Ok(())
				}
				Actions::Deferred(future) => {
					let actions = future.await;
					self.eval_actions(actions).await
				}
				Actions::Compute(f) => {
					let actions = f(&self.values());
					self.eval_actions(actions).await
				}
				Actions::Unrecognized(description) => {
					error!("{}", Error::InvalidAction(description));
					Ok(())
				}
			}
		}
		.boxed_local()
	}

	/// [`RangeList::eval`] as a detached task. Failures are logged.
	pub fn spawn_eval(&self, actions: impl Into<Actions<T>>) {
		let eval = self.eval(actions);
		self.root().dom().spawn(
			async move {
				if let Err(error) = eval.await {
					error!("Applying list actions failed: {}", error);
				}
			}
			.boxed_local(),
		);
	}
}
