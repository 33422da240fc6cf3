//! Cooperative termination for asynchronous sequences.
//!
//! The resolvers never cancel a [`Render::Stream`](`crate::Render::Stream`) or [`Actions::Stream`](`crate::Actions::Stream`).
//! Unbounded producers should end themselves instead, for example once their target is no longer part of the document.

use crate::{Dom, Target};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	pin::Pin,
	task::{Context, Poll, Waker},
};
use futures_util::stream::{FusedStream, Stream, StreamExt as _};
use std::rc::Rc;
use tracing::trace;

#[derive(Default)]
struct Control {
	aborted: Cell<bool>,
	hook: RefCell<Option<Box<dyn FnOnce()>>>,
	waker: RefCell<Option<Waker>>,
}

/// Ends a [`Producer`] early.
#[derive(Clone)]
pub struct AbortHandle(Rc<Control>);

impl Debug for AbortHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("AbortHandle").field(&self.0.aborted.get()).finish()
	}
}

impl AbortHandle {
	/// Ends the [`Producer`] before it requests another item.
	///
	/// The first call runs the abort hook, if any. Later calls do nothing.
	pub fn abort(&self) {
		if self.0.aborted.replace(true) {
			return;
		}
		trace!("Aborting producer.");
		let hook = self.0.hook.borrow_mut().take();
		if let Some(hook) = hook {
			hook();
		}
		let waker = self.0.waker.borrow_mut().take();
		if let Some(waker) = waker {
			waker.wake();
		}
	}

	#[must_use]
	pub fn is_aborted(&self) -> bool {
		self.0.aborted.get()
	}
}

/// A [`Stream`] that ends once it's [aborted](`AbortHandle::abort`) or a liveness check fails.
///
/// The liveness check runs before each item is requested, except the first.
/// That way, content for a target that isn't placed yet is still produced once.
pub struct Producer<S> {
	stream: S,
	alive: Option<Box<dyn FnMut() -> bool>>,
	started: bool,
	finished: bool,
	control: Rc<Control>,
}

impl<S> Debug for Producer<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Producer")
			.field("started", &self.started)
			.field("finished", &self.finished)
			.field("aborted", &self.control.aborted.get())
			.finish_non_exhaustive()
	}
}

impl<S: Stream + Unpin> Producer<S> {
	pub fn new(stream: S) -> Self {
		Self {
			stream,
			alive: None,
			started: false,
			finished: false,
			control: Rc::default(),
		}
	}

	#[must_use]
	pub fn alive_while(mut self, alive: impl FnMut() -> bool + 'static) -> Self {
		self.alive = Some(Box::new(alive));
		self
	}

	/// Ends the producer once `target` isn't part of the document anymore.
	#[must_use]
	pub fn while_connected<D: Dom>(self, target: Target<D>) -> Self {
		self.alive_while(move || target.is_connected())
	}

	/// Sets a hook to run on the first [`AbortHandle::abort`] call.
	///
	/// It doesn't run if the producer ends any other way.
	#[must_use]
	pub fn on_abort(self, hook: impl FnOnce() + 'static) -> Self {
		*self.control.hook.borrow_mut() = Some(Box::new(hook));
		self
	}

	#[must_use]
	pub fn abort_handle(&self) -> AbortHandle {
		AbortHandle(self.control.clone())
	}
}

impl<S: Stream + Unpin> Stream for Producer<S> {
	type Item = S::Item;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();
		if this.finished {
			return Poll::Ready(None);
		}
		if this.control.aborted.get() {
			this.finished = true;
			return Poll::Ready(None);
		}
		if this.started {
			if let Some(alive) = &mut this.alive {
				if !alive() {
					trace!("Producer is no longer alive.");
					this.finished = true;
					return Poll::Ready(None);
				}
			}
		}

		match this.stream.poll_next_unpin(cx) {
			Poll::Ready(item) => {
				this.started = true;
				this.finished = item.is_none();
				Poll::Ready(item)
			}
			Poll::Pending => {
				*this.control.waker.borrow_mut() = Some(cx.waker().clone());
				Poll::Pending
			}
		}
	}
}

impl<S: Stream + Unpin> FusedStream for Producer<S> {
	fn is_terminated(&self) -> bool {
		self.finished
	}
}
