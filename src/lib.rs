#![doc(html_root_url = "https://docs.rs/range-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Keyed list reconciliation over marker-bounded DOM ranges.
//!
//! [`DynamicRange`] delimits a mutable window of siblings with two persistent markers,
//! [`render`] materializes (possibly asynchronous) [`Render`] values into nodes and ranges,
//! and [`RangeList`] keeps one range per keyed item in sync with a list of values driven by [`Actions`].
//!
//! Everything runs on a single thread. Content is resolved by detached local tasks, see [`Dom::spawn`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod action;
pub mod dom;
mod error;
pub mod list;
pub mod memory;
pub mod producer;
pub mod range;
pub mod render;
pub mod web;

pub use action::{Action, Actions};
pub use dom::Dom;
pub use error::Error;
pub use list::{FnRenderer, RangeList, Renderer};
pub use range::DynamicRange;
pub use render::{Render, Target};

/// Keys and text only show up in diagnostics with the `"dangerous-logging"` feature.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"<redacted>"
	}
}
