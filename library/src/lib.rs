//! Lazy dataflow evaluation and curve animation for node-based compositions.
//!
//! A [`document::Document`] is instantiated into a tree of [`graph::Instance`]s
//! whose [`graph::Slot`]s are pulled on demand. Animated inputs sample
//! [`animation::Curve`]s held by the [`animator::Animator`], which keys them by
//! stable ids so they can be re-attached after every rebuild.

pub mod animation;
pub mod animator;
pub mod document;
pub mod error;
pub mod graph;
pub mod service;
pub mod timeline;

pub use error::LibraryError;
