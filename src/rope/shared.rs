//! The reference-counted pointer type backing every `Rope<T>` node.
//!
//! Mirrors the teacher's `NodeLink` cfg-switch between `Rc` and `Arc`: by
//! default a rope is single-threaded and cheap (`Rc`); building with the
//! `atomic` feature swaps in `Arc` so that `Rope<T>` becomes `Send + Sync`
//! whenever `T` is, at the cost of atomic refcounting.

#[cfg(not(feature = "atomic"))]
pub(crate) use std::rc::Rc as Shared;

#[cfg(feature = "atomic")]
pub(crate) use std::sync::Arc as Shared;
