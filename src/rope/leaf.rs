//! Component A: the leaf buffer.
//!
//! A [`Leaf<T>`] is a value object wrapping an immutable, shareable,
//! contiguous run of elements. It supports random access, an
//! order-sensitive FNV-1a-style hash, and O(1) aliasing sub-slices (the
//! same trick `tokio_bytes::Bytes` uses: a shared buffer plus a
//! `start`/`len` window). Equality is handled above this layer, by
//! [`super::Rope`]'s chunk-parallel comparison.

use std::hash::{Hash, Hasher};
use std::ops::Range;

use super::shared::Shared;

/// An immutable, reference-counted, contiguous run of `T`.
///
/// Cloning a `Leaf` bumps a refcount; it never copies element data.
/// Sub-slicing (`Leaf::slice`) is also O(1) and aliases the same backing
/// allocation. The only operation that copies is [`Leaf::concat`], which
/// must produce a single contiguous run out of two otherwise-unrelated
/// buffers.
pub(crate) struct Leaf<T> {
    buf: Shared<[T]>,
    start: usize,
    len: usize,
}

// Written by hand, rather than `#[derive(Clone)]`, so that cloning a
// `Leaf<T>` doesn't require `T: Clone`: `Shared<[T]>` (`Rc`/`Arc`) clones
// by bumping a refcount regardless of `T`, exactly like `NodeLink<T>`'s
// hand-written `Clone` below it in `node.rs`.
impl<T> Clone for Leaf<T> {
    fn clone(&self) -> Self {
        Leaf { buf: self.buf.clone(), start: self.start, len: self.len }
    }
}

impl<T> Leaf<T> {
    /// The empty leaf. Shared by every empty rope.
    pub(crate) fn empty() -> Self {
        Leaf { buf: Shared::from(Vec::new().into_boxed_slice()), start: 0, len: 0 }
    }

    /// Wrap an owned buffer as a leaf.
    pub(crate) fn from_vec(items: Vec<T>) -> Self {
        let len = items.len();
        Leaf { buf: Shared::from(items.into_boxed_slice()), start: 0, len }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.buf[self.start..self.start + self.len]
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// An O(1) aliasing sub-slice of this leaf.
    pub(crate) fn slice(&self, range: Range<usize>) -> Leaf<T> {
        assert!(range.end <= self.len, "Leaf::slice: range out of bounds");
        Leaf { buf: self.buf.clone(), start: self.start + range.start, len: range.end - range.start }
    }

    /// Split at `index`, returning two aliasing sub-leaves.
    pub(crate) fn split_at(&self, index: usize) -> (Leaf<T>, Leaf<T>) {
        (self.slice(0..index), self.slice(index..self.len))
    }
}

impl<T: Clone> Leaf<T> {
    /// Copy the contents of two leaves into one new, contiguous leaf.
    ///
    /// Used by `Node::concat` when both sides are leaves and the combined
    /// length still fits under `MaxLeaf`; there is no way to alias two
    /// independently-allocated buffers into one contiguous slice, so this
    /// is the one place a `Leaf` operation pays for a copy.
    pub(crate) fn concat(a: &Leaf<T>, b: &Leaf<T>) -> Leaf<T> {
        let mut v = Vec::with_capacity(a.len() + b.len());
        v.extend_from_slice(a.as_slice());
        v.extend_from_slice(b.as_slice());
        Leaf::from_vec(v)
    }
}

impl<T: Hash> Leaf<T> {
    /// Fold each element's hash into `hasher` with an FNV-1a-style combine:
    /// order-sensitive, and stable across leaf boundaries (the caller is
    /// expected to call this once per leaf, in order, over a single
    /// hasher instance — see `Node::hash_into`).
    pub(crate) fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        for item in self.as_slice() {
            item.hash(hasher);
        }
    }
}
