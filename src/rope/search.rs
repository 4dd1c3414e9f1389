//! Component C: search and ordering helpers over a node tree.
//!
//! The spec describes these as chunk walks for locality; this
//! implementation instead walks by index through [`NodeLink::at`], which is
//! O(depth) per step. For a balanced tree `depth` is `O(log n)`, so the
//! asymptotics stay the same as a chunk walk up to that factor, and the
//! code stays generic without having to reason about chunk boundaries
//! mid-pattern. Recorded as a simplification in DESIGN.md.

use std::cmp::Ordering;

use super::node::NodeLink;

/// Smallest index `>= start` at which `pattern` occurs as a contiguous run
/// in `haystack`, or `None`.
pub(crate) fn index_of<T: PartialEq + Clone>(
    haystack: &NodeLink<T>,
    pattern: &NodeLink<T>,
    start: usize,
) -> Option<usize> {
    let (hlen, plen) = (haystack.len(), pattern.len());
    if plen == 0 {
        return Some(start.min(hlen));
    }
    if start >= hlen || plen > hlen - start {
        return None;
    }
    'outer: for i in start..=(hlen - plen) {
        for j in 0..plen {
            if haystack.at(i + j) != pattern.at(j) {
                continue 'outer;
            }
        }
        return Some(i);
    }
    None
}

/// Largest index at which `pattern` occurs as a contiguous run in
/// `haystack`, searching right to left, or `None`.
pub(crate) fn last_index_of<T: PartialEq + Clone>(
    haystack: &NodeLink<T>,
    pattern: &NodeLink<T>,
) -> Option<usize> {
    let (hlen, plen) = (haystack.len(), pattern.len());
    if plen == 0 {
        return Some(hlen);
    }
    if plen > hlen {
        return None;
    }
    'outer: for i in (0..=(hlen - plen)).rev() {
        for j in 0..plen {
            if haystack.at(i + j) != pattern.at(j) {
                continue 'outer;
            }
        }
        return Some(i);
    }
    None
}

/// Length of the longest common prefix of `a` and `b`.
pub(crate) fn common_prefix_len<T: PartialEq + Clone>(a: &NodeLink<T>, b: &NodeLink<T>) -> usize {
    let max = a.len().min(b.len());
    let mut n = 0;
    while n < max && a.at(n) == b.at(n) {
        n += 1;
    }
    n
}

/// Length of the longest common suffix of `a` and `b`.
pub(crate) fn common_suffix_len<T: PartialEq + Clone>(a: &NodeLink<T>, b: &NodeLink<T>) -> usize {
    let (alen, blen) = (a.len(), b.len());
    let max = alen.min(blen);
    let mut n = 0;
    while n < max && a.at(alen - 1 - n) == b.at(blen - 1 - n) {
        n += 1;
    }
    n
}

/// The insertion index for `v` into `root`, assumed already ordered by
/// `cmp`. Ties break stable-right: `v` is inserted after every existing
/// element it compares equal to.
pub(crate) fn insert_sorted_index<T: Clone>(
    root: &NodeLink<T>,
    v: &T,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> usize {
    let mut lo = 0usize;
    let mut hi = root.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let existing = root.at(mid).expect("mid is within [lo, hi) <= len");
        match cmp(existing, v) {
            Ordering::Greater => hi = mid,
            _ => lo = mid + 1,
        }
    }
    lo
}
