//! # persist-rope
//!
//! A persistent, immutable, self-balancing rope, generic over any
//! `T: Clone + PartialEq`, plus two subsystems built on top of it:
//!
//! - [`diff`]: a Myers-bisect diff/match/patch engine operating on ropes of
//!   tokens, with semantic and efficiency cleanup passes and a bitap-based
//!   fuzzy locate.
//! - [`index`]: a paged, bloom-filter-indexed CSV search core, whose page
//!   layout is a rope of row ranges.
//!
//! A rope makes bulk edits on very long sequences — concatenation,
//! insertion, removal, slicing — cheap via structural sharing, while
//! keeping random access, search, and iteration competitive with
//! contiguous buffers. Every operation that looks like a mutation actually
//! returns a new [`Rope`] sharing whatever subtrees it didn't need to
//! touch with the rope it was built from; nothing here is mutated in
//! place.
//!
//! For background on the underlying data structure, see:
//!
//! + <https://www.ibm.com/developerworks/library/j-ropes/>
//! + Boehm, Atkinson & Plass, "Ropes: An Alternative to Strings" (1995)
//! + Myers, "An O(ND) Difference Algorithm and Its Variations" (1986)

pub mod diff;
pub mod error;
pub mod index;
mod rope;

pub use error::{Result, RopeError};
pub use rope::{Chunk, Iter, Rope, ToChunks};
