//! Component D: Myers-bisect diff, semantic/efficiency cleanup, bitap
//! fuzzy locate, and patch apply — the hardest subsystem, built entirely
//! on top of [`crate::Rope`].
//!
//! `T` here is constrained to `Clone + PartialEq + Eq + Hash`: `Eq`/`Hash`
//! are needed by [`hashing`]'s token-to-integer table and by
//! [`match_`]'s bitap alphabet, both of which key a `HashMap<T, _>`.

mod bisect;
mod cleanup;
mod hashing;
mod match_;
mod patch;

use std::hash::Hash;
use std::time::{Duration, Instant};

pub use match_::MatchOptions;
pub use patch::Patch;

use crate::Rope;

/// One edit operation in a diff sequence, carrying the run of tokens it
/// covers.
///
/// Diff chunks are plain `Vec<T>` rather than `Rope<T>`: a diff is
/// materialized in full by the O(ND) algorithm regardless (random access
/// during bisection rules out lazily walking a rope's leaves), and diffs
/// are themselves transient values, not persisted or widely shared the
/// way a `Rope` is — so there's no structural-sharing benefit to paying a
/// rope's indirection for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff<T> {
    Equal(Vec<T>),
    Insert(Vec<T>),
    Delete(Vec<T>),
}

impl<T> Diff<T> {
    /// The token run this diff carries, regardless of its kind.
    pub fn chunk(&self) -> &[T] {
        match self {
            Diff::Equal(c) | Diff::Insert(c) | Diff::Delete(c) => c,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Diff::Equal(_))
    }
}

/// Threshold (in elements) above which [`DiffOptions::hash_chunks`] takes
/// effect; below it, aliasing tokens to integers costs more than it saves.
const HASH_CHUNKS_THRESHOLD: usize = 512;

/// Configuration for [`compute`].
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Soft wall-clock cap on bisection, in seconds. `0.0` disables the
    /// deadline.
    pub timeout_seconds: f64,
    /// Minimum edit-gap length considered worth merging during efficiency
    /// cleanup.
    pub edit_cost: usize,
    /// When true, long inputs are tokenised to small integer aliases
    /// before bisecting, then rehydrated afterward.
    pub hash_chunks: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions { timeout_seconds: 1.0, edit_cost: 4, hash_chunks: false }
    }
}

/// `ComputeDiffs`: the top-level diff entry point.
///
/// 1. Trims the common prefix/suffix (surfaced as surrounding `Equal`
///    diffs) and recurses on the remaining middle.
/// 2. Handles the trivial all-insert/all-delete cases.
/// 3. If `hash_chunks` is set and both middles are long, aliases tokens to
///    integers first (see [`hashing`]) so bisection compares `u64`s
///    instead of possibly-expensive `T` values, then rehydrates.
/// 4. Bisects with the Myers O(ND) middle-snake technique, recursing on
///    each half; a tripped deadline returns a trivial replace for the
///    unresolved span instead of continuing.
/// 5. Runs [`cleanup::merge_adjacent`], [`cleanup::semantic_cleanup`], and
///    [`cleanup::efficiency_cleanup`] over the concatenated result.
pub fn compute<T: Clone + PartialEq + Eq + Hash>(a: &Rope<T>, b: &Rope<T>, opts: &DiffOptions) -> Vec<Diff<T>> {
    let deadline = if opts.timeout_seconds > 0.0 {
        Some(Instant::now() + Duration::from_secs_f64(opts.timeout_seconds))
    } else {
        None
    };

    let av = a.to_buffer();
    let bv = b.to_buffer();

    let mut diffs = if opts.hash_chunks && av.len() > HASH_CHUNKS_THRESHOLD && bv.len() > HASH_CHUNKS_THRESHOLD {
        let (ia, ib, table) = hashing::chunks_to_integers(&av, &bv);
        let aliased = bisect::diff_main(&ia, &ib, deadline);
        aliased
            .into_iter()
            .map(|d| match d {
                Diff::Equal(c) => Diff::Equal(hashing::integers_to_chunks(&c, &table)),
                Diff::Insert(c) => Diff::Insert(hashing::integers_to_chunks(&c, &table)),
                Diff::Delete(c) => Diff::Delete(hashing::integers_to_chunks(&c, &table)),
            })
            .collect()
    } else {
        bisect::diff_main(&av, &bv, deadline)
    };

    diffs = cleanup::merge_adjacent(diffs);
    cleanup::semantic_cleanup(&mut diffs);
    cleanup::efficiency_cleanup(&mut diffs, opts.edit_cost);
    diffs
}

/// The edit distance a diff sequence implies: the summed length of every
/// non-`Equal` diff.
pub fn levenshtein_distance<T>(diffs: &[Diff<T>]) -> usize {
    diffs.iter().filter(|d| !d.is_equal()).map(|d| d.chunk().len()).sum()
}

/// Reconstruct the original (`a`) sequence a diff was computed from.
pub fn text1<T: Clone>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs.iter().filter(|d| !matches!(d, Diff::Insert(_))).flat_map(|d| d.chunk().iter().cloned()).collect()
}

/// Reconstruct the target (`b`) sequence a diff was computed toward.
pub fn text2<T: Clone>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs.iter().filter(|d| !matches!(d, Diff::Delete(_))).flat_map(|d| d.chunk().iter().cloned()).collect()
}

/// `MakePatches`: group a diff sequence into patches, each carrying
/// `patch_margin` elements of context around its edit(s).
pub fn make_patches<T: Clone + PartialEq>(diffs: &[Diff<T>], patch_margin: usize) -> Vec<Patch<T>> {
    patch::make_patches(diffs, patch_margin)
}

/// `ApplyPatches`: apply `patches` to `text`, relocating each by fuzzy
/// locate as needed. Returns the patched text and one success flag per
/// patch; a patch that can't be relocated is skipped, not fatal.
pub fn apply_patches<T: Clone + Eq + Hash>(
    patches: &[Patch<T>],
    text: &Rope<T>,
    opts: &MatchOptions,
) -> (Rope<T>, Vec<bool>) {
    let (result, applied) = patch::apply_patches(patches, &text.to_buffer(), opts);
    (Rope::from_buffer(result), applied)
}

/// `FindNear`: the best approximate location of `pattern` in `text`, near
/// `near_loc`, or `None` if nothing scores within `opts.match_threshold`.
pub fn find_near<T: Eq + Hash + Clone>(text: &Rope<T>, pattern: &Rope<T>, near_loc: usize, opts: &MatchOptions) -> Option<usize> {
    match_::find_near(&text.to_buffer(), &pattern.to_buffer(), near_loc, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rope_of(s: &str) -> Rope<char> {
        Rope::from_buffer(s.chars().collect())
    }

    #[test]
    fn compute_then_apply_round_trips() {
        let a = rope_of("The quick brown fox");
        let b = rope_of("The slow brown dog");
        let opts = DiffOptions::default();
        let diffs = compute(&a, &b, &opts);
        assert_eq!(text1(&diffs), a.to_buffer());
        assert_eq!(text2(&diffs), b.to_buffer());

        let patches = make_patches(&diffs, 4);
        let (patched, applied) = apply_patches(&patches, &a, &MatchOptions::default());
        assert_eq!(patched, b);
        assert!(applied.iter().all(|&ok| ok));
    }

    #[test]
    fn levenshtein_distance_counts_non_equal_tokens() {
        let a = rope_of("kitten");
        let b = rope_of("sitting");
        let diffs = compute(&a, &b, &DiffOptions::default());
        assert!(levenshtein_distance(&diffs) > 0);
        assert!(levenshtein_distance(&diffs) <= a.length() + b.length());
    }

    #[test]
    fn line_level_diff_handles_far_more_than_sixty_five_thousand_lines() {
        let lines: Vec<String> = (0..66_000u32).map(|n| n.to_string()).collect();
        let a: Rope<String> = lines.into_iter().collect();
        let b: Rope<String> = Rope::empty();
        let mut opts = DiffOptions::default();
        opts.hash_chunks = true;
        opts.timeout_seconds = 0.0;
        let diffs = compute(&a, &b, &opts);
        assert_eq!(diffs.len(), 1);
        assert!(matches!(&diffs[0], Diff::Delete(c) if c.len() == a.length()));
    }
}
