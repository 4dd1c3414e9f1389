//! Patch construction and application.
//!
//! A [`Patch`] groups a run of diffs together with the source/target
//! coordinates of the edit window they describe, plus `patch_margin`
//! elements of surrounding context on either side — enough that
//! [`apply_patches`] can relocate the patch in a text that has drifted
//! from the one it was computed against.

use std::hash::Hash;

use super::match_::{self, MatchOptions};
use super::Diff;

/// A located group of diffs: context plus the edit(s) it brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch<T> {
    pub diffs: Vec<Diff<T>>,
    pub start1: usize,
    pub length1: usize,
    pub start2: usize,
    pub length2: usize,
}

/// Group `diffs` into patches, each carrying up to `margin` elements of
/// `Equal` context around its edit(s).
pub(crate) fn make_patches<T: Clone + PartialEq>(diffs: &[Diff<T>], margin: usize) -> Vec<Patch<T>> {
    if diffs.is_empty() {
        return Vec::new();
    }

    let mut patches = Vec::new();
    let mut current: Vec<Diff<T>> = Vec::new();
    let (mut start1, mut start2) = (0usize, 0usize);
    let (mut len1, mut len2) = (0usize, 0usize);
    let (mut pos1, mut pos2) = (0usize, 0usize);
    let mut has_edit = false;

    for diff in diffs {
        match diff {
            Diff::Equal(chunk) => {
                if has_edit {
                    let take = chunk.len().min(margin);
                    if take > 0 {
                        current.push(Diff::Equal(chunk[..take].to_vec()));
                        len1 += take;
                        len2 += take;
                    }
                    patches.push(Patch {
                        diffs: std::mem::take(&mut current),
                        start1,
                        length1: len1,
                        start2,
                        length2: len2,
                    });
                    has_edit = false;
                    len1 = 0;
                    len2 = 0;
                    pos1 += chunk.len();
                    pos2 += chunk.len();
                    start1 = pos1;
                    start2 = pos2;
                } else {
                    let keep = chunk.len().min(margin);
                    let lead = &chunk[chunk.len() - keep..];
                    current = vec![Diff::Equal(lead.to_vec())];
                    len1 = keep;
                    len2 = keep;
                    start1 = pos1 + chunk.len() - keep;
                    start2 = pos2 + chunk.len() - keep;
                    pos1 += chunk.len();
                    pos2 += chunk.len();
                }
            }
            Diff::Delete(chunk) => {
                has_edit = true;
                len1 += chunk.len();
                pos1 += chunk.len();
                current.push(diff.clone());
            }
            Diff::Insert(chunk) => {
                has_edit = true;
                len2 += chunk.len();
                pos2 += chunk.len();
                current.push(diff.clone());
            }
        }
    }
    if has_edit {
        patches.push(Patch { diffs: current, start1, length1: len1, start2, length2: len2 });
    }
    patches
}

fn patch_text1<T: Clone>(patch: &Patch<T>) -> Vec<T> {
    patch.diffs.iter().filter(|d| !matches!(d, Diff::Insert(_))).flat_map(|d| d.chunk().iter().cloned()).collect()
}

fn patch_text2<T: Clone>(patch: &Patch<T>) -> Vec<T> {
    patch.diffs.iter().filter(|d| !matches!(d, Diff::Delete(_))).flat_map(|d| d.chunk().iter().cloned()).collect()
}

/// Apply `patches` to `text` in order, relocating each one by fuzzy
/// locate if `text` has drifted from the source the patches were
/// computed against. A patch that can't be relocated within
/// `opts.match_threshold` is skipped — its slot in the returned status
/// vector is `false` — and application continues with the rest.
pub(crate) fn apply_patches<T: Clone + Eq + Hash>(
    patches: &[Patch<T>],
    text: &[T],
    opts: &MatchOptions,
) -> (Vec<T>, Vec<bool>) {
    let mut result = text.to_vec();
    let mut applied = Vec::with_capacity(patches.len());
    let mut delta: isize = 0;

    for patch in patches {
        let pattern = patch_text1(patch);
        let replacement = patch_text2(patch);
        let expected_loc = ((patch.start1 as isize) + delta).clamp(0, result.len() as isize) as usize;

        match match_::find_near(&result, &pattern, expected_loc, opts) {
            Some(loc) if loc + pattern.len() <= result.len() => {
                result.splice(loc..loc + pattern.len(), replacement.iter().cloned());
                delta += replacement.len() as isize - pattern.len() as isize;
                applied.push(true);
            }
            _ => {
                log::warn!(
                    "patch at source offset {} could not be relocated; skipping",
                    patch.start1
                );
                applied.push(false);
            }
        }
    }

    (result, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::bisect;

    fn v(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn round_trip_through_make_and_apply() {
        let a = v("The quick brown fox");
        let b = v("The slow brown dog");
        let diffs = bisect::diff_main(&a, &b, None);
        let patches = make_patches(&diffs, 4);
        let opts = MatchOptions::default();
        let (result, applied) = apply_patches(&patches, &a, &opts);
        assert_eq!(result, b);
        assert!(applied.iter().all(|&ok| ok));
    }

    #[test]
    fn patch_applies_against_slightly_drifted_text() {
        let a = v("one two three four five");
        let b = v("one two THREE four five");
        let diffs = bisect::diff_main(&a, &b, None);
        let patches = make_patches(&diffs, 4);
        let opts = MatchOptions::default();

        let mut drifted = v("zz ");
        drifted.extend(a.iter().cloned());
        let (result, applied) = apply_patches(&patches, &drifted, &opts);
        assert!(applied.iter().any(|&ok| ok));
        assert!(result.iter().collect::<String>().contains("THREE"));
    }
}
