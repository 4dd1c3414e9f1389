//! Bitap fuzzy locate (`FindNear`): the best approximate occurrence of a
//! pattern in a text, near a hinted location.
//!
//! A generalization of the classic diff-match-patch `match_bitap`
//! algorithm (itself built on Manber and Wu's bitap/shift-or automaton),
//! keyed on any `T: Eq + Hash` instead of `char`.

use std::collections::HashMap;
use std::hash::Hash;

/// Tuning knobs for [`find_near`].
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Maximum acceptable error ratio, in `[0, 1]`.
    pub match_threshold: f64,
    /// Distance (in elements) at which the score doubles.
    pub match_distance: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions { match_threshold: 0.5, match_distance: 1000 }
    }
}

/// Patterns longer than this are truncated: the bitmask is one `u32` per
/// text position, one bit per pattern element.
const MAX_PATTERN_LEN: usize = 32;

fn alphabet<T: Eq + Hash + Clone>(pattern: &[T]) -> HashMap<T, u32> {
    let mut table = HashMap::new();
    for (i, item) in pattern.iter().enumerate() {
        *table.entry(item.clone()).or_insert(0u32) |= 1 << i;
    }
    table
}

fn score(errors: usize, at: usize, near_loc: usize, pattern_len: usize, distance: usize) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = (near_loc as isize - at as isize).unsigned_abs() as f64;
    if distance == 0 {
        if proximity == 0.0 {
            accuracy
        } else {
            1.0
        }
    } else {
        accuracy + proximity / distance as f64
    }
}

fn find_exact<T: PartialEq>(haystack: &[T], pattern: &[T], from: usize) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > haystack.len() || from > haystack.len() - pattern.len() {
        return None;
    }
    (from..=(haystack.len() - pattern.len())).find(|&i| haystack[i..i + pattern.len()] == *pattern)
}

fn rfind_exact<T: PartialEq>(haystack: &[T], pattern: &[T], upto: usize) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > haystack.len() {
        return None;
    }
    let upto = upto.min(haystack.len() - pattern.len());
    (0..=upto).rev().find(|&i| haystack[i..i + pattern.len()] == *pattern)
}

/// The best approximate match of `pattern` in `text`, near `near_loc`, or
/// `None` if nothing scores within `opts.match_threshold`.
pub(crate) fn find_near<T: Eq + Hash + Clone>(
    text: &[T],
    pattern: &[T],
    near_loc: usize,
    opts: &MatchOptions,
) -> Option<usize> {
    if pattern.is_empty() {
        return Some(near_loc.min(text.len()));
    }
    if text.is_empty() {
        return None;
    }
    let pattern = if pattern.len() > MAX_PATTERN_LEN { &pattern[..MAX_PATTERN_LEN] } else { pattern };
    let plen = pattern.len();
    let near_loc = near_loc.min(text.len());

    let mut score_threshold = opts.match_threshold;
    if let Some(loc) = find_exact(text, pattern, near_loc) {
        score_threshold = score_threshold.min(score(0, loc, near_loc, plen, opts.match_distance));
        if let Some(loc) = rfind_exact(text, pattern, near_loc + plen) {
            score_threshold = score_threshold.min(score(0, loc, near_loc, plen, opts.match_distance));
        }
    }

    let table = alphabet(pattern);
    let match_mask = 1u32 << (plen - 1);
    let mut best_loc: Option<usize> = None;
    let mut bin_max = plen + text.len();
    let mut last_rd: Vec<u32> = Vec::new();

    for d in 0..plen {
        let (mut bin_min, mut bin_mid) = (0usize, bin_max);
        while bin_min < bin_mid {
            if score(d, near_loc + bin_mid, near_loc, plen, opts.match_distance) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let start = if near_loc + 1 > bin_mid { (near_loc + 1 - bin_mid).max(1) } else { 1 };
        let finish = (near_loc + bin_mid).min(text.len()) + plen;

        let mut rd = vec![0u32; finish + 2];
        rd[finish + 1] = (1u32 << d).wrapping_sub(1);

        let mut broke_early = false;
        for j in (start..=finish).rev() {
            let char_match =
                if j == 0 || j - 1 >= text.len() { 0 } else { *table.get(&text[j - 1]).unwrap_or(&0) };
            rd[j] = if d == 0 {
                ((rd[j + 1] << 1) | 1) & char_match
            } else {
                (((rd[j + 1] << 1) | 1) & char_match) | (((last_rd[j + 1] | last_rd[j]) << 1) | 1) | last_rd[j + 1]
            };
            if rd[j] & match_mask != 0 {
                let loc = j - 1;
                let s = score(d, loc, near_loc, plen, opts.match_distance);
                if s <= score_threshold {
                    score_threshold = s;
                    best_loc = Some(loc);
                    if loc <= near_loc {
                        broke_early = true;
                        break;
                    }
                }
            }
        }
        let _ = broke_early;

        if score(d + 1, near_loc, near_loc, plen, opts.match_distance) > score_threshold {
            break;
        }
        last_rd = rd;
    }

    best_loc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn exact_match_scores_zero_distance() {
        let text = chars("the quick brown fox jumps");
        let pattern = chars("brown");
        let opts = MatchOptions::default();
        assert_eq!(find_near(&text, &pattern, 10, &opts), Some(10));
    }

    #[test]
    fn approximate_match_within_threshold() {
        let text = chars("the quikc brown fox");
        let pattern = chars("quick");
        let opts = MatchOptions { match_threshold: 0.6, match_distance: 100 };
        let found = find_near(&text, &pattern, 4, &opts);
        assert!(found.is_some());
    }

    #[test]
    fn nothing_within_threshold_returns_none() {
        let text = chars("abcdefgh");
        let pattern = chars("zzzzzzzz");
        let opts = MatchOptions { match_threshold: 0.1, match_distance: 100 };
        assert_eq!(find_near(&text, &pattern, 0, &opts), None);
    }
}
