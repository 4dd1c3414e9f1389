//! Post-processing passes run over a raw bisect result: coalescing,
//! semantic grouping, and efficiency-driven merging.
//!
//! `semantic_cleanup` and `efficiency_cleanup` are simplified relatives of
//! the classic diff-match-patch passes of the same name: both eliminate
//! short `Equal` runs sandwiched between edits, rather than the full
//! lossless boundary-shifting variant, which additionally re-aligns edits
//! to word/line boundaries. Recorded as a simplification in DESIGN.md.

use super::Diff;

/// Coalesce consecutive diffs of the same kind, and drop any that end up
/// empty.
pub(crate) fn merge_adjacent<E: Clone>(diffs: Vec<Diff<E>>) -> Vec<Diff<E>> {
    let mut out: Vec<Diff<E>> = Vec::with_capacity(diffs.len());
    for d in diffs {
        let merged = match (out.last_mut(), &d) {
            (Some(Diff::Equal(prev)), Diff::Equal(next)) => {
                prev.extend(next.iter().cloned());
                true
            }
            (Some(Diff::Insert(prev)), Diff::Insert(next)) => {
                prev.extend(next.iter().cloned());
                true
            }
            (Some(Diff::Delete(prev)), Diff::Delete(next)) => {
                prev.extend(next.iter().cloned());
                true
            }
            _ => false,
        };
        if !merged {
            out.push(d);
        }
    }
    out.retain(|d| !d.chunk().is_empty());
    out
}

/// Eliminate `Equal` runs too short to be meaningful relative to the
/// insert/delete volume surrounding them, converting each into a
/// Delete-then-Insert pair of the same content (a no-op on the
/// reconstructed text, but it lets `merge_adjacent` fold it into its
/// neighbors).
pub(crate) fn semantic_cleanup<E: Clone + PartialEq>(diffs: &mut Vec<Diff<E>>) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equal_len = 0usize;
    let (mut ins1, mut del1, mut ins2, mut del2) = (0usize, 0usize, 0usize, 0usize);

    let mut i = 0;
    while i < diffs.len() {
        match &diffs[i] {
            Diff::Equal(chunk) => {
                equalities.push(i);
                ins1 = ins2;
                del1 = del2;
                ins2 = 0;
                del2 = 0;
                last_equal_len = chunk.len();
            }
            Diff::Insert(chunk) => ins2 += chunk.len(),
            Diff::Delete(chunk) => del2 += chunk.len(),
        }

        let is_edit = matches!(diffs[i], Diff::Insert(_) | Diff::Delete(_));
        let worth_splitting = is_edit
            && !equalities.is_empty()
            && last_equal_len <= ins1.max(del1)
            && last_equal_len <= ins2.max(del2);

        if worth_splitting {
            let eq_idx = *equalities.last().unwrap();
            if let Diff::Equal(chunk) = diffs[eq_idx].clone() {
                diffs[eq_idx] = Diff::Delete(chunk.clone());
                diffs.insert(eq_idx + 1, Diff::Insert(chunk));
                changed = true;
                i += 1; // account for the newly inserted element

                equalities.pop();
                last_equal_len = equalities
                    .last()
                    .and_then(|&idx| match &diffs[idx] {
                        Diff::Equal(c) => Some(c.len()),
                        _ => None,
                    })
                    .unwrap_or(0);
                ins1 = 0;
                del1 = 0;
                ins2 = 0;
                del2 = 0;
            }
        }
        i += 1;
    }

    if changed {
        *diffs = merge_adjacent(std::mem::take(diffs));
    }
}

/// Fold short `Equal` runs (shorter than `edit_cost`) that sit between two
/// edits into their neighbors, reducing the number of small, low-value
/// diff groups.
pub(crate) fn efficiency_cleanup<E: Clone + PartialEq>(diffs: &mut Vec<Diff<E>>, edit_cost: usize) {
    if edit_cost == 0 {
        return;
    }
    let mut changed = false;
    let mut i = 0;
    while i < diffs.len() {
        if let Diff::Equal(chunk) = &diffs[i] {
            let short_enough = chunk.len() < edit_cost;
            let flanked_before = i > 0 && !matches!(diffs[i - 1], Diff::Equal(_));
            let flanked_after = i + 1 < diffs.len() && !matches!(diffs[i + 1], Diff::Equal(_));
            if short_enough && flanked_before && flanked_after {
                if let Diff::Equal(chunk) = diffs[i].clone() {
                    diffs[i] = Diff::Delete(chunk.clone());
                    diffs.insert(i + 1, Diff::Insert(chunk));
                    changed = true;
                    i += 1;
                }
            }
        }
        i += 1;
    }
    if changed {
        *diffs = merge_adjacent(std::mem::take(diffs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adjacent_coalesces_same_kind() {
        let diffs = vec![
            Diff::Equal(vec!['a']),
            Diff::Equal(vec!['b']),
            Diff::Insert(vec!['x']),
            Diff::Insert(vec!['y']),
        ];
        let merged = merge_adjacent(diffs);
        assert_eq!(merged, vec![Diff::Equal(vec!['a', 'b']), Diff::Insert(vec!['x', 'y'])]);
    }

    #[test]
    fn merge_adjacent_drops_empties() {
        let diffs: Vec<Diff<char>> = vec![Diff::Equal(vec![]), Diff::Insert(vec!['a'])];
        assert_eq!(merge_adjacent(diffs), vec![Diff::Insert(vec!['a'])]);
    }

    #[test]
    fn semantic_cleanup_eliminates_short_sandwiched_equal() {
        let mut diffs = vec![
            Diff::Delete(vec!['a', 'b', 'c', 'd']),
            Diff::Equal(vec!['x']),
            Diff::Insert(vec!['e', 'f', 'g', 'h']),
        ];
        semantic_cleanup(&mut diffs);
        assert!(diffs.iter().all(|d| !matches!(d, Diff::Equal(_))));
    }
}
