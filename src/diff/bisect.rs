//! Myers O(ND) diff with the middle-snake (bisect) technique.
//!
//! A direct port of the classic diff-match-patch `diff_bisect` routine —
//! the algorithm Myers, "An O(ND) Difference Algorithm and Its Variations"
//! (1986), describes — generalized from characters to any `E: Clone +
//! PartialEq`. No corpus example implements this; the module split
//! (bisect as its own file, separate from cleanup/patch) mirrors how
//! `xi-rope`'s `diff.rs` keeps its diff core apart from delta application.

use std::time::Instant;

use super::Diff;

/// Recursively diff `a` against `b`: trim common affixes, handle the
/// trivial empty cases, and otherwise bisect-and-recurse. This is the
/// function every recursive split calls back into.
pub(crate) fn diff_main<E: Clone + PartialEq>(a: &[E], b: &[E], deadline: Option<Instant>) -> Vec<Diff<E>> {
    if a == b {
        return if a.is_empty() { Vec::new() } else { vec![Diff::Equal(a.to_vec())] };
    }
    if a.is_empty() {
        return vec![Diff::Insert(b.to_vec())];
    }
    if b.is_empty() {
        return vec![Diff::Delete(a.to_vec())];
    }

    let prefix_len = common_prefix(a, b);
    let prefix = &a[..prefix_len];
    let (a_rest, b_rest) = (&a[prefix_len..], &b[prefix_len..]);

    let suffix_len = common_suffix(a_rest, b_rest);
    let suffix = &a_rest[a_rest.len() - suffix_len..];
    let mid_a = &a_rest[..a_rest.len() - suffix_len];
    let mid_b = &b_rest[..b_rest.len() - suffix_len];

    let mut diffs = Vec::new();
    if !prefix.is_empty() {
        diffs.push(Diff::Equal(prefix.to_vec()));
    }
    diffs.extend(diff_middle(mid_a, mid_b, deadline));
    if !suffix.is_empty() {
        diffs.push(Diff::Equal(suffix.to_vec()));
    }
    diffs
}

fn diff_middle<E: Clone + PartialEq>(a: &[E], b: &[E], deadline: Option<Instant>) -> Vec<Diff<E>> {
    if a.is_empty() && b.is_empty() {
        return Vec::new();
    }
    if a.is_empty() {
        return vec![Diff::Insert(b.to_vec())];
    }
    if b.is_empty() {
        return vec![Diff::Delete(a.to_vec())];
    }
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            log::warn!(
                "diff bisect deadline exceeded with {} vs {} tokens remaining; \
                 returning a trivial replacement for the unresolved span",
                a.len(),
                b.len()
            );
            return vec![Diff::Delete(a.to_vec()), Diff::Insert(b.to_vec())];
        }
    }
    bisect(a, b, deadline)
}

/// Find a middle snake splitting `(a, b)` into two independently-diffable
/// halves, per Myers' bisection algorithm.
fn bisect<E: Clone + PartialEq>(a: &[E], b: &[E], deadline: Option<Instant>) -> Vec<Diff<E>> {
    let (m, n) = (a.len(), b.len());
    let max_d = (m + n + 1) / 2;
    let v_offset = max_d as i64;
    let v_len = 2 * max_d + 1;
    let mut v1 = vec![-1i64; v_len];
    let mut v2 = vec![-1i64; v_len];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;
    let delta = m as i64 - n as i64;
    let front = delta % 2 != 0;
    let (mut k1start, mut k1end, mut k2start, mut k2end) = (0i64, 0i64, 0i64, 0i64);

    for d in 0..max_d as i64 {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }

        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_off = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_off - 1] < v1[k1_off + 1]) {
                v1[k1_off + 1]
            } else {
                v1[k1_off - 1] + 1
            };
            let mut y1 = x1 - k1;
            while (x1 as usize) < m && (y1 as usize) < n && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_off] = x1;
            if x1 > m as i64 {
                k1end += 2;
            } else if y1 > n as i64 {
                k1start += 2;
            } else if front {
                let k2_off = v_offset + delta - k1;
                if k2_off >= 0 && (k2_off as usize) < v_len && v2[k2_off as usize] != -1 {
                    let x2 = m as i64 - v2[k2_off as usize];
                    if x1 >= x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_off = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_off - 1] < v2[k2_off + 1]) {
                v2[k2_off + 1]
            } else {
                v2[k2_off - 1] + 1
            };
            let mut y2 = x2 - k2;
            while (x2 as usize) < m
                && (y2 as usize) < n
                && a[m - x2 as usize - 1] == b[n - y2 as usize - 1]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_off] = x2;
            if x2 > m as i64 {
                k2end += 2;
            } else if y2 > n as i64 {
                k2start += 2;
            } else if !front {
                let k1_off = v_offset + delta - k2;
                if k1_off >= 0 && (k1_off as usize) < v_len && v1[k1_off as usize] != -1 {
                    let x1 = v1[k1_off as usize];
                    let y1 = v_offset + x1 - k1_off;
                    let x2_mirror = m as i64 - x2;
                    if x1 >= x2_mirror {
                        return bisect_split(a, b, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k2 += 2;
        }
    }

    // No snake found within the budget: the inputs are maximally different.
    vec![Diff::Delete(a.to_vec()), Diff::Insert(b.to_vec())]
}

fn bisect_split<E: Clone + PartialEq>(
    a: &[E],
    b: &[E],
    x: usize,
    y: usize,
    deadline: Option<Instant>,
) -> Vec<Diff<E>> {
    let (a1, a2) = a.split_at(x);
    let (b1, b2) = b.split_at(y);
    let mut left = diff_main(a1, b1, deadline);
    left.extend(diff_main(a2, b2, deadline));
    left
}

fn common_prefix<E: PartialEq>(a: &[E], b: &[E]) -> usize {
    let max = a.len().min(b.len());
    let mut n = 0;
    while n < max && a[n] == b[n] {
        n += 1;
    }
    n
}

fn common_suffix<E: PartialEq>(a: &[E], b: &[E]) -> usize {
    let max = a.len().min(b.len());
    let mut n = 0;
    while n < max && a[a.len() - 1 - n] == b[b.len() - 1 - n] {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn apply(diffs: &[Diff<char>]) -> (String, String) {
        let mut t1 = String::new();
        let mut t2 = String::new();
        for d in diffs {
            match d {
                Diff::Equal(c) => {
                    t1.extend(c.iter());
                    t2.extend(c.iter());
                }
                Diff::Delete(c) => t1.extend(c.iter()),
                Diff::Insert(c) => t2.extend(c.iter()),
            }
        }
        (t1, t2)
    }

    #[test]
    fn identical_inputs_produce_single_equal() {
        let diffs = diff_main(&v("same"), &v("same"), None);
        assert_eq!(diffs, vec![Diff::Equal(v("same"))]);
    }

    #[test]
    fn disjoint_inputs_reconstruct_exactly() {
        let (a, b) = (v("The quick brown fox"), v("The slow brown dog"));
        let diffs = diff_main(&a, &b, None);
        assert_eq!(apply(&diffs), (a.into_iter().collect(), b.into_iter().collect()));
    }

    #[test]
    fn pure_insert_and_pure_delete() {
        assert_eq!(diff_main(&Vec::<char>::new(), &v("abc"), None), vec![Diff::Insert(v("abc"))]);
        assert_eq!(diff_main(&v("abc"), &Vec::<char>::new(), None), vec![Diff::Delete(v("abc"))]);
    }
}
