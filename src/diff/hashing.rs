//! `ChunksToIntegers` / `IntegersToChunks`: alias long runs of expensive-to-
//! compare tokens to small integers before handing them to bisect, then
//! rehydrate the result.
//!
//! Aliases are `u64`, assigned in first-seen order starting at zero. Some
//! historical diff-match-patch ports capped this table at 16 bits (65,536
//! tokens), which silently corrupts line-level diffs over that size; `u64`
//! leaves that bug no room to recur.

use std::collections::HashMap;
use std::hash::Hash;

/// Build a shared alias table over `a` and `b`, returning their aliased
/// forms plus the alias -> token reverse map.
pub(crate) fn chunks_to_integers<T: Clone + Eq + Hash>(a: &[T], b: &[T]) -> (Vec<u64>, Vec<u64>, Vec<T>) {
    let mut table: HashMap<T, u64> = HashMap::with_capacity(a.len() + b.len());
    let mut reverse: Vec<T> = Vec::new();
    let ia = a.iter().map(|chunk| alias(chunk, &mut table, &mut reverse)).collect();
    let ib = b.iter().map(|chunk| alias(chunk, &mut table, &mut reverse)).collect();
    (ia, ib, reverse)
}

fn alias<T: Clone + Eq + Hash>(chunk: &T, table: &mut HashMap<T, u64>, reverse: &mut Vec<T>) -> u64 {
    if let Some(&id) = table.get(chunk) {
        return id;
    }
    let id = reverse.len() as u64;
    table.insert(chunk.clone(), id);
    reverse.push(chunk.clone());
    id
}

/// Rehydrate a slice of aliases back into their original tokens.
pub(crate) fn integers_to_chunks<T: Clone>(aliases: &[u64], table: &[T]) -> Vec<T> {
    aliases.iter().map(|&id| table[id as usize].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_aliases() {
        let a = vec!["alpha", "beta", "alpha", "gamma"];
        let b = vec!["beta", "delta"];
        let (ia, ib, table) = chunks_to_integers(&a, &b);
        assert_eq!(integers_to_chunks(&ia, &table), a);
        assert_eq!(integers_to_chunks(&ib, &table), b);
        assert_eq!(ia[0], ia[2]); // both "alpha"
    }

    #[test]
    fn supports_far_more_than_sixteen_bits_of_distinct_tokens() {
        let a: Vec<u32> = (0..70_000).collect();
        let b: Vec<u32> = Vec::new();
        let (ia, _ib, table) = chunks_to_integers(&a, &b);
        assert_eq!(table.len(), 70_000);
        assert_eq!(ia.len(), 70_000);
        assert_eq!(ia.iter().collect::<std::collections::HashSet<_>>().len(), 70_000);
    }
}
