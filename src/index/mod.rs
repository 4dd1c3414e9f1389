//! Component E: the paged, bloom-filter-indexed CSV search core.
//!
//! Three pieces, leaves first:
//!
//! - [`bloom`]: the positional bloom filter itself.
//! - [`csv`]: the minimal CSV tokenizer bloom-indexing streams over.
//! - [`indexer`]: streams a CSV file into a [`FileIndex`] — one
//!   [`ColumnIndex`] (a [`crate::Rope`] of [`RowRange`]) per header.
//!
//! This module adds the fourth piece: [`Search`], the closed, tagged tree
//! of query leaves and `And`/`Or` combinators a caller composes to find
//! rows without a full scan.
//!
//! # Wire format
//!
//! No `Serialize`/`Deserialize` ships here (see the crate's JSON
//! non-goal), but the shapes above line up field-for-field with the
//! schema external callers speak:
//!
//! ```text
//! { "RowsPerPage": <int>, "BloomFilterSize": <int>, "HashIterations": <int>,
//!   "SupportedOperations": <bitfield>, "LastCommitRef": <string | null>,
//!   "Files": [
//!     { "FilePath": <string>, "LastModifiedUtc": <ISO8601>,
//!       "Columns": [ { "Name": <string>, "Ranges": [
//!         { "s": <startByte>, "e": <endByte>, "sr": <startRow>, "er": <endRow>,
//!           "f": <base64(runlength(bits))> }
//!       ] } ] }
//!   ] }
//! ```
//!
//! `RowsPerPage`/`BloomFilterSize`/`HashIterations`/`SupportedOperations`
//! are [`indexer::IndexerConfig`]'s fields; they live at the root and are
//! not repeated per file or per page. `Files[].Columns[].Ranges[]` is
//! exactly one [`ColumnIndex`]'s flattened pages; `f` is
//! [`bloom::BloomFilter::to_rle_base64`]'s output.

pub mod bloom;
pub mod csv;
pub mod indexer;

use std::collections::BTreeMap;

pub use bloom::{BloomFilter, SupportedOps};
pub use csv::{CsvReader, CsvRecord};
pub use indexer::{index_file, index_reader, ColumnIndex, FileIndex, FileIndexCache, IndexerConfig, RowRange};

/// A composable search criterion over a [`FileIndex`].
///
/// A closed, small set of leaves and combinators, matching the spec's
/// "avoid open-world polymorphism" design note: rather than an
/// open trait callers could implement arbitrary leaves against, `Search`
/// is a plain enum with one visitor-style evaluator (the three methods
/// below) dispatching over it.
#[derive(Debug, Clone, PartialEq)]
pub enum Search {
    /// Exact match on one column's value.
    ValueEquals { column: String, value: String },
    /// Prefix match on one column's value.
    ValueStartsWith { column: String, value: String },
    /// Row indices in `[start, end)`, independent of column content.
    RowsBetween { start: usize, end: usize },
    /// Matches iff every child matches.
    And(Vec<Search>),
    /// Matches iff any child matches.
    Or(Vec<Search>),
}

impl Search {
    pub fn value_equals(column: impl Into<String>, value: impl Into<String>) -> Search {
        Search::ValueEquals { column: column.into(), value: value.into() }
    }

    pub fn value_starts_with(column: impl Into<String>, value: impl Into<String>) -> Search {
        Search::ValueStartsWith { column: column.into(), value: value.into() }
    }

    pub fn rows_between(start: usize, end: usize) -> Search {
        Search::RowsBetween { start, end }
    }

    /// Does `index` carry the columns this criterion (and all its
    /// children) need in order to be evaluated at all?
    ///
    /// `And` requires every child's column to be present (a missing
    /// column makes the whole conjunction unanswerable); `Or` only needs
    /// one child answerable, since the rest can simply contribute no
    /// matches.
    pub fn should_search(&self, index: &FileIndex) -> bool {
        match self {
            Search::ValueEquals { column, .. } | Search::ValueStartsWith { column, .. } => {
                index.columns.contains_key(column)
            }
            Search::RowsBetween { .. } => true,
            Search::And(children) => children.iter().all(|c| c.should_search(index)),
            Search::Or(children) => children.iter().any(|c| c.should_search(index)),
        }
    }

    /// The subset of `index`'s pages whose bloom filter might match this
    /// criterion, ascending by `start_byte`, deduplicated.
    ///
    /// Bloom filters never produce false negatives, so this is always a
    /// superset of the pages that actually match; [`Search::matches`]
    /// verifies each candidate row exactly. A leaf whose required
    /// operation isn't in the filter's `supported_ops` (`Unsupported`)
    /// can't rule anything out either, so it conservatively keeps the
    /// page rather than silently dropping rows that might match.
    pub fn searchable_pages(&self, index: &FileIndex) -> Vec<RowRange> {
        match self {
            Search::ValueEquals { column, value } => {
                pages_matching(index, column, |filter| filter.might_equal(value).unwrap_or(true))
            }
            Search::ValueStartsWith { column, value } => {
                pages_matching(index, column, |filter| filter.might_start_with(value).unwrap_or(true))
            }
            Search::RowsBetween { start, end } => representative_pages(index)
                .into_iter()
                .filter(|page| page.start_row < *end && *start < page.end_row)
                .collect(),
            Search::And(children) => intersect(children.iter().map(|c| c.searchable_pages(index))),
            Search::Or(children) => union(children.iter().map(|c| c.searchable_pages(index))),
        }
    }

    /// Exact, non-probabilistic verification: does row `row_index` -- whose
    /// cell values are `values`, aligned position-for-position with
    /// `headers` -- satisfy this criterion?
    pub fn matches(&self, row_index: usize, values: &[String], headers: &[String]) -> bool {
        match self {
            Search::ValueEquals { column, value } => {
                cell(column, values, headers).map(|v| v == value).unwrap_or(false)
            }
            Search::ValueStartsWith { column, value } => {
                cell(column, values, headers).map(|v| v.starts_with(value.as_str())).unwrap_or(false)
            }
            Search::RowsBetween { start, end } => row_index >= *start && row_index < *end,
            Search::And(children) => children.iter().all(|c| c.matches(row_index, values, headers)),
            Search::Or(children) => children.iter().any(|c| c.matches(row_index, values, headers)),
        }
    }
}

fn cell<'a>(column: &str, values: &'a [String], headers: &[String]) -> Option<&'a str> {
    headers.iter().position(|h| h == column).and_then(|i| values.get(i)).map(|s| s.as_str())
}

fn pages_matching(index: &FileIndex, column: &str, might: impl Fn(&BloomFilter) -> bool) -> Vec<RowRange> {
    match index.columns.get(column) {
        Some(ranges) => ranges.iter().filter(|range| might(&range.filter)).collect(),
        None => Vec::new(),
    }
}

/// Any one column's page boundaries, used by `RowsBetween`: every column
/// in a [`FileIndex`] shares the same row/byte windows (the indexer
/// closes all columns' pages together), so the first column stands in
/// for "the file's pages" when no column-specific filter applies.
fn representative_pages(index: &FileIndex) -> Vec<RowRange> {
    index.columns.values().next().map(|ranges| ranges.iter().collect()).unwrap_or_default()
}

fn by_start_byte(pages: Vec<RowRange>) -> BTreeMap<u64, RowRange> {
    pages.into_iter().map(|p| (p.start_byte, p)).collect()
}

fn intersect(mut sets: impl Iterator<Item = Vec<RowRange>>) -> Vec<RowRange> {
    let mut acc = match sets.next() {
        Some(first) => by_start_byte(first),
        None => return Vec::new(),
    };
    for set in sets {
        let keys: std::collections::BTreeSet<u64> = by_start_byte(set).into_keys().collect();
        acc.retain(|k, _| keys.contains(k));
    }
    acc.into_values().collect()
}

fn union(sets: impl Iterator<Item = Vec<RowRange>>) -> Vec<RowRange> {
    let mut acc = BTreeMap::new();
    for set in sets {
        acc.extend(by_start_byte(set));
    }
    acc.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::SystemTime;

    fn sample_index() -> FileIndex {
        let mut s = String::from("name,city\n");
        for i in 0..9_999 {
            s.push_str(&format!("user{i},town{i}\n"));
        }
        s.push_str("alice,Wonderland\n");
        let config = IndexerConfig { rows_per_page: 2_500, ..IndexerConfig::default() };
        index_reader("test.csv", SystemTime::now(), Cursor::new(s.into_bytes()), &config)
    }

    #[test]
    fn should_search_reflects_column_presence() {
        let index = sample_index();
        assert!(Search::value_equals("name", "alice").should_search(&index));
        assert!(!Search::value_equals("country", "atlantis").should_search(&index));
        assert!(Search::rows_between(0, 10).should_search(&index));
    }

    #[test]
    fn and_intersects_or_unions_pages() {
        let index = sample_index();
        let name_pages = Search::value_equals("name", "alice").searchable_pages(&index);
        let city_pages = Search::value_starts_with("city", "Wonder").searchable_pages(&index);

        let anded = Search::And(vec![
            Search::value_equals("name", "alice"),
            Search::value_starts_with("city", "Wonder"),
        ])
        .searchable_pages(&index);
        assert!(anded.len() <= name_pages.len().min(city_pages.len()));

        let ored = Search::Or(vec![
            Search::value_equals("name", "alice"),
            Search::value_starts_with("city", "Wonder"),
        ])
        .searchable_pages(&index);
        assert!(ored.len() >= anded.len());
    }

    #[test]
    fn matches_verifies_exact_row_content() {
        let headers = vec!["name".to_string(), "city".to_string()];
        let row = vec!["alice".to_string(), "Wonderland".to_string()];
        let query = Search::And(vec![
            Search::value_equals("name", "alice"),
            Search::value_starts_with("city", "Wonder"),
        ]);
        assert!(query.matches(10_000, &row, &headers));
        assert!(!Search::value_equals("name", "bob").matches(10_000, &row, &headers));
    }

    #[test]
    fn rows_between_matches_by_index_only() {
        let headers = vec!["name".to_string()];
        let row = vec!["anyone".to_string()];
        assert!(Search::rows_between(5, 15).matches(10, &row, &headers));
        assert!(!Search::rows_between(5, 15).matches(20, &row, &headers));
    }

    #[test]
    fn end_to_end_bloom_csv_search_scenario() {
        let index = sample_index();
        let query = Search::And(vec![
            Search::value_equals("name", "alice"),
            Search::value_starts_with("city", "Wonder"),
        ]);
        assert!(query.should_search(&index));
        let pages = query.searchable_pages(&index);
        assert!(!pages.is_empty());

        // Re-scan each candidate page and verify exactly one matching row.
        let mut s = String::from("name,city\n");
        for i in 0..9_999 {
            s.push_str(&format!("user{i},town{i}\n"));
        }
        s.push_str("alice,Wonderland\n");
        let bytes = s.into_bytes();

        let mut found = 0usize;
        for page in &pages {
            let slice = &bytes[page.start_byte as usize..page.end_byte as usize];
            let mut reader = CsvReader::new(Cursor::new(slice.to_vec()));
            let mut row_index = page.start_row;
            while let Some(record) = reader.read_record().unwrap() {
                if query.matches(row_index, &record.fields, &index.headers.to_buffer()) {
                    found += 1;
                }
                row_index += 1;
            }
        }
        assert_eq!(found, 1);
    }
}
