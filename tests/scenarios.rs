//! The six numbered end-to-end scenarios from the rope/diff/index design
//! notes, run verbatim against the public API.

use std::io::Cursor;
use std::time::SystemTime;

use persist_rope::diff::{self, DiffOptions, MatchOptions};
use persist_rope::index::{index_reader, CsvReader, IndexerConfig, Search};
use persist_rope::Rope;

fn rope_of(s: &str) -> Rope<char> {
    Rope::from_buffer(s.chars().collect())
}

fn text_of(r: &Rope<char>) -> String {
    r.to_buffer().into_iter().collect()
}

#[test]
fn scenario_1_concat_slice_round_trip() {
    let r = rope_of("hello world");
    let rejoined = r.slice(0, 5).unwrap().concat(r.slice(5, 6).unwrap());
    assert_eq!(rejoined, r);
    assert_eq!(r.at(6).unwrap(), 'w');
}

#[test]
fn scenario_2_insert_then_remove() {
    let r = rope_of("abcdef");
    let inserted = r.insert(3, rope_of("XYZ")).unwrap();
    let removed = inserted.remove(3, 3).unwrap();
    assert_eq!(removed, r);
}

#[test]
fn scenario_3_rebalance_under_repeated_append() {
    let mut r: Rope<char> = Rope::empty();
    for _ in 0..10_000 {
        r = r.concat(rope_of("a"));
    }
    assert_eq!(r.length(), 10_000);
    assert!(r.depth() <= 46);
    assert_eq!(text_of(&r), "a".repeat(10_000));
}

#[test]
fn scenario_4_diff_then_apply() {
    let a = rope_of("The quick brown fox");
    let b = rope_of("The slow brown dog");
    let opts = DiffOptions::default();
    let diffs = diff::compute(&a, &b, &opts);
    let patches = diff::make_patches(&diffs, 4);
    let (patched, applied) = diff::apply_patches(&patches, &a, &MatchOptions::default());
    assert_eq!(patched, b);
    assert_eq!(applied, vec![true]);
}

#[test]
fn scenario_5_line_level_diff_with_more_than_65536_unique_lines() {
    let lines: Vec<String> = (0..66_000u32).map(|n| n.to_string()).collect();
    let a: Rope<String> = lines.into_iter().collect();
    let b: Rope<String> = Rope::empty();

    let mut opts = DiffOptions::default();
    opts.hash_chunks = true;
    opts.timeout_seconds = 0.0;

    let diffs = diff::compute(&a, &b, &opts);
    assert_eq!(diffs.len(), 1);
    match &diffs[0] {
        persist_rope::diff::Diff::Delete(chunk) => assert_eq!(chunk.len(), a.length()),
        other => panic!("expected a single Delete diff, got {other:?}"),
    }
}

#[test]
fn scenario_6_bloom_csv_search() {
    let mut csv = String::from("name,city\n");
    for i in 0..9_999 {
        csv.push_str(&format!("user{i},town{i}\n"));
    }
    csv.push_str("alice,Wonderland\n");
    let bytes = csv.into_bytes();

    let config = IndexerConfig::default();
    let index = index_reader("people.csv", SystemTime::now(), Cursor::new(bytes.clone()), &config);

    let query = Search::And(vec![
        Search::value_equals("name", "alice"),
        Search::value_starts_with("city", "Wonder"),
    ]);
    assert!(query.should_search(&index));

    let pages = query.searchable_pages(&index);
    let max_pages = (10_000usize).div_ceil(config.rows_per_page);
    assert!(pages.len() <= max_pages);
    // rows_per_page defaults to 10,000: every row fits one page.
    assert_eq!(pages.len(), 1);

    let headers = index.headers.to_buffer();
    let mut matches = 0usize;
    for page in &pages {
        let slice = &bytes[page.start_byte as usize..page.end_byte as usize];
        let mut reader = CsvReader::new(Cursor::new(slice.to_vec()));
        let mut row_index = page.start_row;
        while let Some(record) = reader.read_record().unwrap() {
            if query.matches(row_index, &record.fields, &headers) {
                matches += 1;
            }
            row_index += 1;
        }
    }
    assert_eq!(matches, 1);
}
