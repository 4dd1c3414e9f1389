//! Builds [`FileIndex`] values by streaming a CSV file's rows into
//! per-column, per-page bloom filters.
//!
//! The file map (`index(path)` is idempotent, keyed by path, serialising
//! concurrent indexing of the same path) is a [`dashmap::DashMap`] —
//! several pack manifests reach for `dashmap` for exactly this "concurrent
//! map keyed by an external identity" shape.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

use super::bloom::{BloomFilter, SupportedOps};
use super::csv::CsvReader;
use crate::Rope;

/// Root-level settings shared by every file in an index: bloom filter
/// size, hash count, and supported operations are not repeated per file
/// or per page, only here.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub rows_per_page: usize,
    pub bloom_filter_size: usize,
    pub hash_count: u32,
    pub supported_ops: SupportedOps,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            rows_per_page: 10_000,
            bloom_filter_size: 2048,
            hash_count: 4,
            supported_ops: SupportedOps::CONTAINS | SupportedOps::EQUALS,
        }
    }
}

/// A byte-and-row window over one column's page, carrying that page's
/// bloom filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRange {
    pub start_byte: u64,
    pub end_byte: u64,
    pub start_row: usize,
    pub end_row: usize,
    pub filter: BloomFilter,
}

/// One column's pages, ordered by `start_byte`.
pub type ColumnIndex = Rope<RowRange>;

/// The index built from one CSV file: its header order plus one
/// [`ColumnIndex`] per header.
#[derive(Debug, Clone)]
pub struct FileIndex {
    pub path: PathBuf,
    pub last_modified_utc: SystemTime,
    pub headers: Rope<String>,
    pub columns: HashMap<String, ColumnIndex>,
    /// Set when the file was only partially indexed: an I/O error or an
    /// unterminated quote truncated the stream. Never an `Err` — per the
    /// propagation policy this is data, not a fault.
    pub warning: Option<String>,
}

struct Window {
    start_byte: u64,
    start_row: usize,
    filter: BloomFilter,
}

fn fresh_window(start_byte: u64, start_row: usize, config: &IndexerConfig) -> Window {
    Window {
        start_byte,
        start_row,
        filter: BloomFilter::new(config.bloom_filter_size, config.hash_count, config.supported_ops),
    }
}

fn close_page(
    pages: &mut HashMap<String, Vec<RowRange>>,
    windows: &mut HashMap<String, Window>,
    current_row: usize,
    current_byte: u64,
    config: &IndexerConfig,
) {
    for (header, window) in windows.iter_mut() {
        let closed = std::mem::replace(window, fresh_window(current_byte, current_row, config));
        pages.entry(header.clone()).or_default().push(RowRange {
            start_byte: closed.start_byte,
            end_byte: current_byte,
            start_row: closed.start_row,
            end_row: current_row,
            filter: closed.filter,
        });
    }
}

/// Stream `reader` as a CSV file and build its [`FileIndex`].
pub fn index_reader<R: Read>(
    path: impl Into<PathBuf>,
    last_modified_utc: SystemTime,
    reader: R,
    config: &IndexerConfig,
) -> FileIndex {
    let path = path.into();
    let mut csv = CsvReader::new(reader);

    let headers = match csv.read_record() {
        Ok(Some(record)) => record.fields,
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!("{}: failed to read CSV headers: {e}", path.display());
            return FileIndex {
                path,
                last_modified_utc,
                headers: Rope::empty(),
                columns: HashMap::new(),
                warning: Some(format!("failed to read headers: {e}")),
            };
        }
    };

    let mut pages: HashMap<String, Vec<RowRange>> = HashMap::new();
    let mut windows: HashMap<String, Window> =
        headers.iter().map(|h| (h.clone(), fresh_window(csv.byte_offset(), 0, config))).collect();

    let mut row_index = 0usize;
    let mut rows_in_page = 0usize;
    let mut warning = None;

    loop {
        match csv.read_record() {
            Ok(None) => break,
            Err(e) => {
                let msg = format!("I/O error at byte {}: {e}", csv.byte_offset());
                log::warn!("{}: {msg}", path.display());
                warning = Some(msg);
                break;
            }
            Ok(Some(record)) => {
                for (i, header) in headers.iter().enumerate() {
                    if let (Some(value), Some(window)) = (record.fields.get(i), windows.get_mut(header)) {
                        window.filter.add(value);
                    }
                }
                row_index += 1;
                rows_in_page += 1;
                if rows_in_page == config.rows_per_page {
                    close_page(&mut pages, &mut windows, row_index, record.end_byte, config);
                    rows_in_page = 0;
                }
            }
        }
    }

    if warning.is_none() && csv.is_malformed() {
        let msg = format!(
            "malformed CSV input at byte {}; remainder of file skipped",
            csv.byte_offset()
        );
        log::warn!("{}: {msg}", path.display());
        warning = Some(msg);
    }

    if rows_in_page > 0 {
        close_page(&mut pages, &mut windows, row_index, csv.byte_offset(), config);
    }

    let columns = pages.into_iter().map(|(name, ranges)| (name, ranges.into_iter().collect())).collect();

    FileIndex { path, last_modified_utc, headers: headers.into_iter().collect(), columns, warning }
}

/// Build a [`FileIndex`] by opening `path` directly.
pub fn index_file(path: impl AsRef<Path>, config: &IndexerConfig) -> std::io::Result<FileIndex> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;
    let last_modified = metadata.modified()?;
    let file = std::fs::File::open(path)?;
    Ok(index_reader(path, last_modified, file, config))
}

/// A concurrent, path-keyed cache of [`FileIndex`] values. `index` is
/// idempotent: re-indexing a path whose on-disk `last_modified` hasn't
/// advanced past the cached entry returns the cached value instead of
/// re-reading the file; `DashMap`'s per-shard locking serialises
/// concurrent indexing attempts for the same path.
#[derive(Default)]
pub struct FileIndexCache {
    files: DashMap<PathBuf, FileIndex>,
}

impl FileIndexCache {
    pub fn new() -> Self {
        FileIndexCache { files: DashMap::new() }
    }

    /// Index `path`, reusing the cached entry if its `last_modified_utc`
    /// is not newer than what's on disk now.
    pub fn index(&self, path: impl AsRef<Path>, config: &IndexerConfig) -> std::io::Result<FileIndex> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let last_modified = metadata.modified()?;

        if let Some(cached) = self.files.get(path) {
            if cached.last_modified_utc >= last_modified {
                return Ok(cached.clone());
            }
        }

        let file = std::fs::File::open(path)?;
        let index = index_reader(path, last_modified, file, config);
        self.files.insert(path.to_path_buf(), index.clone());
        Ok(index)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<FileIndex> {
        self.files.get(path.as_ref()).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn csv_bytes() -> Vec<u8> {
        let mut s = String::from("name,city\n");
        for i in 0..9_999 {
            s.push_str(&format!("user{i},town{i}\n"));
        }
        s.push_str("alice,Wonderland\n");
        s.into_bytes()
    }

    #[test]
    fn pages_are_closed_on_rows_per_page_boundary() {
        let config = IndexerConfig { rows_per_page: 2_500, ..IndexerConfig::default() };
        let index = index_reader("test.csv", SystemTime::now(), Cursor::new(csv_bytes()), &config);
        assert!(index.warning.is_none());
        let name_pages = index.columns.get("name").unwrap();
        assert_eq!(name_pages.length(), 4);
        let last = name_pages.at(3).unwrap();
        assert!(last.filter.might_contain("alice").unwrap());
    }

    #[test]
    fn large_rows_per_page_yields_a_single_page() {
        let config = IndexerConfig { rows_per_page: 1_000_000, ..IndexerConfig::default() };
        let index = index_reader("test.csv", SystemTime::now(), Cursor::new(csv_bytes()), &config);
        assert_eq!(index.columns.get("city").unwrap().length(), 1);
    }

    #[test]
    fn cache_reuses_unchanged_files() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("persist-rope-indexer-test-{}.csv", std::process::id()));
        std::fs::write(&path, csv_bytes()).unwrap();

        let cache = FileIndexCache::new();
        let config = IndexerConfig::default();
        let first = cache.index(&path, &config).unwrap();
        let second = cache.index(&path, &config).unwrap();
        assert_eq!(first.last_modified_utc, second.last_modified_utc);

        std::fs::remove_file(&path).ok();
    }
}
