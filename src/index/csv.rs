//! A minimal CSV tokenizer: comma field separator, double-quote literal
//! toggle, CR/LF/CRLF row terminator. No corpus crate in this pack
//! depends on `csv`, so this is hand-written; the running byte-offset
//! bookkeeping is the same shape as a line-offset cache, just computed
//! incrementally instead of pre-scanned.
//!
//! Byte offsets are tracked precisely so callers building a page index
//! can record exact on-disk boundaries. An unterminated quote at EOF is
//! not an error: `read_record` returns `Ok(None)` and [`CsvReader::is_malformed`]
//! becomes `true`, matching the propagation policy that malformed input
//! is data, not a `Result::Err`.

use std::io::{self, Read};

/// One tokenized CSV row, with the byte range `[start_byte, end_byte)` it
/// occupied in the source (terminator included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub fields: Vec<String>,
    pub start_byte: u64,
    pub end_byte: u64,
}

pub struct CsvReader<R> {
    bytes: io::Bytes<R>,
    peeked: Option<u8>,
    pos: u64,
    malformed: bool,
}

impl<R: Read> CsvReader<R> {
    pub fn new(inner: R) -> Self {
        CsvReader { bytes: inner.bytes(), peeked: None, pos: 0, malformed: false }
    }

    /// Bytes consumed so far.
    pub fn byte_offset(&self) -> u64 {
        self.pos
    }

    /// Set once an unterminated quoted field hits EOF. Once true,
    /// `read_record` always returns `Ok(None)`.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            self.pos += 1;
            return Ok(Some(b));
        }
        match self.bytes.next() {
            None => Ok(None),
            Some(Ok(b)) => {
                self.pos += 1;
                Ok(Some(b))
            }
            Some(Err(e)) => Err(e),
        }
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = match self.bytes.next() {
                None => None,
                Some(Ok(b)) => Some(b),
                Some(Err(e)) => return Err(e),
            };
        }
        Ok(self.peeked)
    }

    /// Read the next row, or `Ok(None)` at a clean EOF (an empty trailing
    /// line after the last terminator is suppressed, not returned as a
    /// one-field-empty-string row).
    pub fn read_record(&mut self) -> io::Result<Option<CsvRecord>> {
        if self.malformed {
            return Ok(None);
        }

        let start = self.pos;
        let mut fields = Vec::new();
        let mut field = Vec::new();
        let mut in_quotes = false;
        let mut saw_byte = false;

        loop {
            match self.next_byte()? {
                None => {
                    if in_quotes {
                        self.malformed = true;
                        return Ok(None);
                    }
                    if !saw_byte {
                        return Ok(None);
                    }
                    fields.push(String::from_utf8_lossy(&field).into_owned());
                    return Ok(Some(CsvRecord { fields, start_byte: start, end_byte: self.pos }));
                }
                Some(b) => {
                    saw_byte = true;
                    match b {
                        b'"' if in_quotes => {
                            if self.peek_byte()? == Some(b'"') {
                                self.next_byte()?;
                                field.push(b'"');
                            } else {
                                in_quotes = false;
                            }
                        }
                        b'"' => in_quotes = true,
                        b',' if !in_quotes => {
                            fields.push(String::from_utf8_lossy(&field).into_owned());
                            field.clear();
                        }
                        b'\r' if !in_quotes => {
                            if self.peek_byte()? == Some(b'\n') {
                                self.next_byte()?;
                            }
                            fields.push(String::from_utf8_lossy(&field).into_owned());
                            return Ok(Some(CsvRecord { fields, start_byte: start, end_byte: self.pos }));
                        }
                        b'\n' if !in_quotes => {
                            fields.push(String::from_utf8_lossy(&field).into_owned());
                            return Ok(Some(CsvRecord { fields, start_byte: start, end_byte: self.pos }));
                        }
                        _ => field.push(b),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records(input: &str) -> (Vec<Vec<String>>, bool) {
        let mut reader = CsvReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut rows = Vec::new();
        while let Some(record) = reader.read_record().unwrap() {
            rows.push(record.fields);
        }
        (rows, reader.is_malformed())
    }

    #[test]
    fn splits_simple_rows() {
        let (rows, malformed) = records("name,city\nalice,wonderland\nbob,oz\n");
        assert!(!malformed);
        assert_eq!(rows, vec![
            vec!["name".to_string(), "city".to_string()],
            vec!["alice".to_string(), "wonderland".to_string()],
            vec!["bob".to_string(), "oz".to_string()],
        ]);
    }

    #[test]
    fn handles_quoted_commas_and_crlf() {
        let (rows, malformed) = records("a,b\r\n\"hello, world\",2\r\n");
        assert!(!malformed);
        assert_eq!(rows[1], vec!["hello, world".to_string(), "2".to_string()]);
    }

    #[test]
    fn doubled_quotes_are_a_literal_quote() {
        let (rows, _) = records("a\n\"she said \"\"hi\"\"\"\n");
        assert_eq!(rows[1], vec!["she said \"hi\"".to_string()]);
    }

    #[test]
    fn trailing_newline_does_not_produce_an_empty_row() {
        let (rows, _) = records("a,b\n1,2\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn missing_trailing_newline_still_yields_final_row() {
        let (rows, malformed) = records("a,b\n1,2");
        assert!(!malformed);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn unterminated_quote_at_eof_is_marked_malformed_not_an_error() {
        let (rows, malformed) = records("a,b\n\"unterminated,2");
        assert_eq!(rows.len(), 1);
        assert!(malformed);
    }

    #[test]
    fn byte_offsets_match_source_positions() {
        let input = "a,b\n1,2\n";
        let mut reader = CsvReader::new(Cursor::new(input.as_bytes().to_vec()));
        let first = reader.read_record().unwrap().unwrap();
        assert_eq!((first.start_byte, first.end_byte), (0, 4));
        let second = reader.read_record().unwrap().unwrap();
        assert_eq!((second.start_byte, second.end_byte), (4, 8));
    }
}
