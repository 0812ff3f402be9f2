//! CSV decoding.
//!
//! Turns a byte stream into a single-pass sequence of positional rows. A
//! bad row is an `Err` item, never the end of the stream: callers log it and
//! pull the next one. Only an I/O failure of the underlying reader ends the
//! stream early, after being yielded once.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use thiserror::Error;

/// One data row: its 1-based line number and its fields in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    /// Field at `index`; rows are checked against the decoder's minimum
    /// width before being yielded, so indices below it are always present.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or_default()
    }
}

/// Errors for a single row.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("read failed: {0}")]
    Io(String),
}

impl DecodeError {
    /// Line the error refers to, when known.
    pub fn line(&self) -> Option<u64> {
        match self {
            DecodeError::TooFewFields { line, .. } | DecodeError::Malformed { line, .. } => {
                Some(*line)
            }
            DecodeError::Io(_) => None,
        }
    }
}

/// Lazy row iterator over CSV input.
pub struct CsvDecoder<R> {
    records: StringRecordsIntoIter<R>,
    min_fields: usize,
    finished: bool,
}

impl<R: Read> CsvDecoder<R> {
    /// Decode `reader`, discarding the first row when `has_header` is set.
    ///
    /// The first row read (header included) fixes the expected field count;
    /// rows of any other width are errors. Rows narrower than `min_fields`
    /// are errors as well.
    pub fn new(reader: R, has_header: bool, min_fields: usize) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(has_header)
            .flexible(false)
            .from_reader(reader)
            .into_records();
        Self {
            records,
            min_fields,
            finished: false,
        }
    }

    fn to_row(&self, record: StringRecord) -> Result<Row, DecodeError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() < self.min_fields {
            return Err(DecodeError::TooFewFields {
                line,
                expected: self.min_fields,
                found: record.len(),
            });
        }
        Ok(Row {
            line,
            fields: record.iter().map(str::to_string).collect(),
        })
    }
}

impl<R: Read> Iterator for CsvDecoder<R> {
    type Item = Result<Row, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.records.next()? {
            Ok(record) => Some(self.to_row(record)),
            Err(e) if e.is_io_error() => {
                self.finished = true;
                Some(Err(DecodeError::Io(e.to_string())))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                Some(Err(DecodeError::Malformed {
                    line,
                    message: e.to_string(),
                }))
            }
        }
    }
}
