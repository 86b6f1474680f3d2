//! Streaming CSV reader producing [`RawRow`]s in source order.
//!
//! Rows are pulled one at a time from the underlying reader, so the file is
//! never held in memory as a whole. Cells are decoded with the configured
//! [`CsvEncoding`]; a row whose field count disagrees with the header is a
//! parse error and stops the stream.

use crate::order::RawRow;
use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Text encoding of uploaded CSV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CsvEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "latin1", alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

impl FromStr for CsvEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "binary" => Ok(Self::Latin1),
            other => Err(format!("unsupported CSV encoding '{}'", other)),
        }
    }
}

impl fmt::Display for CsvEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf-8"),
            Self::Latin1 => write!(f, "latin1"),
        }
    }
}

impl CsvEncoding {
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            // Latin-1 bytes map one-to-one onto the first 256 code points
            Self::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Errors that abort a CSV stream
#[derive(Error, Debug)]
pub enum CsvReadError {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: cell is not valid {encoding} text")]
    Encoding { line: u64, encoding: CsvEncoding },

    #[error("missing header row")]
    MissingHeader,
}

/// Iterator over the data rows of a CSV source.
pub struct CsvOrderReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    encoding: CsvEncoding,
    record: ByteRecord,
    finished: bool,
}

impl CsvOrderReader<File> {
    /// Open a CSV file for streaming.
    pub fn open<P: AsRef<Path>>(path: P, encoding: CsvEncoding) -> Result<Self, CsvReadError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file, encoding)
    }
}

impl<R: Read> CsvOrderReader<R> {
    /// Wrap any reader; the header row is read immediately.
    pub fn from_reader(source: R, encoding: CsvEncoding) -> Result<Self, CsvReadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(source);

        let header_record = reader.byte_headers()?.clone();
        if header_record.is_empty() {
            return Err(CsvReadError::MissingHeader);
        }
        let headers = header_record
            .iter()
            .map(|cell| {
                encoding
                    .decode(cell)
                    .ok_or(CsvReadError::Encoding { line: 1, encoding })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            reader,
            headers,
            encoding,
            record: ByteRecord::new(),
            finished: false,
        })
    }

    /// Column names as read from the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn decode_record(&self) -> Result<RawRow, CsvReadError> {
        let line = self.record.position().map(|p| p.line()).unwrap_or_default();
        let values = self
            .record
            .iter()
            .map(|cell| {
                self.encoding.decode(cell).ok_or(CsvReadError::Encoding {
                    line,
                    encoding: self.encoding,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawRow::from_pairs(&self.headers, values))
    }
}

impl<R: Read> Iterator for CsvOrderReader<R> {
    type Item = Result<RawRow, CsvReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {
                let row = self.decode_record();
                if row.is_err() {
                    self.finished = true;
                }
                Some(row)
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }
}
