//! Reading raw records and writing cleaned output.
//!
//! Input is NDJSON, one JSON object per line. Output is either NDJSON or a
//! single JSON array.

use crate::record::{Record, RecordValue};
use serde::Serialize;
use std::io::{BufRead, Write};

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
    /// An input line held valid JSON that is not an object
    NotAnObject { line: usize },
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
            SerializationError::NotAnObject { line } => {
                write!(f, "Line {} is not a JSON object", line)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

/// Output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Ndjson,
    /// A single JSON array
    Json,
}

/// Writes serializable items in the chosen [`OutputFormat`]
pub struct RecordWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    first: bool,
}

impl<W: Write> RecordWriter<W> {
    /// Create a writer; JSON output opens its array immediately
    pub fn new(mut writer: W, format: OutputFormat) -> Result<Self, SerializationError> {
        if format == OutputFormat::Json {
            write!(writer, "[")?;
        }
        Ok(Self {
            writer,
            format,
            first: true,
        })
    }

    /// Write a single item
    pub fn write<T: Serialize>(&mut self, item: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(item)?;
        match self.format {
            OutputFormat::Ndjson => writeln!(self.writer, "{}", json)?,
            OutputFormat::Json => {
                if !self.first {
                    write!(self.writer, ",")?;
                }
                write!(self.writer, "{}", json)?;
            }
        }
        self.first = false;
        Ok(())
    }

    /// Close the array (JSON) and flush
    pub fn finish(mut self) -> Result<W, SerializationError> {
        if self.format == OutputFormat::Json {
            writeln!(self.writer, "]")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Reads records from NDJSON input, skipping blank lines
pub struct NdjsonReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> NdjsonReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for NdjsonReader<R> {
    /// 1-based line number and the record on it
    type Item = Result<(usize, Record), SerializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }

            let line_no = self.line;
            // Parsed straight into RecordValue so key order survives
            let parsed = match serde_json::from_str::<RecordValue>(&line) {
                Ok(RecordValue::Map(record)) => Ok((line_no, record)),
                Ok(_) => Err(SerializationError::NotAnObject { line: line_no }),
                Err(e) => Err(e.into()),
            };
            return Some(parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_ndjson_writer() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Ndjson).unwrap();
        writer.write(&json!({"name": "Alice"})).unwrap();
        writer.write(&json!({"name": "Bob"})).unwrap();
        let buffer = writer.finish().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\"name\":\"Alice\"}\n{\"name\":\"Bob\"}\n");
    }

    #[test]
    fn test_json_array_writer() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json).unwrap();
        writer.write(&json!({"a": 1})).unwrap();
        writer.write(&json!({"a": 2})).unwrap();
        let buffer = writer.finish().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "[{\"a\":1},{\"a\":2}]\n");
    }

    #[test]
    fn test_empty_json_array() {
        let writer = RecordWriter::new(Vec::new(), OutputFormat::Json).unwrap();
        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(output, "[]\n");
    }

    #[test]
    fn test_ndjson_reader_skips_blank_lines() {
        let input = "{\"a\": 1}\n\n   \n{\"a\": 2}\n";
        let records: Vec<_> = NdjsonReader::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 1);
        assert_eq!(records[1].0, 4);
        assert_eq!(records[1].1.get("a"), Some(&RecordValue::Int(2)));
    }

    #[test]
    fn test_ndjson_reader_keeps_key_order() {
        let input = "{\"zeta\": 1, \"alpha\": {\"y\": 2, \"b\": 3}}\n";
        let mut reader = NdjsonReader::new(Cursor::new(input));
        let (_, record) = reader.next().unwrap().unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        let nested: Vec<&str> = record["alpha"]
            .as_map()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(nested, vec!["y", "b"]);
    }

    #[test]
    fn test_ndjson_reader_rejects_non_objects() {
        let input = "{\"a\": 1}\n[1, 2]\n";
        let mut reader = NdjsonReader::new(Cursor::new(input));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next().unwrap(),
            Err(SerializationError::NotAnObject { line: 2 })
        ));
    }

    #[test]
    fn test_ndjson_reader_invalid_json() {
        let mut reader = NdjsonReader::new(Cursor::new("{not json}\n"));
        assert!(matches!(reader.next().unwrap(), Err(SerializationError::JsonError(_))));
    }
}
