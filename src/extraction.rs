//! Traversal paths over nested records.
//!
//! A traversal path is a delimiter-separated string (`contact.email_address`)
//! addressing a value at arbitrary depth. Resolution never fails: a path that
//! leads nowhere simply resolves to `None`.

use crate::record::{Record, RecordValue};
use std::fmt;

/// Default delimiter between path segments
pub const DEFAULT_DELIMITER: &str = ".";

/// Represents a path to a value in a nested record
///
/// # Examples
///
/// - `email` - top-level key
/// - `contact.email_address` - nested mapping
/// - `phones.[0].number` - first element of a list, then a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// The raw path string
    pub raw: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key (e.g., "contact", "email")
    Field(String),
    /// A list index (e.g., [0], [5])
    Index(usize),
}

impl FieldPath {
    /// Parse a field path with a given delimiter
    ///
    /// # Example
    ///
    /// ```
    /// use fieldmap::FieldPath;
    ///
    /// let path = FieldPath::parse("user.address.city", ".");
    /// assert_eq!(path.segments.len(), 3);
    /// ```
    pub fn parse(path: &str, delimiter: &str) -> Self {
        let segments = path
            .split(delimiter)
            .map(|s| {
                if s.len() > 2 && s.starts_with('[') && s.ends_with(']') {
                    let inner = &s[1..s.len() - 1];
                    // Only canonical indexes, so the segment text can be rebuilt
                    if let Ok(index) = inner.parse::<usize>() {
                        if index.to_string() == inner {
                            return PathSegment::Index(index);
                        }
                    }
                }
                PathSegment::Field(s.to_string())
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// Create a field path from a dotted string (common format)
    pub fn from_dotted(path: &str) -> Self {
        Self::parse(path, DEFAULT_DELIMITER)
    }

    /// True when any segment is an empty key (`a..b`, `.a`, `a.`)
    pub fn has_empty_segment(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, PathSegment::Field(name) if name.is_empty()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Trait for values that can be walked with a field path
pub trait Extractor {
    /// Extract the value at the given path
    ///
    /// Returns `Some(value)` if the path exists, `None` otherwise
    fn extract(&self, path: &FieldPath) -> Option<&RecordValue>;

    /// Extract a value and clone it, treating absence as `Null`
    fn extract_or_null(&self, path: &FieldPath) -> RecordValue {
        self.extract(path).cloned().unwrap_or(RecordValue::Null)
    }
}

impl Extractor for Record {
    fn extract(&self, path: &FieldPath) -> Option<&RecordValue> {
        let (first, rest) = path.segments.split_first()?;
        let start = match first {
            PathSegment::Field(name) => self.get(name)?,
            PathSegment::Index(index) => self.get(&index_key(*index))?,
        };
        walk(start, rest)
    }
}

impl Extractor for RecordValue {
    fn extract(&self, path: &FieldPath) -> Option<&RecordValue> {
        walk(self, &path.segments)
    }
}

fn index_key(index: usize) -> String {
    format!("[{}]", index)
}

fn walk<'a>(start: &'a RecordValue, segments: &[PathSegment]) -> Option<&'a RecordValue> {
    let mut current = start;
    for segment in segments {
        current = match (segment, current) {
            (PathSegment::Field(name), RecordValue::Map(map)) => map.get(name)?,
            (PathSegment::Index(index), RecordValue::List(items)) => items.get(*index)?,
            // A mapping may use the bracketed text as a literal key
            (PathSegment::Index(index), RecordValue::Map(map)) => map.get(&index_key(*index))?,
            // Null, scalars, or a segment of the wrong kind
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve a dotted traversal path against a record.
///
/// # Example
///
/// ```
/// use fieldmap::{resolve, Record, RecordValue};
///
/// let record: Record = serde_json::from_str(r#"{"contact": {"email": "a@b.com"}}"#).unwrap();
/// assert_eq!(resolve(&record, "contact.email"), Some(&RecordValue::string("a@b.com")));
/// assert_eq!(resolve(&record, "contact.phone"), None);
/// ```
pub fn resolve<'a>(root: &'a Record, path: &str) -> Option<&'a RecordValue> {
    resolve_with(root, path, DEFAULT_DELIMITER)
}

/// Resolve a traversal path using a custom delimiter
pub fn resolve_with<'a>(root: &'a Record, path: &str, delimiter: &str) -> Option<&'a RecordValue> {
    root.extract(&FieldPath::parse(path, delimiter))
}
