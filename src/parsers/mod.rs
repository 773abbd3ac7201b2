//! Parser registry for per-field transformation chains.
//!
//! A parser is a unary function over [`RecordValue`]. Mappers refer to parsers
//! by name; the registry resolves those names when a mapper is finalized, so
//! a chain naming an unknown parser never reaches the cleaning step.

pub mod builtins;

use crate::record::RecordValue;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Error type for parser failures
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Input had the wrong shape or could not be converted
    InvalidValue {
        expected: &'static str,
        found: String,
    },
    Custom(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidValue { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ParseError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Trait for parser functions
pub trait ParserFn: Send + Sync {
    /// Transform one value into the next
    fn parse(&self, value: RecordValue) -> Result<RecordValue, ParseError>;
}

/// Simple function-based implementation of ParserFn
impl<F> ParserFn for F
where
    F: Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync,
{
    fn parse(&self, value: RecordValue) -> Result<RecordValue, ParseError> {
        self(value)
    }
}

/// Shared handle to a registered parser
pub type SharedParser = Arc<dyn ParserFn>;

/// Registry of named parsers
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: IndexMap<String, SharedParser>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in parser
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_builtins(&mut registry);
        registry
    }

    /// Register a parser under a name, replacing any previous one
    ///
    /// # Example
    ///
    /// ```
    /// use fieldmap::{ParserRegistry, RecordValue};
    ///
    /// let mut registry = ParserRegistry::new();
    /// registry.register("shout", |value: RecordValue| {
    ///     Ok(match value {
    ///         RecordValue::String(s) => RecordValue::String(format!("{}!", s)),
    ///         other => other,
    ///     })
    /// });
    /// assert!(registry.has_parser("shout"));
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync + 'static,
    {
        self.parsers.insert(name.into(), Arc::new(parser));
    }

    /// Register a parser implemented as a type, or one already shared
    pub fn register_shared(&mut self, name: impl Into<String>, parser: SharedParser) {
        self.parsers.insert(name.into(), parser);
    }

    pub fn get(&self, name: &str) -> Option<SharedParser> {
        self.parsers.get(name).cloned()
    }

    /// Call a registered parser by name
    pub fn call(&self, name: &str, value: RecordValue) -> Result<RecordValue, ParseError> {
        let parser = self
            .parsers
            .get(name)
            .ok_or_else(|| ParseError::Custom(format!("Parser not found: {}", name)))?;
        parser.parse(value)
    }

    pub fn has_parser(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Names of all registered parsers, in registration order
    pub fn list_parsers(&self) -> Vec<String> {
        self.parsers.keys().cloned().collect()
    }

    /// Copy every parser from `other` into this registry
    pub fn merge(&mut self, other: &ParserRegistry) {
        for (name, parser) in &other.parsers {
            self.parsers.insert(name.clone(), Arc::clone(parser));
        }
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.list_parsers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_call_parser() {
        let mut registry = ParserRegistry::new();
        registry.register("double", |value: RecordValue| match value {
            RecordValue::Int(i) => Ok(RecordValue::Int(i * 2)),
            other => Err(ParseError::InvalidValue {
                expected: "integer",
                found: other.type_name().to_string(),
            }),
        });

        assert_eq!(registry.call("double", RecordValue::Int(21)).unwrap(), RecordValue::Int(42));
        assert!(registry.call("double", RecordValue::string("x")).is_err());
    }

    #[test]
    fn test_parser_not_found() {
        let registry = ParserRegistry::new();
        let result = registry.call("nonexistent", RecordValue::Null);
        assert!(matches!(result, Err(ParseError::Custom(_))));
    }

    #[test]
    fn test_builtins_present() {
        let registry = ParserRegistry::with_builtins();
        for name in ["trim", "to_int", "to_float", "to_date", "yes_no_to_bool"] {
            assert!(registry.has_parser(name), "missing builtin {}", name);
        }
    }

    #[test]
    fn test_merge_overrides_same_name() {
        let mut base = ParserRegistry::with_builtins();
        let mut local = ParserRegistry::new();
        local.register("trim", |_: RecordValue| Ok(RecordValue::string("replaced")));

        base.merge(&local);
        assert_eq!(
            base.call("trim", RecordValue::string("  a ")).unwrap(),
            RecordValue::string("replaced")
        );
    }
}
