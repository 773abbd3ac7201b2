//! Mapper declarations.
//!
//! A declaration carries a mapper's configuration exactly as it was written,
//! either through the builder methods or in a YAML file:
//!
//! ```yaml
//! mapper:
//!   name: UserMapper
//!   excluded_fields: [nickname]
//!   key_mappings:
//!     email: contact.email_address
//!   parsers:
//!     age: [trim, to_int]
//!   normalize_strings: true
//! ```
//!
//! Options stay as raw YAML values until [`MapperDeclaration::finalize`] runs
//! the self-checks, so a badly shaped option is reported as a configuration
//! error instead of a deserialization failure.

use crate::error::ConfigError;
use crate::extraction::DEFAULT_DELIMITER;
use crate::parsers::{ParseError, ParserRegistry};
use crate::record::RecordValue;
use crate::schema::EntitySchema;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Names of the options a declaration accepts
pub const OPTION_NAMES: &[&str] = &[
    "excluded_fields",
    "key_mappings",
    "parsers",
    "normalize_strings",
    "key_case",
    "delimiter",
];

/// Wrapper for mapper YAML structure
#[derive(Debug, Deserialize)]
struct MapperFile {
    mapper: Mapping,
}

/// Configuration of a mapper type, as declared
#[derive(Debug, Clone)]
pub struct MapperDeclaration {
    pub(crate) name: String,
    pub(crate) schema: Option<Arc<EntitySchema>>,
    pub(crate) excluded_fields: Value,
    pub(crate) key_mappings: Value,
    pub(crate) parsers: Value,
    pub(crate) normalize_strings: Value,
    pub(crate) key_case: Value,
    pub(crate) delimiter: Value,
    pub(crate) registry: ParserRegistry,
}

impl MapperDeclaration {
    /// Start a declaration with default options and the built-in parsers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            excluded_fields: Value::Sequence(Vec::new()),
            key_mappings: Value::Mapping(Mapping::new()),
            parsers: Value::Mapping(Mapping::new()),
            normalize_strings: Value::Bool(true),
            key_case: Value::Null,
            delimiter: Value::String(DEFAULT_DELIMITER.to_string()),
            registry: ParserRegistry::with_builtins(),
        }
    }

    /// Start a declaration named after the schema's entity (`UserMapper`)
    pub fn for_schema(schema: impl Into<Arc<EntitySchema>>) -> Self {
        let schema = schema.into();
        Self::new(format!("{}Mapper", schema.name)).schema(schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_ref(&self) -> Option<&EntitySchema> {
        self.schema.as_deref()
    }

    /// Parsers available to this declaration's chains
    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Raw value of a declared option
    pub fn option(&self, option: &str) -> Option<&Value> {
        match option {
            "excluded_fields" => Some(&self.excluded_fields),
            "key_mappings" => Some(&self.key_mappings),
            "parsers" => Some(&self.parsers),
            "normalize_strings" => Some(&self.normalize_strings),
            "key_case" => Some(&self.key_case),
            "delimiter" => Some(&self.delimiter),
            _ => None,
        }
    }

    /// Replace a raw option value
    pub fn set_option(&mut self, option: &str, value: Value) -> Result<(), ConfigError> {
        let slot = match option {
            "excluded_fields" => &mut self.excluded_fields,
            "key_mappings" => &mut self.key_mappings,
            "parsers" => &mut self.parsers,
            "normalize_strings" => &mut self.normalize_strings,
            "key_case" => &mut self.key_case,
            "delimiter" => &mut self.delimiter,
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<Arc<EntitySchema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Names of schema fields to skip
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_fields = Value::Sequence(
            fields
                .into_iter()
                .map(|f| Value::String(f.into()))
                .collect(),
        );
        self
    }

    /// Read `field` from `path` instead of from a key named like the field
    pub fn map_key(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        let mappings = mapping_slot(&mut self.key_mappings);
        mappings.insert(Value::String(field.into()), Value::String(path.into()));
        self
    }

    /// Set the parser chain for a field, applied left to right
    pub fn parsers<I, S>(mut self, field: impl Into<String>, chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chain = chain
            .into_iter()
            .map(|name| Value::String(name.into()))
            .collect();
        let parsers = mapping_slot(&mut self.parsers);
        parsers.insert(Value::String(field.into()), Value::Sequence(chain));
        self
    }

    pub fn normalize_strings(mut self, enabled: bool) -> Self {
        self.normalize_strings = Value::Bool(enabled);
        self
    }

    /// Case applied to field names that have no explicit key mapping
    pub fn key_case(mut self, case: impl Into<String>) -> Self {
        self.key_case = Value::String(case.into());
        self
    }

    /// Delimiter between traversal path segments
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Value::String(delimiter.into());
        self
    }

    /// Make a parser available to this declaration's chains
    pub fn register_parser<F>(mut self, name: impl Into<String>, parser: F) -> Self
    where
        F: Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync + 'static,
    {
        self.registry.register(name, parser);
        self
    }

    /// Make every parser of `registry` available to this declaration
    pub fn with_registry(mut self, registry: &ParserRegistry) -> Self {
        self.registry.merge(registry);
        self
    }

    /// Apply a mapping of option overrides (a `name` key renames the mapper)
    pub fn apply_overrides(mut self, overrides: Mapping) -> Result<Self, ConfigError> {
        for (key, value) in overrides {
            let key = match key {
                Value::String(key) => key,
                other => {
                    return Err(ConfigError::InvalidOption {
                        option: format!("{:?}", other),
                        reason: "option names must be strings".to_string(),
                    })
                }
            };
            if key == "name" {
                match value {
                    Value::String(name) if !name.is_empty() => self.name = name,
                    _ => {
                        return Err(ConfigError::InvalidOption {
                            option: "name".to_string(),
                            reason: "must be a non-empty string".to_string(),
                        })
                    }
                }
            } else {
                self.set_option(&key, value)?;
            }
        }
        Ok(self)
    }

    /// Parse a declaration from YAML text and bind it to `schema`.
    ///
    /// The mapper is named `<Entity>Mapper` unless the file sets `name`. An
    /// `entity` key, when present, must match the schema's name.
    pub fn from_yaml_str(
        yaml: &str,
        schema: impl Into<Arc<EntitySchema>>,
    ) -> Result<Self, ConfigError> {
        let file: MapperFile = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::Load(format!("Failed to parse mapper YAML: {}", e)))?;
        let mut options = file.mapper;
        let schema = schema.into();

        if let Some(entity) = options.remove("entity") {
            if entity.as_str() != Some(schema.name.as_str()) {
                return Err(ConfigError::InvalidOption {
                    option: "entity".to_string(),
                    reason: format!(
                        "mapper targets {:?} but schema is '{}'",
                        entity, schema.name
                    ),
                });
            }
        }

        Self::for_schema(schema).apply_overrides(options)
    }
}

/// Load a mapper declaration from a YAML file
pub fn load_mapper<P: AsRef<Path>>(
    path: P,
    schema: impl Into<Arc<EntitySchema>>,
) -> Result<MapperDeclaration, ConfigError> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| {
        ConfigError::Load(format!("Failed to read mapper file {}: {}", path.display(), e))
    })?;
    MapperDeclaration::from_yaml_str(&yaml, schema)
}

fn mapping_slot(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("slot was just replaced with a mapping"),
    }
}
