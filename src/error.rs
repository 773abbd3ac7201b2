//! Error types for mapper configuration and use.

use crate::parsers::ParseError;
use std::fmt;

/// Error raised while checking a mapper declaration.
///
/// A configuration error is fatal to the mapper type: no instance of a
/// declaration that failed its checks can ever be created.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingSchema,
    InvalidSchema {
        schema: String,
        reason: String,
    },
    InvalidExcludedFields(String),
    UnknownExcludedField {
        field: String,
        schema: String,
    },
    InvalidKeyMappings(String),
    UnknownMappedField {
        field: String,
        schema: String,
    },
    InvalidParsers(String),
    UnknownParser {
        field: String,
        parser: String,
    },
    InvalidNormalizeStrings(String),
    InvalidOption {
        option: String,
        reason: String,
    },
    UnknownOption(String),
    Load(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSchema => {
                write!(f, "Mapper has no schema; set `schema` before finalizing")
            }
            ConfigError::InvalidSchema { schema, reason } => {
                write!(f, "Schema '{}' is invalid: {}", schema, reason)
            }
            ConfigError::InvalidExcludedFields(msg) => {
                write!(f, "`excluded_fields` must be a list of strings: {}", msg)
            }
            ConfigError::UnknownExcludedField { field, schema } => {
                write!(f, "Field `{}` not found in schema `{}` fields", field, schema)
            }
            ConfigError::InvalidKeyMappings(msg) => {
                write!(f, "`key_mappings` must be a mapping of strings: {}", msg)
            }
            ConfigError::UnknownMappedField { field, schema } => write!(
                f,
                "`key_mappings` names field `{}` which is not assignable on schema `{}`",
                field, schema
            ),
            ConfigError::InvalidParsers(msg) => {
                write!(f, "`parsers` must map field names to lists of parsers: {}", msg)
            }
            ConfigError::UnknownParser { field, parser } => {
                write!(f, "Parser `{}` for field `{}` is not registered", parser, field)
            }
            ConfigError::InvalidNormalizeStrings(found) => {
                write!(f, "`normalize_strings` must be a boolean, found {}", found)
            }
            ConfigError::InvalidOption { option, reason } => {
                write!(f, "Invalid `{}`: {}", option, reason)
            }
            ConfigError::UnknownOption(option) => write!(f, "Unknown mapper option `{}`", option),
            ConfigError::Load(msg) => write!(f, "Failed to load mapper: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised while using a mapper on a record
#[derive(Debug, Clone, PartialEq)]
pub enum MapperError {
    Config(ConfigError),
    /// A mapper instance was created without any data
    EmptyRecord,
    /// Cleaned data was requested before `clean()` ran
    NotCleaned,
    Parser {
        field: String,
        parser: String,
        source: ParseError,
    },
    Build {
        entity: String,
        reason: String,
    },
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::Config(e) => write!(f, "{}", e),
            MapperError::EmptyRecord => write!(f, "Record cannot be empty"),
            MapperError::NotCleaned => write!(f, "Record has not been cleaned yet"),
            MapperError::Parser {
                field,
                parser,
                source,
            } => write!(f, "Parser `{}` failed on field `{}`: {}", parser, field, source),
            MapperError::Build { entity, reason } => {
                write!(f, "Failed to build `{}`: {}", entity, reason)
            }
        }
    }
}

impl std::error::Error for MapperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapperError::Config(e) => Some(e),
            MapperError::Parser { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for MapperError {
    fn from(err: ConfigError) -> Self {
        MapperError::Config(err)
    }
}
