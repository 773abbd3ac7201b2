//! Mappers: declared configuration, self-checks, and the cleaning pipeline.
//!
//! The lifecycle is:
//!
//! 1. Declare a [`MapperDeclaration`] (builder, YAML, or [`derive`]).
//! 2. [`finalize`](MapperDeclaration::finalize) it once. Every self-check runs
//!    here; a declaration that fails never produces a [`MapperType`].
//! 3. Bind one raw record per [`Mapper`] instance, `clean()` it, then read
//!    `cleaned_data()` or `build()` an entity.

pub mod checks;
pub mod cleaning;
pub mod declaration;
pub mod factory;

pub use checks::{run_checks, SelfCheck, DEFAULT_CHECKS};
pub use cleaning::{CleanedData, Mapper};
pub use declaration::{load_mapper, MapperDeclaration, OPTION_NAMES};
pub use factory::{derive, derive_with_registry};

use crate::error::{ConfigError, MapperError};
use crate::record::Record;
use crate::schema::{assignable_fields, EntitySchema};
use checks::ParserChain;
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Case conversion applied to field names without an explicit key mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Camel,
    Pascal,
    Snake,
    Kebab,
    ScreamingSnake,
}

impl KeyCase {
    /// Convert a field name into the source key casing
    pub fn apply(&self, field: &str) -> String {
        let case = match self {
            KeyCase::Camel => Case::Camel,
            KeyCase::Pascal => Case::Pascal,
            KeyCase::Snake => Case::Snake,
            KeyCase::Kebab => Case::Kebab,
            KeyCase::ScreamingSnake => Case::ScreamingSnake,
        };
        field.to_case(case)
    }
}

impl FromStr for KeyCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel" => Ok(KeyCase::Camel),
            "pascal" => Ok(KeyCase::Pascal),
            "snake" => Ok(KeyCase::Snake),
            "kebab" => Ok(KeyCase::Kebab),
            "screaming_snake" => Ok(KeyCase::ScreamingSnake),
            other => Err(format!(
                "unknown case '{}', expected camel, pascal, snake, kebab or screaming_snake",
                other
            )),
        }
    }
}

/// Checked, read-only configuration shared by every instance of a mapper type
struct MapperSpec {
    name: String,
    schema: Arc<EntitySchema>,
    excluded_fields: Vec<String>,
    key_mappings: IndexMap<String, String>,
    parsers: IndexMap<String, ParserChain>,
    normalize_strings: bool,
    key_case: Option<KeyCase>,
    delimiter: String,
    fields: Vec<String>,
}

/// A finalized mapper.
///
/// Cheap to clone and safe to share between threads; every clone refers to
/// the same configuration, which never changes after finalization.
#[derive(Clone)]
pub struct MapperType {
    spec: Arc<MapperSpec>,
}

impl MapperDeclaration {
    /// Run the default self-checks and produce a usable mapper type
    pub fn finalize(self) -> Result<MapperType, ConfigError> {
        self.finalize_with(&[])
    }

    /// Run the default self-checks followed by `extra` checks
    pub fn finalize_with(self, extra: &[(&str, SelfCheck)]) -> Result<MapperType, ConfigError> {
        run_checks(&self, DEFAULT_CHECKS)?;
        run_checks(&self, extra)?;
        MapperType::compile(self)
    }
}

impl MapperType {
    fn compile(declaration: MapperDeclaration) -> Result<Self, ConfigError> {
        let schema = declaration.schema.clone().ok_or(ConfigError::MissingSchema)?;
        let delimiter = checks::parse_delimiter(&declaration.delimiter)?;
        let excluded_fields = checks::parse_excluded_fields(&declaration.excluded_fields)?;
        let key_mappings = checks::parse_key_mappings(&declaration.key_mappings, &delimiter)?;
        let parsers = checks::parse_parsers(&declaration)?;
        let normalize_strings = checks::parse_normalize_strings(&declaration.normalize_strings)?;
        let key_case = checks::parse_key_case(&declaration.key_case)?;
        let fields = assignable_fields(&schema, &excluded_fields);

        tracing::info!(
            mapper = %declaration.name,
            entity = %schema.name,
            fields = fields.len(),
            "mapper finalized"
        );

        Ok(Self {
            spec: Arc::new(MapperSpec {
                name: declaration.name,
                schema,
                excluded_fields,
                key_mappings,
                parsers,
                normalize_strings,
                key_case,
                delimiter,
                fields,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.spec.schema
    }

    /// Fields cleaned by this mapper, in schema order
    pub fn fields(&self) -> &[String] {
        &self.spec.fields
    }

    pub fn excluded_fields(&self) -> &[String] {
        &self.spec.excluded_fields
    }

    pub fn key_mappings(&self) -> &IndexMap<String, String> {
        &self.spec.key_mappings
    }

    pub fn normalize_strings(&self) -> bool {
        self.spec.normalize_strings
    }

    pub fn key_case(&self) -> Option<KeyCase> {
        self.spec.key_case
    }

    pub fn delimiter(&self) -> &str {
        &self.spec.delimiter
    }

    /// Names of the parsers applied to `field`, in order
    pub fn parser_names(&self, field: &str) -> Vec<&str> {
        self.spec
            .parsers
            .get(field)
            .map(|chain| chain.iter().map(|(name, _)| name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Key or traversal path used to read `field` from a raw record.
    ///
    /// An explicit key mapping wins; otherwise the field name, converted to
    /// the configured key case if any.
    pub fn source_key(&self, field: &str) -> String {
        if let Some(key) = self.spec.key_mappings.get(field) {
            return key.clone();
        }
        match self.spec.key_case {
            Some(case) => case.apply(field),
            None => field.to_string(),
        }
    }

    /// Bind a raw record to a new mapper instance
    pub fn mapper(&self, record: Record) -> Result<Mapper, MapperError> {
        Mapper::new(self.clone(), record)
    }

    /// Clean a record in one step
    pub fn clean_record(&self, record: Record) -> Result<CleanedData, MapperError> {
        let mut mapper = self.mapper(record)?;
        mapper.clean()?;
        mapper.into_cleaned_data()
    }

    pub(crate) fn parser_chain(&self, field: &str) -> Option<&ParserChain> {
        self.spec.parsers.get(field)
    }
}

impl fmt::Debug for MapperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperType")
            .field("name", &self.spec.name)
            .field("entity", &self.spec.schema.name)
            .field("fields", &self.spec.fields)
            .field("excluded_fields", &self.spec.excluded_fields)
            .field("key_mappings", &self.spec.key_mappings)
            .field(
                "parsers",
                &self
                    .spec
                    .parsers
                    .keys()
                    .map(|field| (field.as_str(), self.parser_names(field)))
                    .collect::<Vec<_>>(),
            )
            .field("normalize_strings", &self.spec.normalize_strings)
            .field("key_case", &self.spec.key_case)
            .field("delimiter", &self.spec.delimiter)
            .finish()
    }
}
