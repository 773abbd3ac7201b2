//! Cleaning pipeline and mapper instances.

use crate::entity::{Entity, EntityInstance};
use crate::error::MapperError;
use crate::extraction::resolve_with;
use crate::mapper::MapperType;
use crate::parsers::builtins::normalize_str;
use crate::record::{Record, RecordValue};
use serde::Serialize;

/// Cleaned field values of one record, keyed by schema field name.
///
/// Holds one entry per field the mapper cleans, in schema order, including
/// fields the record did not provide (stored as `Null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CleanedData {
    values: Record,
}

impl CleanedData {
    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.values.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RecordValue)> {
        self.values.iter()
    }

    pub fn as_record(&self) -> &Record {
        &self.values
    }

    pub fn into_record(self) -> Record {
        self.values
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(RecordValue::Map(self.values.clone()))
    }
}

/// One raw record bound to a mapper type
#[derive(Debug, Clone)]
pub struct Mapper {
    mapper_type: MapperType,
    record: Record,
    cleaned: Option<CleanedData>,
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType, record: Record) -> Result<Self, MapperError> {
        if record.is_empty() {
            return Err(MapperError::EmptyRecord);
        }
        Ok(Self {
            mapper_type,
            record,
            cleaned: None,
        })
    }

    pub fn mapper_type(&self) -> &MapperType {
        &self.mapper_type
    }

    /// The raw record, unchanged
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned.is_some()
    }

    /// Clean the raw record.
    ///
    /// For every field: resolve its source key, normalize strings when
    /// enabled, then run the field's parser chain. Calling `clean` again
    /// recomputes the same result.
    pub fn clean(&mut self) -> Result<(), MapperError> {
        self.cleaned = None;
        let mapper_type = &self.mapper_type;
        let mut values = Record::with_capacity(mapper_type.fields().len());

        tracing::debug!(mapper = %mapper_type.name(), "cleaning record");

        for field in mapper_type.fields() {
            let key = mapper_type.source_key(field);
            let mut value = match resolve_with(&self.record, &key, mapper_type.delimiter()) {
                Some(value) => value.clone(),
                None => {
                    tracing::debug!(
                        mapper = %mapper_type.name(),
                        field = %field,
                        key = %key,
                        "source key not found, storing null"
                    );
                    RecordValue::Null
                }
            };

            if mapper_type.normalize_strings() {
                if let RecordValue::String(s) = &value {
                    value = RecordValue::String(normalize_str(s));
                }
            }

            if let Some(chain) = mapper_type.parser_chain(field) {
                for (name, parser) in chain {
                    tracing::trace!(field = %field, parser = %name, "applying parser");
                    value = parser.parse(value).map_err(|source| MapperError::Parser {
                        field: field.clone(),
                        parser: name.clone(),
                        source,
                    })?;
                }
            }

            values.insert(field.clone(), value);
        }

        self.cleaned = Some(CleanedData { values });
        Ok(())
    }

    /// Cleaned values; fails until `clean` has succeeded
    pub fn cleaned_data(&self) -> Result<&CleanedData, MapperError> {
        self.cleaned.as_ref().ok_or(MapperError::NotCleaned)
    }

    pub fn into_cleaned_data(self) -> Result<CleanedData, MapperError> {
        self.cleaned.ok_or(MapperError::NotCleaned)
    }

    /// Build an unsaved entity from the cleaned values.
    ///
    /// `overrides` win over cleaned values and may set any schema field,
    /// including the primary key and relations.
    pub fn build(&self, overrides: Record) -> Result<EntityInstance, MapperError> {
        let cleaned = self.cleaned_data()?;
        let schema = self.mapper_type.schema();

        let mut values = cleaned.values.clone();
        for (field, value) in overrides {
            if !schema.has_field(&field) {
                return Err(MapperError::Build {
                    entity: schema.name.clone(),
                    reason: format!("unknown field `{}`", field),
                });
            }
            values.insert(field, value);
        }

        Ok(EntityInstance::new(schema.name.clone(), values))
    }

    /// Build and deserialize into a typed entity
    pub fn build_as<T: Entity>(&self, overrides: Record) -> Result<T, MapperError> {
        let schema_name = &self.mapper_type.schema().name;
        if T::NAME != schema_name {
            return Err(MapperError::Build {
                entity: T::NAME.to_string(),
                reason: format!("mapper targets '{}'", schema_name),
            });
        }
        self.build(overrides)?.deserialize_into()
    }
}
