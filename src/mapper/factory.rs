//! Runtime mapper derivation.
//!
//! When the target schema is only known at runtime there is no declaration to
//! write by hand. [`derive`] builds one from the base defaults plus a mapping
//! of option overrides and finalizes it through the same checks as any other
//! declaration.

use crate::error::ConfigError;
use crate::mapper::{MapperDeclaration, MapperType};
use crate::parsers::ParserRegistry;
use crate::schema::EntitySchema;
use serde_yaml::Mapping;
use std::sync::Arc;

/// Derive a finalized mapper for `schema`.
///
/// `overrides` uses the same option names as a mapper YAML file, plus an
/// optional `name` (default `<Entity>Mapper`).
///
/// # Example
///
/// ```
/// use fieldmap::{derive, EntitySchema, FieldType, SchemaField};
///
/// let schema = EntitySchema::new("User").field(SchemaField::new("email", FieldType::String));
/// let overrides = serde_yaml::from_str("key_mappings: {email: contact.email}").unwrap();
/// let mapper = derive(schema, overrides).unwrap();
/// assert_eq!(mapper.name(), "UserMapper");
/// ```
pub fn derive(
    schema: impl Into<Arc<EntitySchema>>,
    overrides: Mapping,
) -> Result<MapperType, ConfigError> {
    MapperDeclaration::for_schema(schema)
        .apply_overrides(overrides)?
        .finalize()
}

/// Derive a mapper whose parser chains may also use parsers from `registry`
pub fn derive_with_registry(
    schema: impl Into<Arc<EntitySchema>>,
    overrides: Mapping,
    registry: &ParserRegistry,
) -> Result<MapperType, ConfigError> {
    MapperDeclaration::for_schema(schema)
        .with_registry(registry)
        .apply_overrides(overrides)?
        .finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordValue;
    use crate::schema::{FieldType, SchemaField};

    fn schema() -> EntitySchema {
        EntitySchema::new("Order")
            .field(SchemaField::new("id", FieldType::Integer).primary_key())
            .field(SchemaField::new("total", FieldType::Float))
            .field(SchemaField::new("note", FieldType::String))
    }

    fn overrides(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_derive_defaults() {
        let mapper = derive(schema(), Mapping::new()).unwrap();
        assert_eq!(mapper.name(), "OrderMapper");
        assert_eq!(mapper.fields(), &["total".to_string(), "note".to_string()]);
        assert!(mapper.normalize_strings());
    }

    #[test]
    fn test_derive_with_name_and_options() {
        let mapper = derive(
            schema(),
            overrides("{name: ApiOrders, excluded_fields: [note], normalize_strings: false}"),
        )
        .unwrap();
        assert_eq!(mapper.name(), "ApiOrders");
        assert_eq!(mapper.fields(), &["total".to_string()]);
        assert!(!mapper.normalize_strings());
    }

    #[test]
    fn test_derive_runs_self_checks() {
        let err = derive(schema(), overrides("{excluded_fields: [does_not_exist]}")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownExcludedField { .. }));

        let err = derive(schema(), overrides("{normalize_strings: 1}")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNormalizeStrings(_)));

        let err = derive(schema(), overrides("{colour: blue}")).unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("colour".to_string()));
    }

    #[test]
    fn test_derive_with_registry() {
        let mut registry = ParserRegistry::new();
        registry.register("cents", |value: RecordValue| {
            Ok(match value.as_f64() {
                Some(amount) => RecordValue::Int((amount * 100.0).round() as i64),
                None => value,
            })
        });

        let chains = overrides("{parsers: {total: [cents]}}");
        let mapper = derive_with_registry(schema(), chains, &registry).unwrap();
        let record = serde_json::from_str(r#"{"total": 12.5}"#).unwrap();
        let cleaned = mapper.clean_record(record).unwrap();
        assert_eq!(cleaned.get("total"), Some(&RecordValue::Int(1250)));

        // Without the registry the chain names an unknown parser
        assert!(derive(schema(), overrides("{parsers: {total: [cents]}}")).is_err());
    }
}
