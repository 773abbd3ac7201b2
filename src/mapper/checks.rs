//! Self-checks run against a mapper declaration before it can be used.
//!
//! Each check validates one option in isolation and has no side effects. All
//! checks run, in order, when a declaration is finalized; the first failure
//! aborts finalization. Callers can append their own checks through
//! [`MapperDeclaration::finalize_with`](crate::MapperDeclaration::finalize_with).

use crate::error::ConfigError;
use crate::extraction::{FieldPath, DEFAULT_DELIMITER};
use crate::mapper::declaration::MapperDeclaration;
use crate::mapper::KeyCase;
use crate::parsers::SharedParser;
use crate::schema::{assignable_fields, validate_schema};
use indexmap::IndexMap;
use serde_yaml::Value;

/// A single configuration check
pub type SelfCheck = fn(&MapperDeclaration) -> Result<(), ConfigError>;

/// Checks every finalized declaration goes through, in run order
pub const DEFAULT_CHECKS: &[(&str, SelfCheck)] = &[
    ("schema", check_schema),
    ("excluded_fields", check_excluded_fields),
    ("key_mappings", check_key_mappings),
    ("parsers", check_parsers),
    ("normalize_strings", check_normalize_strings),
    ("key_case", check_key_case),
    ("delimiter", check_delimiter),
];

/// Run `checks` in order, stopping at the first failure
pub fn run_checks(
    declaration: &MapperDeclaration,
    checks: &[(&str, SelfCheck)],
) -> Result<(), ConfigError> {
    for (name, check) in checks {
        tracing::trace!(mapper = %declaration.name(), check = %name, "running self-check");
        check(declaration)?;
    }
    Ok(())
}

/// `schema` must be set and well formed
pub fn check_schema(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    let schema = declaration.schema_ref().ok_or(ConfigError::MissingSchema)?;
    validate_schema(schema).map_err(|reason| ConfigError::InvalidSchema {
        schema: schema.name.clone(),
        reason,
    })
}

/// `excluded_fields` must be a list of strings naming schema fields
pub fn check_excluded_fields(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    let excluded = parse_excluded_fields(&declaration.excluded_fields)?;
    if let Some(schema) = declaration.schema_ref() {
        for field in &excluded {
            if !schema.has_field(field) {
                return Err(ConfigError::UnknownExcludedField {
                    field: field.clone(),
                    schema: schema.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// `key_mappings` must map assignable field names to traversal paths
pub fn check_key_mappings(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    let delimiter = parse_delimiter(&declaration.delimiter)
        .unwrap_or_else(|_| DEFAULT_DELIMITER.to_string());
    let mappings = parse_key_mappings(&declaration.key_mappings, &delimiter)?;

    let Some(schema) = declaration.schema_ref() else {
        return Ok(());
    };
    // A malformed exclusion list is reported by its own check
    let excluded = parse_excluded_fields(&declaration.excluded_fields).unwrap_or_default();
    let assignable = assignable_fields(schema, &excluded);

    for field in mappings.keys() {
        if !assignable.contains(field) {
            return Err(ConfigError::UnknownMappedField {
                field: field.clone(),
                schema: schema.name.clone(),
            });
        }
    }
    Ok(())
}

/// `parsers` must map field names to lists of registered parser names.
///
/// Field names are not checked against the schema; a chain for a field the
/// mapper never cleans is simply unused.
pub fn check_parsers(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    parse_parsers(declaration).map(|_| ())
}

/// `normalize_strings` must be a boolean
pub fn check_normalize_strings(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    parse_normalize_strings(&declaration.normalize_strings).map(|_| ())
}

/// `key_case`, when set, must name a supported case
pub fn check_key_case(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    parse_key_case(&declaration.key_case).map(|_| ())
}

/// `delimiter` must be a non-empty string
pub fn check_delimiter(declaration: &MapperDeclaration) -> Result<(), ConfigError> {
    parse_delimiter(&declaration.delimiter).map(|_| ())
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

pub(crate) fn parse_excluded_fields(value: &Value) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::InvalidExcludedFields(format!("found {}", describe(item)))
                })
            })
            .collect(),
        other => Err(ConfigError::InvalidExcludedFields(format!(
            "found {}",
            describe(other)
        ))),
    }
}

pub(crate) fn parse_key_mappings(
    value: &Value,
    delimiter: &str,
) -> Result<IndexMap<String, String>, ConfigError> {
    let mapping = match value {
        Value::Null => return Ok(IndexMap::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(ConfigError::InvalidKeyMappings(format!(
                "found {}",
                describe(other)
            )))
        }
    };

    let mut mappings = IndexMap::new();
    for (field, key) in mapping {
        let (Some(field), Some(key)) = (field.as_str(), key.as_str()) else {
            return Err(ConfigError::InvalidKeyMappings(format!(
                "{} -> {} is not a string pair",
                describe(field),
                describe(key)
            )));
        };
        if FieldPath::parse(key, delimiter).has_empty_segment() {
            return Err(ConfigError::InvalidKeyMappings(format!(
                "path `{}` for field `{}` has an empty segment",
                key, field
            )));
        }
        mappings.insert(field.to_string(), key.to_string());
    }
    Ok(mappings)
}

pub(crate) type ParserChain = Vec<(String, SharedParser)>;

pub(crate) fn parse_parsers(
    declaration: &MapperDeclaration,
) -> Result<IndexMap<String, ParserChain>, ConfigError> {
    let mapping = match &declaration.parsers {
        Value::Null => return Ok(IndexMap::new()),
        Value::Mapping(mapping) => mapping,
        other => return Err(ConfigError::InvalidParsers(format!("found {}", describe(other)))),
    };

    let mut chains = IndexMap::new();
    for (field, chain) in mapping {
        let field = field.as_str().ok_or_else(|| {
            ConfigError::InvalidParsers(format!("field name is {}", describe(field)))
        })?;
        let names = chain.as_sequence().ok_or_else(|| {
            ConfigError::InvalidParsers(format!(
                "chain for `{}` is {}, expected a list",
                field,
                describe(chain)
            ))
        })?;

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_str().ok_or_else(|| {
                ConfigError::InvalidParsers(format!(
                    "chain for `{}` contains {}, expected a parser name",
                    field,
                    describe(name)
                ))
            })?;
            let parser = declaration.registry.get(name).ok_or_else(|| ConfigError::UnknownParser {
                field: field.to_string(),
                parser: name.to_string(),
            })?;
            resolved.push((name.to_string(), parser));
        }
        chains.insert(field.to_string(), resolved);
    }
    Ok(chains)
}

pub(crate) fn parse_normalize_strings(value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::InvalidNormalizeStrings(describe(value).to_string()))
}

pub(crate) fn parse_key_case(value: &Value) -> Result<Option<KeyCase>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::String(name) => name.parse::<KeyCase>().map(Some).map_err(|reason| {
            ConfigError::InvalidOption {
                option: "key_case".to_string(),
                reason,
            }
        }),
        other => Err(ConfigError::InvalidOption {
            option: "key_case".to_string(),
            reason: format!("expected a string, found {}", describe(other)),
        }),
    }
}

pub(crate) fn parse_delimiter(value: &Value) -> Result<String, ConfigError> {
    match value.as_str() {
        Some(delimiter) if !delimiter.is_empty() => Ok(delimiter.to_string()),
        _ => Err(ConfigError::InvalidOption {
            option: "delimiter".to_string(),
            reason: format!("expected a non-empty string, found {}", describe(value)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntitySchema, FieldType, SchemaField};

    fn schema() -> EntitySchema {
        EntitySchema::new("User")
            .field(SchemaField::new("id", FieldType::Integer).primary_key())
            .field(SchemaField::new("email", FieldType::String))
            .field(SchemaField::new("age", FieldType::Integer))
            .field(SchemaField::new("company", FieldType::Reference).references("Company"))
    }

    fn declaration() -> MapperDeclaration {
        MapperDeclaration::for_schema(schema())
    }

    #[test]
    fn test_valid_declaration_passes_every_check() {
        let decl = declaration()
            .exclude(["age"])
            .map_key("email", "contact.email")
            .parsers("age", ["trim", "to_int"]);
        assert!(run_checks(&decl, DEFAULT_CHECKS).is_ok());
    }

    #[test]
    fn test_missing_schema() {
        let decl = MapperDeclaration::new("Orphan");
        assert_eq!(check_schema(&decl), Err(ConfigError::MissingSchema));
    }

    #[test]
    fn test_invalid_schema() {
        let decl = MapperDeclaration::new("Empty").schema(EntitySchema::new("Empty"));
        assert!(matches!(check_schema(&decl), Err(ConfigError::InvalidSchema { .. })));
    }

    #[test]
    fn test_excluded_field_must_exist() {
        let decl = declaration().exclude(["does_not_exist"]);
        assert_eq!(
            check_excluded_fields(&decl),
            Err(ConfigError::UnknownExcludedField {
                field: "does_not_exist".to_string(),
                schema: "User".to_string(),
            })
        );
    }

    #[test]
    fn test_excluded_may_name_non_assignable_fields() {
        let decl = declaration().exclude(["id", "company"]);
        assert!(check_excluded_fields(&decl).is_ok());
    }

    #[test]
    fn test_excluded_fields_shape() {
        let mut decl = declaration();
        decl.set_option("excluded_fields", Value::String("age".into())).unwrap();
        assert!(matches!(
            check_excluded_fields(&decl),
            Err(ConfigError::InvalidExcludedFields(_))
        ));

        decl.set_option("excluded_fields", serde_yaml::from_str("[age, 3]").unwrap())
            .unwrap();
        assert!(matches!(
            check_excluded_fields(&decl),
            Err(ConfigError::InvalidExcludedFields(_))
        ));
    }

    #[test]
    fn test_key_mappings_shape() {
        let mut decl = declaration();
        decl.set_option("key_mappings", serde_yaml::from_str("[email]").unwrap())
            .unwrap();
        assert!(matches!(check_key_mappings(&decl), Err(ConfigError::InvalidKeyMappings(_))));

        decl.set_option("key_mappings", serde_yaml::from_str("{email: 5}").unwrap())
            .unwrap();
        assert!(matches!(check_key_mappings(&decl), Err(ConfigError::InvalidKeyMappings(_))));
    }

    #[test]
    fn test_key_mapping_empty_segment() {
        let decl = declaration().map_key("email", "contact..email");
        assert!(matches!(check_key_mappings(&decl), Err(ConfigError::InvalidKeyMappings(_))));
    }

    #[test]
    fn test_key_mapping_must_target_assignable_field() {
        let decl = declaration().map_key("phone", "contact.phone");
        assert!(matches!(
            check_key_mappings(&decl),
            Err(ConfigError::UnknownMappedField { .. })
        ));

        let decl = declaration().exclude(["email"]).map_key("email", "contact.email");
        assert!(matches!(
            check_key_mappings(&decl),
            Err(ConfigError::UnknownMappedField { .. })
        ));
    }

    #[test]
    fn test_parsers_shape() {
        let mut decl = declaration();
        decl.set_option("parsers", serde_yaml::from_str("{age: to_int}").unwrap())
            .unwrap();
        assert!(matches!(check_parsers(&decl), Err(ConfigError::InvalidParsers(_))));

        decl.set_option("parsers", serde_yaml::from_str("{age: [trim, 1]}").unwrap())
            .unwrap();
        assert!(matches!(check_parsers(&decl), Err(ConfigError::InvalidParsers(_))));
    }

    #[test]
    fn test_parsers_must_be_registered() {
        let decl = declaration().parsers("age", ["trim", "to_roman"]);
        assert_eq!(
            check_parsers(&decl),
            Err(ConfigError::UnknownParser {
                field: "age".to_string(),
                parser: "to_roman".to_string(),
            })
        );
    }

    #[test]
    fn test_parsers_for_unknown_field_allowed() {
        let decl = declaration().parsers("nickname", ["trim"]);
        assert!(check_parsers(&decl).is_ok());
    }

    #[test]
    fn test_normalize_strings_must_be_bool() {
        let mut decl = declaration();
        decl.set_option("normalize_strings", Value::String("yes".into()))
            .unwrap();
        assert_eq!(
            check_normalize_strings(&decl),
            Err(ConfigError::InvalidNormalizeStrings("a string".to_string()))
        );
    }

    #[test]
    fn test_key_case_and_delimiter() {
        assert!(check_key_case(&declaration().key_case("camel")).is_ok());
        assert!(check_key_case(&declaration().key_case("wavy")).is_err());
        assert!(check_delimiter(&declaration().delimiter("/")).is_ok());
        assert!(check_delimiter(&declaration().delimiter("")).is_err());
    }

    #[test]
    fn test_run_checks_stops_at_first_failure() {
        let decl = MapperDeclaration::new("Broken").exclude(["x"]);
        assert_eq!(run_checks(&decl, DEFAULT_CHECKS), Err(ConfigError::MissingSchema));
    }
}
