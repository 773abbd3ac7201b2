//! YAML schema loader.
//!
//! Schema files wrap the definition in an `entity` key:
//!
//! ```yaml
//! entity:
//!   name: User
//!   fields:
//!     - name: id
//!       type: Integer
//!       primary_key: true
//!     - name: email
//!       type: String
//!     - name: company
//!       type: Reference
//!       references: Company
//! ```

use crate::schema::EntitySchema;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Wrapper for schema YAML structure
#[derive(Debug, Deserialize)]
struct SchemaSpec {
    entity: EntitySchema,
}

impl EntitySchema {
    /// Parse and validate a schema from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, String> {
        let spec: SchemaSpec =
            serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse schema YAML: {}", e))?;
        validate_schema(&spec.entity)?;
        Ok(spec.entity)
    }
}

/// Load a single schema definition from a YAML file
///
/// # Example
///
/// ```ignore
/// use fieldmap::schema::load_schema;
///
/// let schema = load_schema("config/examples/users/schema.yaml").unwrap();
/// ```
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<EntitySchema, String> {
    let path = path.as_ref();

    let yaml_content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read schema file {}: {}", path.display(), e))?;

    EntitySchema::from_yaml_str(&yaml_content)
        .map_err(|e| format!("{} ({})", e, path.display()))
}

/// Validate a schema definition
///
/// Checks for:
/// - Non-empty entity name
/// - At least one field
/// - Non-empty, unique field names
/// - At most one primary key
pub fn validate_schema(schema: &EntitySchema) -> Result<(), String> {
    if schema.name.is_empty() {
        return Err("Entity name cannot be empty".to_string());
    }

    if schema.fields.is_empty() {
        return Err(format!("Entity '{}' declares no fields", schema.name));
    }

    let mut seen = HashSet::new();
    for field in &schema.fields {
        if field.name.is_empty() {
            return Err(format!(
                "Field name cannot be empty in entity '{}'",
                schema.name
            ));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(format!(
                "Field '{}' is declared more than once in entity '{}'",
                field.name, schema.name
            ));
        }
    }

    let primary_keys = schema.fields.iter().filter(|f| f.primary_key).count();
    if primary_keys > 1 {
        return Err(format!(
            "Entity '{}' declares {} primary keys, expected at most one",
            schema.name, primary_keys
        ));
    }

    Ok(())
}
