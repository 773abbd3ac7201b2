//! Target entity schemas.
//!
//! A schema describes the entity type a mapper produces: its fields, their
//! storage types, the primary identifier, and which fields are relations or
//! derived values. Schemas are owned by the persistence layer; this crate only
//! reads them.

pub mod introspect;
pub mod loader;

pub use introspect::assignable_fields;
pub use loader::{load_schema, validate_schema};

use serde::{Deserialize, Serialize};

fn default_nullable() -> bool {
    true
}

/// Storage type of a schema field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Json,
    List,
    /// Reference to another entity
    Reference,
}

/// Field definition in an entity schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchemaField {
    /// Field name
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether this field is the primary identifier
    #[serde(default)]
    pub primary_key: bool,
    /// Target entity for relational fields
    #[serde(default)]
    pub references: Option<String>,
    /// Computed by the persistence layer, never assigned from input
    #[serde(default)]
    pub derived: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub doc: Option<String>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            references: None,
            derived: false,
            nullable: true,
            doc: None,
        }
    }

    /// Mark the field as the primary identifier
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Make the field a relation to another entity
    pub fn references(mut self, entity: impl Into<String>) -> Self {
        self.field_type = FieldType::Reference;
        self.references = Some(entity.into());
        self
    }

    /// Mark the field as derived
    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Whether the field points at another entity
    pub fn is_relation(&self) -> bool {
        self.field_type == FieldType::Reference || self.references.is_some()
    }
}

/// Entity schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntitySchema {
    /// Entity name (e.g., "User")
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            doc: None,
        }
    }

    /// Append a field
    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// The primary identifier field, if declared
    pub fn primary_key(&self) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// All field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Check the schema is well formed
    pub fn validate(&self) -> Result<(), String> {
        validate_schema(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_detection() {
        assert!(SchemaField::new("company", FieldType::Reference).is_relation());
        assert!(SchemaField::new("company_id", FieldType::Integer)
            .references("Company")
            .is_relation());
        assert!(!SchemaField::new("name", FieldType::String).is_relation());
    }

    #[test]
    fn test_schema_lookups() {
        let schema = EntitySchema::new("User")
            .field(SchemaField::new("id", FieldType::Integer).primary_key())
            .field(SchemaField::new("email", FieldType::String));

        assert!(schema.has_field("email"));
        assert!(!schema.has_field("phone"));
        assert_eq!(schema.primary_key().map(|f| f.name.as_str()), Some("id"));
        assert_eq!(schema.field_names(), vec!["id", "email"]);
    }
}
