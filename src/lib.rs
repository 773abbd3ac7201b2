//! # Fieldmap: Declarative Record Mapping
//!
//! Fieldmap maps loosely structured input records (parsed JSON, form posts,
//! API payloads) onto the fields of an entity schema. A mapper declares
//! which fields to skip, where each field lives in the raw record, and which
//! parsers clean its value. The declaration is self-checked once, when it is
//! finalized, so a misconfigured mapper never touches a record.
//!
//! ## Features
//!
//! - **Traversal resolver**: read nested values with delimited paths such as `contact.email`
//! - **Schema introspection**: assignable fields skip the primary key, relations and derived fields
//! - **Parser registry**: named, chainable value parsers with a set of builtins
//! - **Self-checks**: configuration shape is validated before any instance exists
//! - **Runtime derivation**: build a mapper for a schema known only at runtime
//!
//! ## Example: Mapper Configuration
//!
//! ```yaml
//! mapper:
//!   entity: User
//!   excluded_fields: [created_at]
//!   key_mappings:
//!     email: contact.email_address
//!   parsers:
//!     age: [trim, to_int]
//!   normalize_strings: true
//! ```
//!
//! ## Example: Cleaning a Record
//!
//! ```
//! use fieldmap::{EntitySchema, FieldType, MapperDeclaration, Record, SchemaField};
//!
//! let schema = EntitySchema::new("User")
//!     .field(SchemaField::new("id", FieldType::Integer).primary_key())
//!     .field(SchemaField::new("email", FieldType::String))
//!     .field(SchemaField::new("age", FieldType::Integer));
//!
//! let mapper_type = MapperDeclaration::for_schema(schema)
//!     .map_key("email", "contact.email_address")
//!     .parsers("age", ["to_int"])
//!     .finalize()
//!     .unwrap();
//!
//! let raw = r#"{"contact": {"email_address": "a@b.com"}, "age": " 42 "}"#;
//! let record: Record = serde_json::from_str(raw).unwrap();
//! let cleaned = mapper_type.clean_record(record).unwrap();
//! assert_eq!(cleaned.get("email").and_then(|v| v.as_str()), Some("a@b.com"));
//! assert_eq!(cleaned.get("age").and_then(|v| v.as_i64()), Some(42));
//! ```

// Core modules
pub mod entity;
pub mod error;
pub mod extraction;
pub mod record;
pub mod serialization;

// Schemas, parsers and mappers
pub mod mapper;
pub mod parsers;
pub mod schema;

// Re-export key types
pub use entity::{Entity, EntityInstance};
pub use error::{ConfigError, MapperError};
pub use extraction::{resolve, resolve_with, Extractor, FieldPath, PathSegment};
pub use record::{record_from_json, Record, RecordValue};

pub use schema::{assignable_fields, load_schema, EntitySchema, FieldType, SchemaField};

pub use parsers::{ParseError, ParserFn, ParserRegistry};

pub use mapper::{
    derive, derive_with_registry, load_mapper, CleanedData, KeyCase, Mapper, MapperDeclaration,
    MapperType, SelfCheck, DEFAULT_CHECKS,
};
