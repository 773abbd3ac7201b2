//! Assignable field enumeration.

use crate::schema::EntitySchema;

/// Enumerate the fields a mapper assigns from raw data.
///
/// Relations, derived fields and the primary key are never assigned from
/// input; names in `excluded` are dropped afterwards. Order follows the
/// schema declaration.
pub fn assignable_fields<S: AsRef<str>>(schema: &EntitySchema, excluded: &[S]) -> Vec<String> {
    schema
        .fields
        .iter()
        .filter(|field| !(field.is_relation() || field.derived || field.primary_key))
        .filter(|field| !excluded.iter().any(|name| name.as_ref() == field.name))
        .map(|field| field.name.clone())
        .collect()
}
