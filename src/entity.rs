//! Entity instances built from cleaned data.
//!
//! Instances are never persisted here; handing them to storage is the
//! caller's business.

use crate::error::MapperError;
use crate::record::{Record, RecordValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Trait for typed entities a mapper can build.
///
/// # Example
///
/// ```
/// use fieldmap::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     email: Option<String>,
///     age: Option<i64>,
/// }
///
/// impl Entity for User {
///     const NAME: &'static str = "User";
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned {
    /// Name of the schema this type corresponds to
    const NAME: &'static str;

    /// Convert entity to a record; fails unless it serializes to an object
    fn to_record(&self) -> Result<Record, serde_json::Error> {
        let json_value = serde_json::to_value(self)?;
        match RecordValue::from(json_value) {
            RecordValue::Map(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "entity `{}` serialized to {}, expected an object",
                Self::NAME,
                other.type_name()
            ))),
        }
    }

    /// Convert entity to JSON string
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// An unsaved entity: the schema name plus its field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInstance {
    entity: String,
    values: Record,
}

impl EntityInstance {
    pub fn new(entity: impl Into<String>, values: Record) -> Self {
        Self {
            entity: entity.into(),
            values,
        }
    }

    /// Name of the entity type
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.values.get(field)
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn into_values(self) -> Record {
        self.values
    }

    /// Field values as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(RecordValue::Map(self.values.clone()))
    }

    /// Deserialize the field values into a typed struct
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, MapperError> {
        serde_json::from_value(self.to_json()).map_err(|e| MapperError::Build {
            entity: self.entity.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestEntity {
        name: String,
        age: i64,
    }

    impl Entity for TestEntity {
        const NAME: &'static str = "TestEntity";
    }

    #[test]
    fn test_entity_to_json() {
        let entity = TestEntity {
            name: "Alice".to_string(),
            age: 30,
        };

        let json = entity.to_json().unwrap();
        assert!(json.contains("Alice"));
        assert!(json.contains("30"));
    }

    #[test]
    fn test_entity_to_record() {
        let entity = TestEntity {
            name: "Bob".to_string(),
            age: 25,
        };

        let record = entity.to_record().unwrap();
        assert_eq!(record.get("name"), Some(&RecordValue::string("Bob")));
        assert_eq!(record.get("age"), Some(&RecordValue::Int(25)));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Code(String);

    impl Entity for Code {
        const NAME: &'static str = "Code";
    }

    #[test]
    fn test_entity_to_record_requires_object() {
        let err = Code("abc".to_string()).to_record().unwrap_err();
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn test_instance_deserialize_into() {
        let mut values = Record::new();
        values.insert("name".to_string(), RecordValue::string("Cara"));
        values.insert("age".to_string(), RecordValue::Int(41));
        let instance = EntityInstance::new("TestEntity", values);

        let typed: TestEntity = instance.deserialize_into().unwrap();
        assert_eq!(
            typed,
            TestEntity {
                name: "Cara".to_string(),
                age: 41
            }
        );
    }

    #[test]
    fn test_instance_deserialize_type_mismatch() {
        let mut values = Record::new();
        values.insert("name".to_string(), RecordValue::string("Cara"));
        values.insert("age".to_string(), RecordValue::string("forty"));
        let instance = EntityInstance::new("TestEntity", values);

        let result: Result<TestEntity, _> = instance.deserialize_into();
        assert!(matches!(result, Err(MapperError::Build { .. })));
    }
}
