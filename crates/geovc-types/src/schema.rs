//! Feature schemas and property values.
//!
//! A [`Schema`] is compared structurally: two schemas built independently
//! from the same name and property list are equal and hash identically,
//! which is what the per-flush schema cache relies on.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// The declared type of a schema property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Boolean,
    Integer,
    Double,
    String,
    /// Geometry encoded as well-known text.
    Geometry,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// A single named, typed property in a schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub binding: PropertyType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl PropertyDescriptor {
    /// A nullable property.
    pub fn new(name: impl Into<String>, binding: PropertyType) -> Self {
        Self {
            name: name.into(),
            binding,
            nullable: true,
        }
    }

    /// A property that must always carry a value.
    pub fn required(name: impl Into<String>, binding: PropertyType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, binding)
        }
    }
}

/// Ordered description of a feature type.
///
/// Immutable once built. Equality and hashing are structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    properties: Vec<PropertyDescriptor>,
}

impl Schema {
    /// Build a schema, rejecting duplicate property names.
    pub fn new(name: impl Into<String>, properties: Vec<PropertyDescriptor>) -> TypeResult<Self> {
        let mut seen = HashSet::with_capacity(properties.len());
        for prop in &properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(TypeError::DuplicateProperty(prop.name.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            properties,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Position of the named property, if declared.
    pub fn index_of(&self, property: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == property)
    }

    /// Look up a property descriptor by name.
    pub fn property(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A typed property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Geometry(String),
}

impl PropertyValue {
    /// The property type this value satisfies, or `None` for `Null`.
    pub fn property_type(&self) -> Option<PropertyType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(PropertyType::Boolean),
            Self::Integer(_) => Some(PropertyType::Integer),
            Self::Double(_) => Some(PropertyType::Double),
            Self::String(_) => Some(PropertyType::String),
            Self::Geometry(_) => Some(PropertyType::Geometry),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn roads() -> Schema {
        Schema::new(
            "roads",
            vec![
                PropertyDescriptor::required("geom", PropertyType::Geometry),
                PropertyDescriptor::new("name", PropertyType::String),
                PropertyDescriptor::new("lanes", PropertyType::Integer),
            ],
        )
        .unwrap()
    }

    fn hash_of(schema: &Schema) -> u64 {
        let mut hasher = DefaultHasher::new();
        schema.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn structurally_equal_schemas_are_equal() {
        let a = roads();
        let b = roads();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn property_order_matters() {
        let reordered = Schema::new(
            "roads",
            vec![
                PropertyDescriptor::new("name", PropertyType::String),
                PropertyDescriptor::required("geom", PropertyType::Geometry),
                PropertyDescriptor::new("lanes", PropertyType::Integer),
            ],
        )
        .unwrap();
        assert_ne!(roads(), reordered);
    }

    #[test]
    fn duplicate_property_rejected() {
        let err = Schema::new(
            "dup",
            vec![
                PropertyDescriptor::new("a", PropertyType::String),
                PropertyDescriptor::new("a", PropertyType::Integer),
            ],
        )
        .unwrap_err();
        assert_eq!(err, TypeError::DuplicateProperty("a".into()));
    }

    #[test]
    fn lookup_by_name() {
        let schema = roads();
        assert_eq!(schema.index_of("lanes"), Some(2));
        assert!(schema.property("geom").is_some_and(|p| !p.nullable));
        assert!(schema.index_of("missing").is_none());
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn value_types() {
        assert_eq!(PropertyValue::Null.property_type(), None);
        assert_eq!(
            PropertyValue::Geometry("POINT (1 2)".into()).property_type(),
            Some(PropertyType::Geometry)
        );
        assert_eq!(PropertyType::Double.to_string(), "double");
    }

    #[test]
    fn descriptor_nullable_defaults_on_deserialize() {
        let desc: PropertyDescriptor =
            serde_json::from_str(r#"{"name":"n","binding":"string"}"#).unwrap();
        assert!(desc.nullable);
        assert_eq!(desc.binding, PropertyType::String);
    }
}
