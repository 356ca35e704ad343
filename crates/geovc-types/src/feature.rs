//! Features awaiting insertion into a versioned tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{TypeError, TypeResult};
use crate::schema::{PropertyValue, Schema};

/// A feature with a payload: identifier, schema, and named values.
///
/// The schema is shared behind an `Arc` so that thousands of features of
/// the same type do not each carry a copy.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleFeature {
    id: String,
    schema: Arc<Schema>,
    values: BTreeMap<String, PropertyValue>,
}

impl SimpleFeature {
    /// Create a feature with no values set.
    pub fn new(id: impl Into<String>, schema: Arc<Schema>) -> TypeResult<Self> {
        let id = validate_id(id.into())?;
        Ok(Self {
            id,
            schema,
            values: BTreeMap::new(),
        })
    }

    /// Set a property value, checking it against the schema.
    pub fn set(&mut self, property: &str, value: PropertyValue) -> TypeResult<()> {
        let descriptor =
            self.schema
                .property(property)
                .ok_or_else(|| TypeError::UnknownProperty {
                    schema: self.schema.name().to_string(),
                    property: property.to_string(),
                })?;

        match value.property_type() {
            None if !descriptor.nullable => {
                return Err(TypeError::NotNullable(property.to_string()));
            }
            Some(actual) if actual != descriptor.binding => {
                return Err(TypeError::TypeMismatch {
                    property: property.to_string(),
                    expected: descriptor.binding,
                    actual,
                });
            }
            _ => {}
        }

        self.values.insert(property.to_string(), value);
        Ok(())
    }

    /// Builder-style variant of [`SimpleFeature::set`].
    pub fn with(mut self, property: &str, value: PropertyValue) -> TypeResult<Self> {
        self.set(property, value)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The value of a property, if one was set.
    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.values.get(property)
    }

    /// Fail if a non-nullable property was never set.
    pub fn check_complete(&self) -> TypeResult<()> {
        match self
            .schema
            .properties()
            .iter()
            .find(|desc| !desc.nullable && !self.values.contains_key(&desc.name))
        {
            Some(desc) => Err(TypeError::NotNullable(desc.name.clone())),
            None => Ok(()),
        }
    }

    /// Values in schema declaration order, with `Null` for unset properties.
    pub fn values_in_order(&self) -> Vec<PropertyValue> {
        self.schema
            .properties()
            .iter()
            .map(|desc| {
                self.values
                    .get(&desc.name)
                    .cloned()
                    .unwrap_or(PropertyValue::Null)
            })
            .collect()
    }

    /// Like [`values_in_order`](Self::values_in_order), but fails if a
    /// non-nullable property was never set.
    pub fn ordered_values(&self) -> TypeResult<Vec<PropertyValue>> {
        self.check_complete()?;
        Ok(self.values_in_order())
    }
}

/// A deletion marker for the feature with a given id.
///
/// The id is checked on construction, so a tombstone always names a single
/// path component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tombstone {
    id: String,
}

impl Tombstone {
    pub fn new(id: impl Into<String>) -> TypeResult<Self> {
        Ok(Self {
            id: validate_id(id.into())?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A record destined for a tree path: a payload-carrying feature, or a
/// tombstone marking the deletion of the feature with that id.
#[derive(Clone, Debug, PartialEq)]
pub enum Feature {
    Simple(SimpleFeature),
    Tombstone(Tombstone),
}

impl Feature {
    /// A deletion marker for the feature with the given id.
    pub fn tombstone(id: impl Into<String>) -> TypeResult<Self> {
        Tombstone::new(id).map(Self::Tombstone)
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Simple(f) => f.id(),
            Self::Tombstone(t) => t.id(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone(_))
    }

    /// Fail if the feature cannot be stored as it is.
    pub fn check_complete(&self) -> TypeResult<()> {
        match self {
            Self::Simple(f) => f.check_complete(),
            Self::Tombstone(_) => Ok(()),
        }
    }

    /// The schema, for payload-carrying features only.
    pub fn schema(&self) -> Option<&Arc<Schema>> {
        match self {
            Self::Simple(f) => Some(f.schema()),
            Self::Tombstone(_) => None,
        }
    }
}

impl From<Tombstone> for Feature {
    fn from(tombstone: Tombstone) -> Self {
        Self::Tombstone(tombstone)
    }
}

impl From<SimpleFeature> for Feature {
    fn from(feature: SimpleFeature) -> Self {
        Self::Simple(feature)
    }
}

fn validate_id(id: String) -> TypeResult<String> {
    if id.is_empty() || id.contains('/') {
        return Err(TypeError::InvalidFeatureId(id));
    }
    Ok(id)
}
