use serde::{Deserialize, Serialize};

use geovc_types::{ObjectId, PropertyValue, Schema, SimpleFeature};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A feature schema.
    Schema,
    /// A feature payload.
    Feature,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Feature => write!(f, "feature"),
        }
    }
}

/// The immutable, stored form of a feature: its values in schema order.
///
/// The schema itself is stored separately and referenced by id from the
/// tree node that points at this feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevFeature {
    pub values: Vec<PropertyValue>,
}

impl RevFeature {
    pub fn new(values: Vec<PropertyValue>) -> Self {
        Self { values }
    }

    /// Build the stored form of a feature. Unset properties become `Null`.
    pub fn build(feature: &SimpleFeature) -> Self {
        Self::new(feature.values_in_order())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An object held in the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RevObject {
    Schema(Schema),
    Feature(RevFeature),
}

impl RevObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Schema(_) => ObjectKind::Schema,
            Self::Feature(_) => ObjectKind::Feature,
        }
    }

    /// Unwrap a schema, failing with `CorruptObject` for any other kind.
    pub fn into_schema(self, id: ObjectId) -> StoreResult<Schema> {
        match self {
            Self::Schema(schema) => Ok(schema),
            other => Err(kind_mismatch(id, ObjectKind::Schema, other.kind())),
        }
    }

    /// Unwrap a feature, failing with `CorruptObject` for any other kind.
    pub fn into_feature(self, id: ObjectId) -> StoreResult<RevFeature> {
        match self {
            Self::Feature(feature) => Ok(feature),
            other => Err(kind_mismatch(id, ObjectKind::Feature, other.kind())),
        }
    }
}

impl From<Schema> for RevObject {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<RevFeature> for RevObject {
    fn from(feature: RevFeature) -> Self {
        Self::Feature(feature)
    }
}

fn kind_mismatch(id: ObjectId, expected: ObjectKind, actual: ObjectKind) -> StoreError {
    StoreError::CorruptObject {
        id,
        reason: format!("expected {expected}, got {actual}"),
    }
}
