use geovc_store::RevFeature;
use geovc_types::ObjectId;

/// A single change to apply to the working tree.
///
/// `path` is the full node path: the tree path joined with the feature id.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Insert or replace the feature node at `path`.
    Insert {
        path: String,
        feature: RevFeature,
        schema_id: ObjectId,
    },
    /// Remove the feature node at `path`.
    Delete { path: String },
}

impl Mutation {
    pub fn insert(path: impl Into<String>, feature: RevFeature, schema_id: ObjectId) -> Self {
        Self::Insert {
            path: path.into(),
            feature,
            schema_id,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::Delete { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Insert { path, .. } | Self::Delete { path } => path,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    /// The stored schema referenced by an insert.
    pub fn schema_id(&self) -> Option<&ObjectId> {
        match self {
            Self::Insert { schema_id, .. } => Some(schema_id),
            Self::Delete { .. } => None,
        }
    }
}
