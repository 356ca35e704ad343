//! Storage format variants.
//!
//! A format fixes how objects are encoded and hashed. Each encoded blob
//! starts with a one-byte marker naming its format, and each format hashes
//! under its own domain tag, so blobs written by one format are rejected by
//! every other.
//!
//! ```text
//! 0.1: [0x01] zstd(bincode(object))
//! 0.2: [0x02] bincode(object)
//! ```

use std::fmt;
use std::str::FromStr;

use geovc_types::{ContentHasher, ObjectId};

use crate::error::{StoreError, StoreResult};
use crate::object::RevObject;

/// zstd level used by the compressed format. Favors speed over ratio.
const ZSTD_LEVEL: i32 = 1;

/// A named storage format version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageFormat {
    /// bincode wrapped in zstd block compression.
    #[default]
    V0_1,
    /// Plain bincode.
    V0_2,
}

impl StorageFormat {
    pub const ALL: [StorageFormat; 2] = [Self::V0_1, Self::V0_2];

    /// The version string persisted in repository configuration.
    pub fn version(&self) -> &'static str {
        match self {
            Self::V0_1 => "0.1",
            Self::V0_2 => "0.2",
        }
    }

    fn marker(&self) -> u8 {
        match self {
            Self::V0_1 => 0x01,
            Self::V0_2 => 0x02,
        }
    }

    /// The hasher that derives object ids for this format.
    pub fn hasher(&self) -> ContentHasher {
        match self {
            Self::V0_1 => ContentHasher::new("geovc-object-v0.1"),
            Self::V0_2 => ContentHasher::new("geovc-object-v0.2"),
        }
    }

    /// Encode an object into the bytes stored on disk.
    pub fn encode(&self, object: &RevObject) -> StoreResult<Vec<u8>> {
        let payload =
            bincode::serialize(object).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut out = Vec::with_capacity(payload.len() + 1);
        out.push(self.marker());
        match self {
            Self::V0_1 => {
                let compressed = zstd::encode_all(payload.as_slice(), ZSTD_LEVEL)
                    .map_err(|e| StoreError::Compression(e.to_string()))?;
                out.extend_from_slice(&compressed);
            }
            Self::V0_2 => out.extend_from_slice(&payload),
        }
        Ok(out)
    }

    /// Encode an object and compute its id.
    pub fn encode_with_id(&self, object: &RevObject) -> StoreResult<(ObjectId, Vec<u8>)> {
        let bytes = self.encode(object)?;
        Ok((self.hasher().hash(&bytes), bytes))
    }

    /// Decode bytes previously produced by [`StorageFormat::encode`].
    ///
    /// `id` is used for error reporting only.
    pub fn decode(&self, id: ObjectId, bytes: &[u8]) -> StoreResult<RevObject> {
        let corrupt = |reason: String| StoreError::CorruptObject { id, reason };

        let (&marker, body) = bytes
            .split_first()
            .ok_or_else(|| corrupt("empty object".into()))?;
        if marker != self.marker() {
            return Err(corrupt(format!(
                "format marker {marker:#04x} does not match storage format {self}"
            )));
        }

        let decoded;
        let payload = match self {
            Self::V0_1 => {
                decoded = zstd::decode_all(body).map_err(|e| corrupt(e.to_string()))?;
                decoded.as_slice()
            }
            Self::V0_2 => body,
        };
        bincode::deserialize(payload).map_err(|e| corrupt(e.to_string()))
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for StorageFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.version() == s)
            .ok_or_else(|| StoreError::UnknownFormat(s.to_string()))
    }
}
