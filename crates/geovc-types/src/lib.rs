//! Foundation types for GeoVC.
//!
//! This crate provides the identifier, schema, and feature types shared by
//! every other GeoVC crate.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`ContentHasher`]: Domain-separated hasher producing [`ObjectId`]s
//! - [`Schema`]: Ordered, typed description of a feature's properties
//! - [`Feature`]: A buffered record, either a [`SimpleFeature`] or a tombstone
//! - [`PropertyValue`]: A single typed property value

pub mod error;
pub mod feature;
pub mod hasher;
pub mod object;
pub mod path;
pub mod schema;

pub use error::{TypeError, TypeResult};
pub use feature::{Feature, SimpleFeature, Tombstone};
pub use hasher::ContentHasher;
pub use object::ObjectId;
pub use path::{append_child, node_name, parent_path};
pub use schema::{PropertyDescriptor, PropertyType, PropertyValue, Schema};
