//! NDJSON feature input.
//!
//! Each line is one record:
//!
//! ```text
//! {"id": "r1", "properties": {"geom": "LINESTRING (0 0, 1 1)", "lanes": 2}}
//! {"id": "r7", "delete": true}
//! ```
//!
//! Property values are converted using the bindings of the schema given on
//! the command line.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use geovc_types::{Feature, PropertyDescriptor, PropertyType, PropertyValue, Schema, SimpleFeature};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct SchemaFile {
    name: String,
    properties: Vec<PropertyDescriptor>,
}

#[derive(Deserialize)]
struct Record {
    id: String,
    #[serde(default)]
    delete: bool,
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

/// Read a schema description: `{"name": .., "properties": [{"name", "binding", "nullable"}]}`.
pub fn read_schema(path: &Path) -> anyhow::Result<Arc<Schema>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    let file: SchemaFile = serde_json::from_str(&text)
        .with_context(|| format!("invalid schema file {}", path.display()))?;
    Ok(Arc::new(Schema::new(file.name, file.properties)?))
}

/// Parse one NDJSON line into a feature, rejecting records that leave a
/// non-nullable property unset.
pub fn parse_feature(line: &str, schema: Option<&Arc<Schema>>) -> anyhow::Result<Feature> {
    let record: Record = serde_json::from_str(line)?;
    if record.delete {
        return Ok(Feature::tombstone(record.id)?);
    }

    let schema = schema.ok_or_else(|| anyhow!("feature {} has properties but no --schema was given", record.id))?;
    let mut feature = SimpleFeature::new(record.id, Arc::clone(schema))?;
    for (name, json) in record.properties {
        let binding = schema
            .property(&name)
            .map(|desc| desc.binding)
            .ok_or_else(|| anyhow!("property {name} is not in schema {}", schema.name()))?;
        feature.set(&name, convert(&name, binding, json)?)?;
    }
    feature.check_complete()?;
    Ok(feature.into())
}

fn convert(name: &str, binding: PropertyType, json: Value) -> anyhow::Result<PropertyValue> {
    let value = match (binding, json) {
        (_, Value::Null) => PropertyValue::Null,
        (PropertyType::Boolean, Value::Bool(b)) => PropertyValue::Boolean(b),
        (PropertyType::Integer, Value::Number(n)) if n.is_i64() => {
            PropertyValue::Integer(n.as_i64().unwrap_or_default())
        }
        (PropertyType::Double, Value::Number(n)) => match n.as_f64() {
            Some(f) => PropertyValue::Double(f),
            None => bail!("property {name}: {n} is not a finite number"),
        },
        (PropertyType::String, Value::String(s)) => PropertyValue::String(s),
        (PropertyType::Geometry, Value::String(wkt)) => PropertyValue::Geometry(wkt),
        (binding, other) => bail!("property {name}: expected {binding}, got {other}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "roads",
                vec![
                    PropertyDescriptor::required("geom", PropertyType::Geometry),
                    PropertyDescriptor::new("lanes", PropertyType::Integer),
                    PropertyDescriptor::new("width", PropertyType::Double),
                    PropertyDescriptor::new("paved", PropertyType::Boolean),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn parses_feature_record() {
        let line = r#"{"id":"r1","properties":{"geom":"POINT (1 2)","lanes":2,"width":3.5,"paved":true}}"#;
        let feature = parse_feature(line, Some(&schema())).unwrap();
        let Feature::Simple(f) = feature else {
            panic!("expected simple feature");
        };
        assert_eq!(f.id(), "r1");
        assert_eq!(f.get("lanes"), Some(&PropertyValue::Integer(2)));
        assert_eq!(f.get("width"), Some(&PropertyValue::Double(3.5)));
        assert_eq!(f.get("paved"), Some(&PropertyValue::Boolean(true)));
        assert_eq!(f.get("geom"), Some(&PropertyValue::Geometry("POINT (1 2)".into())));
    }

    #[test]
    fn parses_tombstone_without_schema() {
        let feature = parse_feature(r#"{"id":"r9","delete":true}"#, None).unwrap();
        assert!(feature.is_tombstone());
        assert_eq!(feature.id(), "r9");
    }

    #[test]
    fn integer_property_rejects_fraction() {
        let line = r#"{"id":"r1","properties":{"geom":"POINT (0 0)","lanes":2.5}}"#;
        assert!(parse_feature(line, Some(&schema())).is_err());
    }

    #[test]
    fn unknown_property_rejected() {
        let line = r#"{"id":"r1","properties":{"colour":"red"}}"#;
        let err = parse_feature(line, Some(&schema())).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn missing_required_property_rejected() {
        let line = r#"{"id":"r1","properties":{"lanes":2}}"#;
        let err = parse_feature(line, Some(&schema())).unwrap_err();
        assert!(err.to_string().contains("geom"));
    }

    #[test]
    fn features_need_a_schema() {
        assert!(parse_feature(r#"{"id":"r1","properties":{}}"#, None).is_err());
    }

    #[test]
    fn reads_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.json");
        std::fs::write(
            &path,
            r#"{"name":"roads","properties":[{"name":"geom","binding":"geometry","nullable":false},{"name":"lanes","binding":"integer"}]}"#,
        )
        .unwrap();

        let schema = read_schema(&path).unwrap();
        assert_eq!(schema.name(), "roads");
        assert_eq!(schema.len(), 2);
        assert!(!schema.properties()[0].nullable);
        assert!(schema.properties()[1].nullable);
    }
}
