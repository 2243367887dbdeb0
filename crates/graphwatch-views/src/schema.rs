//! Graph schema shapes from `apoc.meta.schema`.
//!
//! The procedure returns a single row whose `value` column maps each
//! label and relationship type to a nested description. Normalization
//! flattens that into sorted, typed records; counts go through the
//! explicit extended-integer conversion because apoc reports them in the
//! driver's integer representation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use graphwatch_client::ConnectionRegistry;
use graphwatch_core::{value, GraphwatchError, Params, Result};

use crate::fetch;

pub const SCHEMA_QUERY: &str = "CALL apoc.meta.schema";

/// Declared shape of one property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySchema {
    #[serde(default)]
    pub existence: bool,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub array: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// One relationship type, either standalone or as seen from a label.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelationshipSchema {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub properties: BTreeMap<String, PropertySchema>,
}

/// One node label with its properties and attached relationship types.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LabelSchema {
    pub label: String,
    pub labels: Vec<String>,
    pub count: i64,
    pub relationships: Vec<RelationshipSchema>,
    pub properties: BTreeMap<String, PropertySchema>,
}

/// The normalized schema: labels and relationship types, each sorted by
/// name.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GraphSchema {
    pub labels: Vec<LabelSchema>,
    pub types: Vec<RelationshipSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Normalize the `value` map of the apoc row.
pub fn normalize(entries: &Value) -> Result<GraphSchema> {
    let Value::Object(map) = entries else {
        return Err(GraphwatchError::Decode(format!(
            "expected a schema map, got: {entries}"
        )));
    };

    let mut labels = Vec::new();
    let mut types = Vec::new();
    for (name, entry) in map {
        match entry.get("type").and_then(Value::as_str) {
            Some("node") => labels.push(to_label_schema(name, entry)?),
            Some("relationship") => types.push(to_relationship_schema(name, entry)?),
            other => {
                tracing::debug!(name = %name, kind = ?other, "skipping schema entry");
            }
        }
    }
    labels.sort_by(|a, b| a.label.cmp(&b.label));
    types.sort_by(|a, b| a.rel_type.cmp(&b.rel_type));

    Ok(GraphSchema {
        labels,
        types,
        database: None,
    })
}

fn to_label_schema(label: &str, entry: &Value) -> Result<LabelSchema> {
    let mut relationships = match entry.get("relationships") {
        Some(Value::Object(rels)) => rels
            .iter()
            .map(|(name, rel)| to_relationship_schema(name, rel))
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    relationships.sort_by(|a, b| a.rel_type.cmp(&b.rel_type));

    Ok(LabelSchema {
        label: label.to_owned(),
        labels: parse_or_default(entry.get("labels"), "labels")?,
        count: count_of(entry),
        relationships,
        properties: parse_or_default(entry.get("properties"), "properties")?,
    })
}

fn to_relationship_schema(rel_type: &str, entry: &Value) -> Result<RelationshipSchema> {
    Ok(RelationshipSchema {
        rel_type: rel_type.to_owned(),
        count: count_of(entry),
        direction: parse_or_default(entry.get("direction"), "direction")?,
        properties: parse_or_default(entry.get("properties"), "properties")?,
    })
}

fn count_of(entry: &Value) -> i64 {
    entry.get("count").and_then(value::to_int).unwrap_or(0)
}

fn parse_or_default<T>(value: Option<&Value>, field: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| GraphwatchError::Decode(format!("schema field {field}: {e}"))),
    }
}

/// Fetch and normalize the schema of the given database (or of whatever
/// the session factory resolves when none is given).
pub async fn fetch_schema(
    registry: &Arc<ConnectionRegistry>,
    database: Option<String>,
) -> Result<GraphSchema> {
    let (rows, resolved) = fetch::rows(registry, SCHEMA_QUERY, Params::new(), database).await?;

    let mut schema = match rows.first().and_then(|row| row.get("value")) {
        Some(entries) => normalize(entries)?,
        None => GraphSchema::default(),
    };
    schema.database = resolved;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apoc_value() -> Value {
        json!({
            "Person": {
                "type": "node",
                "count": {"low": 42, "high": 0},
                "labels": ["Person"],
                "properties": {
                    "name": {"existence": false, "type": "STRING", "array": false},
                    "age": {"existence": false, "type": "INTEGER", "array": false}
                },
                "relationships": {
                    "FOLLOWS": {
                        "count": 7,
                        "direction": "out",
                        "properties": {}
                    },
                    "ACTED_IN": {
                        "count": 3,
                        "direction": "out",
                        "properties": {
                            "roles": {"existence": false, "type": "LIST", "array": true}
                        }
                    }
                }
            },
            "Movie": {
                "type": "node",
                "count": 9,
                "labels": ["Movie"],
                "properties": {},
                "relationships": {}
            },
            "ACTED_IN": {
                "type": "relationship",
                "count": 3,
                "properties": {
                    "roles": {"existence": false, "type": "LIST", "array": true}
                }
            }
        })
    }

    #[test]
    fn labels_and_types_come_out_sorted() {
        let schema = normalize(&apoc_value()).unwrap();

        let names: Vec<&str> = schema.labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, ["Movie", "Person"]);

        let person = &schema.labels[1];
        let rels: Vec<&str> = person
            .relationships
            .iter()
            .map(|r| r.rel_type.as_str())
            .collect();
        assert_eq!(rels, ["ACTED_IN", "FOLLOWS"]);

        assert_eq!(schema.types.len(), 1);
        assert_eq!(schema.types[0].rel_type, "ACTED_IN");
    }

    #[test]
    fn counts_convert_from_the_extended_representation() {
        let schema = normalize(&apoc_value()).unwrap();
        let person = schema.labels.iter().find(|l| l.label == "Person").unwrap();
        assert_eq!(person.count, 42);

        let movie = schema.labels.iter().find(|l| l.label == "Movie").unwrap();
        assert_eq!(movie.count, 9);
    }

    #[test]
    fn properties_are_typed_and_key_sorted() {
        let schema = normalize(&apoc_value()).unwrap();
        let person = schema.labels.iter().find(|l| l.label == "Person").unwrap();

        let keys: Vec<&String> = person.properties.keys().collect();
        assert_eq!(keys, ["age", "name"]);
        assert_eq!(person.properties["age"].property_type, "INTEGER");
        assert!(!person.properties["age"].array);

        let acted_in = &person.relationships[0];
        assert_eq!(acted_in.direction, Some(Direction::Out));
        assert!(acted_in.properties["roles"].array);
    }

    #[test]
    fn non_object_input_is_a_decode_error() {
        assert!(matches!(
            normalize(&json!(["not", "a", "map"])),
            Err(GraphwatchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn fetch_schema_carries_the_resolved_database() {
        use graphwatch_client::mock::{MockBackend, MockResponse};
        use graphwatch_core::RowSet;

        let mock = MockBackend::new();
        let rows =
            RowSet::new(vec!["value".into()], vec![vec![apoc_value()]]).unwrap();
        mock.respond(SCHEMA_QUERY, MockResponse::rows(rows));

        let registry = ConnectionRegistry::new();
        registry
            .adopt(Arc::new(mock.clone()), Some("contextdb".into()))
            .await
            .unwrap();

        let schema = fetch_schema(&Arc::new(registry), None).await.unwrap();
        assert_eq!(schema.database, Some("contextdb".into()));
        assert_eq!(schema.labels.len(), 2);
    }
}
