//! Ordered result rows with lookup by column name.
//!
//! A [`RowSet`] preserves the server's projection order both across
//! columns and across rows; a [`Row`] is an ordered mapping from declared
//! column name to a JSON value, with typed extraction via serde.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GraphwatchError, Result};

/// One result record, with named, ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Column names in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Value at a projection position.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Deserialize a column into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, column: &str) -> Result<T> {
        let value = self
            .get(column)
            .ok_or_else(|| GraphwatchError::Decode(format!("no such column: {column}")))?;
        serde_json::from_value(value.clone())
            .map_err(|e| GraphwatchError::Decode(format!("column {column}: {e}")))
    }

    /// The row as a JSON object, preserving column order.
    pub fn to_object(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(self.values.len());
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.insert(column.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// An ordered sequence of rows sharing one projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Build a result set from a column list and per-row value lists.
    ///
    /// Fails with [`GraphwatchError::Decode`] if any row's arity does not
    /// match the column count.
    pub fn new(columns: Vec<String>, values: Vec<Vec<Value>>) -> Result<Self> {
        let columns: Arc<[String]> = columns.into();
        let mut rows = Vec::with_capacity(values.len());
        for row in values {
            if row.len() != columns.len() {
                return Err(GraphwatchError::Decode(format!(
                    "row arity {} does not match {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(Row {
                columns: Arc::clone(&columns),
                values: row,
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a result set from decoded row objects.
    ///
    /// The column list is taken from the first object's key order; later
    /// rows are aligned to it, with missing keys filled as null. An empty
    /// input yields an empty set with no columns.
    pub fn from_objects(objects: Vec<Value>) -> Result<Self> {
        let Some(first) = objects.first() else {
            return Ok(Self::default());
        };
        let Value::Object(map) = first else {
            return Err(GraphwatchError::Decode(format!(
                "expected a row object, got: {first}"
            )));
        };
        let columns: Vec<String> = map.keys().cloned().collect();

        let mut values = Vec::with_capacity(objects.len());
        for object in &objects {
            let Value::Object(map) = object else {
                return Err(GraphwatchError::Decode(format!(
                    "expected a row object, got: {object}"
                )));
            };
            values.push(
                columns
                    .iter()
                    .map(|c| map.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }
        Self::new(columns, values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The first row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl std::ops::Index<usize> for RowSet {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

pub mod value {
    //! Conversions out of the store's value representations.

    use serde_json::Value;

    /// Convert an extended integer representation to an `i64`.
    ///
    /// Accepts a plain integer, a float with no fractional part, or the
    /// `{low, high}` pair some drivers use for 64-bit integers (two signed
    /// 32-bit halves). Counts coming out of normalization layers must go
    /// through this explicitly rather than assuming a plain number.
    pub fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(i);
                }
                let f = n.as_f64()?;
                (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
                    .then_some(f as i64)
            }
            Value::Object(map) => {
                let low = map.get("low")?.as_i64()?;
                let high = map.get("high")?.as_i64()?;
                Some((high << 32) | (low as u32 as i64))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RowSet {
        RowSet::new(
            vec!["name".into(), "count".into()],
            vec![
                vec![json!("alice"), json!(3)],
                vec![json!("bob"), json!(5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_name_and_position() {
        let rows = sample();
        assert_eq!(rows.len(), 2);
        let first = rows.first().unwrap();
        assert_eq!(first.get("name"), Some(&json!("alice")));
        assert_eq!(first.at(1), Some(&json!(3)));
        assert_eq!(first.get("missing"), None);
    }

    #[test]
    fn typed_extraction() {
        let rows = sample();
        let count: i64 = rows[1].get_as("count").unwrap();
        assert_eq!(count, 5);
        let err = rows[1].get_as::<i64>("name").unwrap_err();
        assert!(matches!(err, GraphwatchError::Decode(_)));
    }

    #[test]
    fn arity_mismatch_rejected() {
        let err = RowSet::new(vec!["a".into()], vec![vec![json!(1), json!(2)]]).unwrap_err();
        assert!(matches!(err, GraphwatchError::Decode(_)));
    }

    #[test]
    fn from_objects_preserves_key_order() {
        let rows = RowSet::from_objects(vec![
            json!({"z": 1, "a": 2}),
            json!({"z": 3, "a": 4}),
        ])
        .unwrap();
        assert_eq!(rows.columns(), ["z", "a"]);
        assert_eq!(rows[1].get("a"), Some(&json!(4)));
    }

    #[test]
    fn from_objects_fills_missing_columns() {
        let rows =
            RowSet::from_objects(vec![json!({"a": 1, "b": 2}), json!({"a": 3})]).unwrap();
        assert_eq!(rows[1].get("b"), Some(&Value::Null));
    }

    #[test]
    fn from_objects_empty() {
        let rows = RowSet::from_objects(vec![]).unwrap();
        assert!(rows.is_empty());
        assert!(rows.first().is_none());
    }

    #[test]
    fn row_to_object_round_trips() {
        let rows = sample();
        assert_eq!(rows[0].to_object(), json!({"name": "alice", "count": 3}));
    }

    #[test]
    fn int_conversion() {
        assert_eq!(value::to_int(&json!(42)), Some(42));
        assert_eq!(value::to_int(&json!(42.0)), Some(42));
        assert_eq!(value::to_int(&json!(42.5)), None);
        assert_eq!(value::to_int(&json!("42")), None);
        // {low, high} pair: high * 2^32 + unsigned low
        assert_eq!(value::to_int(&json!({"low": 7, "high": 0})), Some(7));
        assert_eq!(
            value::to_int(&json!({"low": 0, "high": 1})),
            Some(1_i64 << 32)
        );
        assert_eq!(
            value::to_int(&json!({"low": -1, "high": 0})),
            Some(u32::MAX as i64)
        );
    }
}
