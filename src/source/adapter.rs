//! Conversion of the JSON shapes returned by data endpoints into a
//! [`Dataset`].
//!
//! Accepted shapes:
//! - `[{...}, {...}]`: one row per object, headers are the union of keys
//! - `{"value": [...]}`: an OData collection envelope around any array
//! - `[["h1", "h2"], [1, 2]]`: first row is the header row
//! - `[1, "a"]`: a single `Value` column
//! - `{...}`: one Name/Value row per property
//!
//! Object keys starting with `@` (OData annotations) are skipped.

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

use super::Dataset;
use crate::grid::CellValue;

pub fn rows_from_json(value: &Value) -> Result<Dataset> {
    match value {
        Value::Object(object) => match object.get("value") {
            Some(Value::Array(items)) => from_array(items),
            _ => Ok(from_object(object)),
        },
        Value::Array(items) => from_array(items),
        Value::Null => Ok(Dataset::default()),
        other => Err(anyhow!("Unsupported JSON shape: {}", kind(other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_annotation(key: &str) -> bool {
    key.starts_with('@')
}

fn from_array(items: &[Value]) -> Result<Dataset> {
    if items.is_empty() {
        return Ok(Dataset::default());
    }
    if items.iter().all(Value::is_object) {
        return Ok(from_objects(items));
    }
    if items.iter().all(Value::is_array) {
        return Ok(from_arrays(items));
    }
    if items.iter().all(|item| !item.is_object() && !item.is_array()) {
        return Ok(Dataset {
            headers: vec!["Value".to_string()],
            rows: items
                .iter()
                .map(|item| vec![CellValue::from(item.clone())])
                .collect(),
        });
    }
    Err(anyhow!("Array mixes objects, arrays and scalars"))
}

fn from_objects(items: &[Value]) -> Dataset {
    let mut headers: Vec<String> = Vec::new();
    for object in items.iter().filter_map(Value::as_object) {
        for key in object.keys() {
            if !is_annotation(key) && !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| {
            headers
                .iter()
                .map(|header| {
                    object
                        .get(header)
                        .cloned()
                        .map(CellValue::from)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Dataset { headers, rows }
}

fn from_arrays(items: &[Value]) -> Dataset {
    let mut arrays = items.iter().filter_map(Value::as_array);
    let headers = arrays
        .next()
        .map(|first| first.iter().map(|cell| CellValue::from(cell.clone()).text()).collect())
        .unwrap_or_default();
    let rows = arrays
        .map(|row| row.iter().cloned().map(CellValue::from).collect())
        .collect();
    Dataset { headers, rows }
}

fn from_object(object: &Map<String, Value>) -> Dataset {
    Dataset {
        headers: vec!["Name".to_string(), "Value".to_string()],
        rows: object
            .iter()
            .filter(|(key, _)| !is_annotation(key))
            .map(|(key, value)| vec![CellValue::Text(key.clone()), CellValue::from(value.clone())])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_odata_envelope() -> Result<()> {
        let dataset = rows_from_json(&json!({
            "@odata.context": "ignored",
            "value": [
                {"@odata.etag": "W/1", "name": "Contoso", "revenue": 10},
                {"name": "Fabrikam", "city": "Oslo"}
            ]
        }))?;
        assert_eq!(dataset.headers, vec!["name", "revenue", "city"]);
        assert_eq!(dataset.rows[1][1], CellValue::Empty);
        assert_eq!(dataset.rows[0][1].text(), "10");
        Ok(())
    }

    #[test]
    fn test_array_of_arrays() -> Result<()> {
        let dataset = rows_from_json(&json!([["Name", "Age"], ["Ann", 5], ["Bob"]]))?;
        assert_eq!(dataset.headers, vec!["Name", "Age"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1].len(), 1);
        Ok(())
    }

    #[test]
    fn test_plain_object_and_scalars() -> Result<()> {
        let dataset = rows_from_json(&json!({"b": true, "a": null}))?;
        assert_eq!(dataset.headers, vec!["Name", "Value"]);
        assert_eq!(dataset.rows.len(), 2);

        let dataset = rows_from_json(&json!([1, "x"]))?;
        assert_eq!(dataset.headers, vec!["Value"]);
        assert_eq!(dataset.rows[1][0], CellValue::Text("x".into()));

        assert!(rows_from_json(&json!([1, {"a": 1}])).is_err());
        assert!(rows_from_json(&json!("text")).is_err());
        assert!(rows_from_json(&json!([]))?.rows.is_empty());
        Ok(())
    }
}
