use serde_json::Value as JsonValue;

use crate::data::{ResultSet, Value};
use crate::format::{check_structure, FormatError, Formatter};

/// An array of objects keyed by field name, field order preserved from
/// the schema. Integers stay integers; nothing is coerced through f64.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, results: &ResultSet) -> Result<String, FormatError> {
        check_structure(results)?;

        let mut array = Vec::with_capacity(results.rows.len());
        for row in &results.rows {
            let mut object = serde_json::Map::with_capacity(results.schema.len());
            for (i, field) in results.schema.fields.iter().enumerate() {
                let value = row.get(i).map(Value::to_json).unwrap_or(JsonValue::Null);
                object.insert(field.name.clone(), value);
            }
            array.push(JsonValue::Object(object));
        }

        Ok(serde_json::to_string(&JsonValue::Array(array))?)
    }
}
