// SPDX-License-Identifier: MPL-2.0

//! Wire-format normalization for hierarchy endpoint responses.
//!
//! Two shapes are served by the children endpoints and both are accepted:
//!
//! ```json
//! [{"id": 10, "name": "Sub A"}]
//! {"subcategories": [{"id": 10, "name": "Sub A", "slug": "sub-a"}]}
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::error::FetchError;
use crate::widgets::cascade::ChoiceOption;

/// A single child record as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
struct ChildRecord {
    id: RecordId,
    name: String,
    #[serde(default)]
    slug: Option<String>,
}

/// Identifiers arrive as JSON numbers from the primary-key column, but some
/// endpoints stringify them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    fn into_string(self) -> String {
        match self {
            RecordId::Int(n) => n.to_string(),
            RecordId::Text(s) => s,
        }
    }
}

/// Normalizes a decoded response body into an ordered option list.
///
/// `wrapper_key` names the field holding the array when the body is an
/// object. Without one, an object is accepted only if exactly one of its
/// fields is an array.
pub fn normalize_children(
    body: Value,
    wrapper_key: Option<&str>,
) -> Result<Vec<ChoiceOption>, FetchError> {
    let records = match body {
        Value::Array(items) => items,
        Value::Object(mut fields) => match wrapper_key {
            Some(key) => match fields.remove(key) {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(FetchError::ResponseFormat(format!(
                        "field '{}' is {}, expected an array",
                        key,
                        json_type(&other)
                    )));
                }
                None => {
                    return Err(FetchError::ResponseFormat(format!(
                        "object response has no '{}' field",
                        key
                    )));
                }
            },
            None => {
                let mut arrays = fields.into_iter().filter(|(_, v)| v.is_array());
                match (arrays.next(), arrays.next()) {
                    (Some((_, Value::Array(items))), None) => items,
                    (None, _) => {
                        return Err(FetchError::ResponseFormat(
                            "object response has no array field".to_string(),
                        ));
                    }
                    _ => {
                        return Err(FetchError::ResponseFormat(
                            "object response has several array fields and no wrapper key"
                                .to_string(),
                        ));
                    }
                }
            }
        },
        other => {
            return Err(FetchError::ResponseFormat(format!(
                "expected an array or object, got {}",
                json_type(&other)
            )));
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let record: ChildRecord = serde_json::from_value(raw).map_err(|e| {
                FetchError::ResponseFormat(format!("child #{}: {}", i, e))
            })?;
            let mut option = ChoiceOption::new(record.id.into_string(), record.name);
            option.slug = record.slug;
            Ok(option)
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
