//! Walker for JSON text components: nested objects with `text` and `extra` fields.

use crate::types::TextMapping;
use serde_json::Value;

const TEXT_KEY: &str = "text";
const EXTRA_KEY: &str = "extra";

/// Whether a value would count as "set" in a loosely-typed merge.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are all considered unset.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(bool) => *bool,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(str) => !str.is_empty(),
        Value::Array(array) => !array.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Appends every string reachable through `text`/`extra` fields and arrays to `output`, depth-first.
///
/// Duplicates are kept, deduplication is the caller's job.
pub fn extract_json_text(value: &Value, output: &mut Vec<String>) {
    match value {
        Value::Object(object) => {
            if let Some(text) = object.get(TEXT_KEY) {
                extract_json_text(text, output);
            }

            if let Some(extra) = object.get(EXTRA_KEY) {
                extract_json_text(extra, output);
            }
        }
        Value::Array(array) => {
            for element in array {
                extract_json_text(element, output);
            }
        }
        Value::String(str) => output.push(str.clone()),
        _ => {}
    }
}

/// Returns a structurally identical value, with strings replaced by their translations from `mapping`.
///
/// Keys other than `text` and `extra` are carried over untouched.
#[must_use]
pub fn translate_json(value: &Value, mapping: &TextMapping) -> Value {
    match value {
        Value::Object(object) => {
            let mut translated = object.clone();

            for key in [TEXT_KEY, EXTRA_KEY] {
                let Some(field) = object.get(key) else {
                    continue;
                };

                let field = translate_json(field, mapping);

                if is_truthy(&field) {
                    translated.insert(key.to_owned(), field);
                }
            }

            Value::Object(translated)
        }
        Value::Array(array) => Value::Array(
            array
                .iter()
                .map(|element| translate_json(element, mapping))
                .collect(),
        ),
        Value::String(str) => match mapping.get(str) {
            Some(translation) => Value::String(translation.to_owned()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}
