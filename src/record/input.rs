//! Decoding of the metadata input stream.
//!
//! Accepted shapes: a single JSON array of objects, a single JSON object, or JSON
//! Lines (one object per line). A bad line is reported for that line only.

use crate::error::RecordError;
use serde_json::Value;
use std::io::Read;

/// One decoded input item, tagged with its 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct InputItem {
    pub line: usize,
    pub value: Result<Value, RecordError>,
}

impl InputItem {
    pub fn from_value(line: usize, value: Value) -> Self {
        let value = if value.is_object() {
            Ok(value)
        } else {
            Err(RecordError::NotAnObject { line })
        };
        Self { line, value }
    }
}

/// Read everything from `reader` and decode it.
pub fn read_input<R: Read>(mut reader: R) -> std::io::Result<Vec<InputItem>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(decode_stream(&text))
}

/// Decode input text into items, one per metadata object.
pub fn decode_stream(text: &str) -> Vec<InputItem> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(document) = serde_json::from_str::<Value>(trimmed) {
        return match document {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| InputItem::from_value(i + 1, item))
                .collect(),
            other => vec![InputItem::from_value(1, other)],
        };
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let line_no = i + 1;
            match serde_json::from_str::<Value>(line.trim_end()) {
                Ok(value) => InputItem::from_value(line_no, value),
                Err(e) => InputItem {
                    line: line_no,
                    value: Err(RecordError::Decode {
                        line: line_no,
                        message: e.to_string(),
                    }),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_document_yields_each_element() {
        let items = decode_stream(r#"[{"type": "dataset"}, {"type": "file"}]"#);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].line, 2);
        assert!(items.iter().all(|i| i.value.is_ok()));
    }

    #[test]
    fn single_object_document_yields_one_item() {
        let items = decode_stream("{\"type\": \"dataset\"}\n");
        assert_eq!(items.len(), 1);
        assert!(items[0].value.is_ok());
    }

    #[test]
    fn json_lines_keep_going_past_a_bad_line() {
        let text = "{\"type\": \"dataset\"}\n\nnot json\n[1, 2]\n{\"type\": \"file\"}\n";
        let items = decode_stream(text);
        assert_eq!(items.len(), 4);
        assert!(items[0].value.is_ok());
        assert!(matches!(
            items[1].value,
            Err(RecordError::Decode { line: 3, .. })
        ));
        assert_eq!(items[2].value, Err(RecordError::NotAnObject { line: 4 }));
        assert_eq!(items[3].line, 5);
        assert!(items[3].value.is_ok());
    }

    #[test]
    fn empty_input_has_no_items() {
        assert!(decode_stream("  \n ").is_empty());
    }
}
