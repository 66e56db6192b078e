//! Fields the browser UI expects on every dataset node.

use crate::tree::DatasetNode;
use crate::types::fields;
use serde_json::{Map, Value};

/// Zero values for every canonical dataset field.
const EMPTY_DATASET: &str = include_str!("../../templates/empty_dataset.json");

/// Names longer than this are truncated for `short_name`.
pub const SHORT_NAME_LIMIT: usize = 30;

pub fn empty_dataset() -> Map<String, Value> {
    match serde_json::from_str(EMPTY_DATASET) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Derive `name` and `short_name`, then add any canonical field still missing.
///
/// An empty-string `name` or `short_name` counts as missing, so a name that
/// arrives in a later batch replaces the placeholder left by an earlier one.
pub fn populate(node: &mut DatasetNode) {
    if !has_text(node, fields::NAME) {
        let derived = node
            .str_field(fields::DATASET_PATH)
            .and_then(|path| path.rsplit('/').find(|s| !s.is_empty()))
            .map(str::to_string);
        if let Some(name) = derived {
            node.fields.insert(fields::NAME.to_string(), Value::String(name));
        }
    }

    if !has_text(node, fields::SHORT_NAME) {
        if let Some(name) = node.str_field(fields::NAME).filter(|n| !n.is_empty()) {
            let short = short_name(name);
            node.fields
                .insert(fields::SHORT_NAME.to_string(), Value::String(short));
        }
    }

    for (key, value) in empty_dataset() {
        node.fields.entry(key).or_insert(value);
    }
    node.fields
        .entry(fields::SUBDATASETS.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
}

/// First [`SHORT_NAME_LIMIT`] characters plus `...` when the name is longer.
pub fn short_name(name: &str) -> String {
    if name.chars().count() > SHORT_NAME_LIMIT {
        let mut short: String = name.chars().take(SHORT_NAME_LIMIT).collect();
        short.push_str("...");
        short
    } else {
        name.to_string()
    }
}

fn has_text(node: &DatasetNode, key: &str) -> bool {
    node.str_field(key).is_some_and(|s| !s.is_empty())
}
