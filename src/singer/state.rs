use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

const BOOKMARKS_KEY: &str = "bookmarks";

pub fn load_state(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read state '{}'", path.display()))?;
    let state: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid state '{}'", path.display()))?;
    if !state.is_object() {
        return Err(anyhow!("state '{}' must contain a JSON object", path.display()));
    }
    Ok(state)
}

/// Input state with an (empty) bookmark entry for every synced stream.
/// Existing bookmarks are left as they are; contacts carry no replication key.
pub fn final_state(input: Option<Value>, synced_streams: &[String]) -> Value {
    let mut state = match input {
        Some(Value::Object(state)) => state,
        _ => Map::new(),
    };

    let bookmarks = state
        .entry(BOOKMARKS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !bookmarks.is_object() {
        *bookmarks = Value::Object(Map::new());
    }
    if let Value::Object(bookmarks) = bookmarks {
        for stream in synced_streams {
            bookmarks
                .entry(stream.as_str())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    Value::Object(state)
}
