use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::time::{now_utc, to_rfc3339};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Map<String, Value>,
        time_extracted: String,
    },
    State {
        value: Value,
    },
}

impl Message {
    pub fn schema(stream: &str, schema: Value, key_properties: Vec<String>) -> Self {
        Message::Schema { stream: stream.to_owned(), schema, key_properties }
    }

    /// Record stamped with the current extraction time.
    pub fn record(stream: &str, record: Map<String, Value>) -> Self {
        Message::Record {
            stream: stream.to_owned(),
            record,
            time_extracted: to_rfc3339(now_utc()),
        }
    }

    pub fn state(value: Value) -> Self {
        Message::State { value }
    }
}
