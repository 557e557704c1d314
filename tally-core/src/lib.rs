pub use crate::item::{AttributeValue, Item, ItemKey, UpdateExpression, PARTITION_KEY_ATTRIBUTE};

use {
    std::collections::HashMap,
    serde::{Serialize, Deserialize},
};

mod item;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const COUNTER_RECORD_ID: i64 = 1;
pub const COUNTER_ATTRIBUTE: &str = "counter";

/// Event the function is invoked with. Its content is opaque to the counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct HandlerEvent(pub serde_json::Value);

impl HandlerEvent {
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerContext {
    pub request_id: Option<String>,
}

impl HandlerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self {
            status_code: 200,
            body: String::new(),
            headers: HashMap::new(),
        }
    }
}

impl HandlerResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json<T: Serialize>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new()
            .body(serde_json::to_string(body)?)
            .header("Content-Type", CONTENT_TYPE_JSON))
    }

    pub fn error(details: impl std::fmt::Display) -> Self {
        Self::new().status(500).body(format!("Error details: {details}"))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type").map(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessBody {
    pub message: String,
    pub data: String,
}

impl SuccessBody {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            message: "Success".to_owned(),
            data: data.into(),
        }
    }
}

/// The single row backing the counter: `{ id: 1, counter: <n> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRecord {
    pub id: i64,
    pub counter: u64,
}

impl CounterRecord {
    pub fn new(counter: u64) -> Self {
        Self {
            id: COUNTER_RECORD_ID,
            counter,
        }
    }

    pub fn key() -> ItemKey {
        ItemKey::new(COUNTER_RECORD_ID)
    }
}

impl From<CounterRecord> for Item {
    fn from(record: CounterRecord) -> Self {
        Item::new()
            .with_attribute(PARTITION_KEY_ATTRIBUTE, AttributeValue::number(record.id))
            .with_attribute(COUNTER_ATTRIBUTE, AttributeValue::number(record.counter))
    }
}
