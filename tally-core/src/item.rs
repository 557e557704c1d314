use {
    std::{collections::BTreeMap, fmt},
    serde::{Serialize, Deserialize},
};

pub const PARTITION_KEY_ATTRIBUTE: &str = "id";

/// Attribute value as stored in a table. Numbers keep their decimal text, so a
/// value is only interpreted when somebody reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttributeValue {
    #[serde(rename = "N")]
    Number(String),
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null,
}

impl AttributeValue {
    pub fn number(value: impl fmt::Display) -> Self {
        Self::Number(value.to_string())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub id: i64,
}

impl ItemKey {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", PARTITION_KEY_ATTRIBUTE, self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Item {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty item holding only the partition key.
    pub fn for_key(key: &ItemKey) -> Self {
        Self::new().with_attribute(PARTITION_KEY_ATTRIBUTE, AttributeValue::number(key.id))
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }
}

/// `SET <attribute> = <value>` applied to a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateExpression {
    pub attribute: String,
    pub value: AttributeValue,
}

impl UpdateExpression {
    pub fn set(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn apply(&self, item: &mut Item) {
        item.set(self.attribute.clone(), self.value.clone());
    }
}

impl fmt::Display for UpdateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SET {} = {}", self.attribute, self.value)
    }
}
