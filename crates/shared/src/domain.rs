use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(ListId);
id_newtype!(ItemId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    #[default]
    Shopping,
    Todo,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListType::Shopping => "shopping",
            ListType::Todo => "todo",
        }
    }
}

impl std::str::FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shopping" => Ok(ListType::Shopping),
            "todo" | "to-do" => Ok(ListType::Todo),
            other => Err(format!("unknown list type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Header,
    #[default]
    #[serde(other)]
    Normal,
}

/// A single entry of a list as mirrored from the list service.
///
/// Fields the card does not interpret are kept in `extra` so the record can be
/// handed back to the service unchanged when the list is reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: ItemId,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: bool,
    #[serde(default, deserialize_with = "deserialize_item_type")]
    pub item_type: ItemType,
    #[serde(default, deserialize_with = "deserialize_item_pos")]
    pub item_pos: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(item_id: impl Into<String>, text: impl Into<String>, status: bool) -> Self {
        Self {
            item_id: ItemId::new(item_id),
            text: text.into(),
            status,
            item_type: ItemType::Normal,
            item_pos: 0,
            extra: Map::new(),
        }
    }

    pub fn header(item_id: impl Into<String>, text: impl Into<String>, item_pos: i64) -> Self {
        Self {
            item_type: ItemType::Header,
            item_pos,
            ..Self::new(item_id, text, false)
        }
    }

    pub fn is_header(&self) -> bool {
        self.item_type == ItemType::Header
    }
}

/// One list as published in the host's `lists` attribute, items included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub list_id: ListId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub list_type: ListType,
    #[serde(default)]
    pub items: Vec<Item>,
}

// The service reports status either as a boolean or as "complete"/"incomplete".
fn deserialize_status<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(value),
        Some(Value::String(value)) => Ok(value.eq_ignore_ascii_case("complete")),
        Some(Value::Number(value)) => Ok(value.as_i64().unwrap_or(0) != 0),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unsupported item status {other}"
        ))),
    }
}

fn deserialize_item_type<'de, D>(deserializer: D) -> Result<ItemType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some(value) if value.eq_ignore_ascii_case("header") => ItemType::Header,
        _ => ItemType::Normal,
    })
}

fn deserialize_item_pos<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(value)) => Ok(value.as_i64().unwrap_or(0)),
        Some(Value::String(value)) => Ok(value.trim().parse().unwrap_or(0)),
        _ => Ok(0),
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
