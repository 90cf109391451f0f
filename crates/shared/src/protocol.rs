use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{ItemId, ListId, ListSummary, ListType},
    error::HostStateError,
};

pub const DEFAULT_LISTS_SENSOR: &str = "sensor.cozi_lists";
pub const DEFAULT_SERVICE_DOMAIN: &str = "cozi";

/// Target status sent when an item is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkStatus {
    Complete,
    Incomplete,
}

impl MarkStatus {
    /// The status that toggles an item currently in `checked` state.
    pub fn toggled_from(checked: bool) -> Self {
        if checked {
            MarkStatus::Incomplete
        } else {
            MarkStatus::Complete
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkStatus::Complete => "complete",
            MarkStatus::Incomplete => "incomplete",
        }
    }
}

/// One entity as published by the host, e.g. the body of `GET /api/states/<id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Decodes the `lists` attribute. A missing attribute yields an empty set.
    pub fn lists(&self) -> Result<Vec<ListSummary>, HostStateError> {
        let Some(raw) = self.attributes.get("lists") else {
            return Ok(Vec::new());
        };
        if raw.is_null() {
            return Ok(Vec::new());
        }
        Vec::<ListSummary>::deserialize(raw).map_err(|source| HostStateError::MalformedLists {
            entity_id: self.entity_id.clone(),
            source,
        })
    }
}

/// The host's shared attribute bag, keyed by entity id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostState {
    entities: HashMap<String, EntityState>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntityState) -> Self {
        self.insert(entity);
        self
    }

    pub fn insert(&mut self, entity: EntityState) {
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    pub fn entity(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    /// Builds a host state holding a single lists sensor.
    pub fn from_lists(sensor: &str, lists: &[ListSummary]) -> Self {
        let mut attributes = Map::new();
        attributes.insert(
            "lists".to_string(),
            serde_json::to_value(lists).unwrap_or(Value::Array(Vec::new())),
        );
        Self::new().with_entity(EntityState {
            entity_id: sensor.to_string(),
            state: lists.len().to_string(),
            attributes,
        })
    }
}

/// Service calls understood by the list integration, one per remote mutation.
///
/// Serializes to the bare service payload; the service name comes from
/// [`ServiceCall::service`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceCall {
    AddItem {
        list_id: ListId,
        item_text: String,
        item_pos: i64,
    },
    EditItem {
        list_id: ListId,
        item_id: ItemId,
        item_text: String,
    },
    MarkItem {
        list_id: ListId,
        item_id: ItemId,
        status: MarkStatus,
    },
    RemoveItems {
        list_id: ListId,
        item_ids: Vec<ItemId>,
    },
    ReorderItems {
        list_id: ListId,
        list_title: String,
        items_list: Vec<String>,
        list_type: ListType,
    },
    AddList {
        list_title: String,
        list_type: ListType,
    },
    Refresh {},
}

impl ServiceCall {
    pub fn service(&self) -> &'static str {
        match self {
            ServiceCall::AddItem { .. } => "add_item",
            ServiceCall::EditItem { .. } => "edit_item",
            ServiceCall::MarkItem { .. } => "mark_item",
            ServiceCall::RemoveItems { .. } => "remove_items",
            ServiceCall::ReorderItems { .. } => "reorder_items",
            ServiceCall::AddList { .. } => "add_list",
            ServiceCall::Refresh {} => "refresh",
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
