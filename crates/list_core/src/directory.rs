//! Mirror of the lists published by the host and the current selection.

use shared::{
    domain::{Item, ListId, ListSummary},
    protocol::{HostState, DEFAULT_LISTS_SENSOR},
};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ListDirectory {
    sensor_entity: String,
    lists: Vec<ListSummary>,
    current: Option<ListId>,
    selection_changes: u64,
}

impl Default for ListDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_LISTS_SENSOR)
    }
}

impl ListDirectory {
    pub fn new(sensor_entity: impl Into<String>) -> Self {
        Self {
            sensor_entity: sensor_entity.into(),
            lists: Vec::new(),
            current: None,
            selection_changes: 0,
        }
    }

    /// Reloads the list set from the host's attribute bag.
    ///
    /// A missing bag, a missing sensor or an undecodable `lists` attribute
    /// keeps the previous lists.
    pub fn load_lists(&mut self, source: Option<&HostState>) -> &[ListSummary] {
        let Some(entity) = source.and_then(|state| state.entity(&self.sensor_entity)) else {
            debug!(sensor = %self.sensor_entity, "lists sensor not available yet");
            return &self.lists;
        };

        match entity.lists() {
            Ok(lists) => {
                self.lists = lists;
                self.reconcile_selection();
            }
            Err(err) => {
                warn!(sensor = %self.sensor_entity, "ignoring lists update: {err}");
            }
        }
        &self.lists
    }

    /// Selects the list at `index`. Out of range leaves the selection alone.
    /// Returns whether the current list changed.
    pub fn select_list(&mut self, index: usize) -> bool {
        let Some(list) = self.lists.get(index) else {
            debug!(index, lists = self.lists.len(), "list index out of range");
            return false;
        };
        if self.current.as_ref() == Some(&list.list_id) {
            return false;
        }
        self.current = Some(list.list_id.clone());
        self.selection_changes += 1;
        true
    }

    /// Mirrors freshly fetched items into the cached list.
    pub fn update_items(&mut self, list_id: &ListId, items: Vec<Item>) {
        if let Some(list) = self.lists.iter_mut().find(|list| &list.list_id == list_id) {
            list.items = items;
        }
    }

    pub fn lists(&self) -> &[ListSummary] {
        &self.lists
    }

    pub fn current_id(&self) -> Option<&ListId> {
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&ListSummary> {
        let current = self.current.as_ref()?;
        self.lists.iter().find(|list| &list.list_id == current)
    }

    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.lists.iter().position(|list| &list.list_id == current)
    }

    /// How many times the current list changed since construction.
    pub fn selection_changes(&self) -> u64 {
        self.selection_changes
    }

    pub fn sensor_entity(&self) -> &str {
        &self.sensor_entity
    }

    fn reconcile_selection(&mut self) {
        if let Some(current) = &self.current {
            if self.lists.iter().any(|list| &list.list_id == current) {
                return;
            }
            debug!(list_id = %current, "selected list disappeared from the host");
            self.current = None;
            self.selection_changes += 1;
        }

        if let Some(first) = self.lists.first() {
            self.current = Some(first.list_id.clone());
            self.selection_changes += 1;
        }
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
