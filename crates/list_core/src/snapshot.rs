//! Active/completed view of the selected list.

use std::sync::Arc;

use indexmap::IndexMap;
use shared::domain::{Item, ItemId, ListId};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provenance {
    /// Derived from a gateway fetch.
    #[default]
    Confirmed,
    /// Written locally ahead of a pending remote call.
    Tentative,
    /// The list was selected but no fetch for it has landed yet.
    Pending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub list_id: Option<ListId>,
    pub active: Vec<Item>,
    pub completed: Vec<Item>,
    pub provenance: Provenance,
    pub revision: u64,
}

impl Snapshot {
    /// Stable partition of `items` by status. Relative order is kept in both halves.
    pub fn derive<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        let (completed, active): (Vec<Item>, Vec<Item>) =
            items.into_iter().cloned().partition(|item| item.status);
        Self {
            list_id: None,
            active,
            completed,
            provenance: Provenance::Confirmed,
            revision: 0,
        }
    }

    pub fn completed_ids(&self) -> Vec<ItemId> {
        self.completed
            .iter()
            .map(|item| item.item_id.clone())
            .collect()
    }

    pub fn find(&self, item_id: &ItemId) -> Option<&Item> {
        self.active
            .iter()
            .chain(self.completed.iter())
            .find(|item| &item.item_id == item_id)
    }

    pub fn is_tentative(&self) -> bool {
        self.provenance == Provenance::Tentative
    }

    pub fn is_pending(&self) -> bool {
        self.provenance == Provenance::Pending
    }

    /// Whether this snapshot holds fetched or locally written items of `list_id`.
    pub fn describes(&self, list_id: &ListId) -> bool {
        !self.is_pending() && self.list_id.as_ref() == Some(list_id)
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keys a list's items by id, keeping list order. A repeated id keeps its
/// first position and the last record.
pub fn fetch_items(items: impl IntoIterator<Item = Item>) -> IndexMap<ItemId, Item> {
    let mut indexed = IndexMap::new();
    for item in items {
        indexed.insert(item.item_id.clone(), item);
    }
    indexed
}

/// Holds the current snapshot. Snapshots are replaced wholesale, never patched.
#[derive(Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    pub async fn revision(&self) -> u64 {
        self.current.read().await.revision
    }

    /// Installs a fetch-derived snapshot.
    ///
    /// `fetch_began_at` is the revision observed before the fetch was issued. A
    /// tentative snapshot written after that point is kept; its own refresh
    /// reconciles it. Returns whether the snapshot was replaced.
    pub async fn replace_confirmed(
        &self,
        list_id: ListId,
        items: &[Item],
        fetch_began_at: u64,
    ) -> bool {
        let mut current = self.current.write().await;
        if current.is_tentative()
            && current.revision > fetch_began_at
            && current.list_id.as_ref() == Some(&list_id)
        {
            debug!(
                list_id = %list_id,
                revision = current.revision,
                "keeping newer tentative snapshot over stale fetch"
            );
            return false;
        }

        let mut next = Snapshot::derive(items);
        next.list_id = Some(list_id);
        next.revision = current.revision + 1;
        *current = Arc::new(next);
        true
    }

    /// Replaces the active order ahead of remote confirmation. Completed items
    /// are carried over unchanged.
    pub async fn install_tentative(&self, list_id: ListId, active: Vec<Item>) -> u64 {
        let mut current = self.current.write().await;
        let next = Snapshot {
            list_id: Some(list_id),
            active,
            completed: current.completed.clone(),
            provenance: Provenance::Tentative,
            revision: current.revision + 1,
        };
        let revision = next.revision;
        *current = Arc::new(next);
        revision
    }

    /// Points the store at `list_id`. A snapshot of any other list is replaced
    /// by an empty pending one, so its items are never read against the new
    /// list. Returns whether the store switched lists.
    pub async fn retarget(&self, list_id: &ListId) -> bool {
        let mut current = self.current.write().await;
        if current.list_id.as_ref() == Some(list_id) {
            return false;
        }
        let revision = current.revision + 1;
        *current = Arc::new(Snapshot {
            list_id: Some(list_id.clone()),
            provenance: Provenance::Pending,
            revision,
            ..Snapshot::default()
        });
        true
    }

    pub async fn clear(&self) {
        let mut current = self.current.write().await;
        let revision = current.revision + 1;
        *current = Arc::new(Snapshot {
            revision,
            ..Snapshot::default()
        });
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
