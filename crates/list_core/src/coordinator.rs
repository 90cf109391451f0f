//! Turns card intents into gateway calls and keeps the snapshot reconciled.
//!
//! Every write follows the same shape: validate locally, call the gateway,
//! refresh the snapshot. A rejected call is logged and followed by the same
//! refresh; nothing is retried. Locks are never held across a gateway call,
//! so several operations may be in flight at once and the last refresh to
//! land wins.
//!
//! Writes that carry snapshot data (item ids, header positions, a reordered
//! list) only go out while the snapshot describes the selected list. Between
//! a list switch and the first fetch of the new list they are declined.

use std::sync::Arc;

use shared::{
    domain::{Item, ItemId, ListSummary, ListType},
    protocol::{HostState, MarkStatus},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    directory::ListDirectory,
    intent::Intent,
    reorder::ReorderSession,
    snapshot::{Snapshot, SnapshotStore},
    view::{CardView, EditDraft, ListChoice, ViewStatus},
    DetachedDragHandles, DragHandleFactory, ListGateway, NoopRenderSink, RenderSink, Settings,
};

/// Result of handling one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Validation failed; nothing was sent.
    Declined,
    /// Local state changed without a remote write.
    Applied,
    /// The gateway accepted the write and the snapshot was refreshed.
    Committed,
    /// The gateway rejected the write; the snapshot was refreshed instead.
    Reconciled,
}

/// Maps a requested insert position to the one sent to the gateway.
///
/// Zero appends at the service's default position. Anything greater is
/// shifted by one, which lands the new item below the header row it was
/// requested from. Whether that shift should depend on the list layout is
/// still an open product question.
pub fn gateway_position(position: i64) -> i64 {
    if position > 0 {
        position + 1
    } else {
        position
    }
}

pub struct MutationCoordinator {
    gateway: Arc<dyn ListGateway>,
    render: Arc<dyn RenderSink>,
    drag_handles: Arc<dyn DragHandleFactory>,
    title_override: Option<String>,
    directory: RwLock<ListDirectory>,
    snapshots: SnapshotStore,
    reorder: Mutex<ReorderSession>,
    editing: Mutex<Option<EditDraft>>,
}

impl MutationCoordinator {
    pub fn new(gateway: Arc<dyn ListGateway>) -> Self {
        Self {
            gateway,
            render: Arc::new(NoopRenderSink),
            drag_handles: Arc::new(DetachedDragHandles),
            title_override: None,
            directory: RwLock::new(ListDirectory::default()),
            snapshots: SnapshotStore::new(),
            reorder: Mutex::new(ReorderSession::new()),
            editing: Mutex::new(None),
        }
    }

    pub fn from_settings(gateway: Arc<dyn ListGateway>, settings: &Settings) -> Self {
        let mut coordinator = Self::new(gateway).with_sensor_entity(&settings.sensor_entity);
        coordinator.title_override = settings.name.clone();
        coordinator
    }

    pub fn with_render_sink(mut self, render: Arc<dyn RenderSink>) -> Self {
        self.render = render;
        self
    }

    pub fn with_drag_handles(mut self, drag_handles: Arc<dyn DragHandleFactory>) -> Self {
        self.drag_handles = drag_handles;
        self
    }

    pub fn with_sensor_entity(mut self, sensor_entity: &str) -> Self {
        self.directory = RwLock::new(ListDirectory::new(sensor_entity));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title_override = Some(title.into());
        self
    }

    /// Explicit intent table used by the render layer.
    pub async fn dispatch(&self, intent: Intent) -> Outcome {
        debug!(intent = intent.name(), "dispatching card intent");
        match intent {
            Intent::AddItem { text, position } => self.add_item(&text, position).await,
            Intent::AddBelowHeader { header_id, text } => {
                self.add_below_header(&header_id, &text).await
            }
            Intent::BeginEdit { item_id, text } => self.begin_edit(item_id, text).await,
            Intent::UpdateEdit { text } => self.update_edit(text).await,
            Intent::CommitEdit => self.commit_edit().await,
            Intent::CancelEdit => self.cancel_edit().await,
            Intent::EditItem { item_id, text } => self.edit_item(&item_id, &text).await,
            Intent::MarkItem { item_id, status } => self.mark_item(&item_id, status).await,
            Intent::ClearCompleted => self.clear_completed().await,
            Intent::ToggleReorder => self.toggle_reorder().await,
            Intent::CompleteDrag {
                old_index,
                new_index,
            } => self.complete_drag(old_index, new_index).await,
            Intent::SelectList { index } => self.select_list(index).await,
            Intent::CreateList { title, list_type } => self.create_list(&title, list_type).await,
            Intent::RefreshAll => self.refresh_all().await,
        }
    }

    /// Host property-change notification carrying a new attribute bag.
    pub async fn on_host_state(&self, host: Option<&HostState>) {
        let has_current = {
            let mut directory = self.directory.write().await;
            directory.load_lists(host);
            directory.current_id().is_some()
        };
        if has_current {
            self.refresh().await;
        } else {
            self.render.request_render();
        }
    }

    /// Pulls the host state from the gateway and reloads the directory.
    pub async fn reload_directory(&self) {
        match self.gateway.host_state().await {
            Ok(host) => self.on_host_state(host.as_ref()).await,
            Err(err) => {
                warn!("failed to load host state: {err:#}");
                self.refresh().await;
            }
        }
    }

    /// Re-derives the snapshot of the current list from a gateway fetch.
    ///
    /// A snapshot of another list is swapped for an empty pending one before
    /// the fetch. A failed fetch keeps the previous snapshot of the same list.
    /// A fetch for a list that is no longer selected when it lands is dropped.
    pub async fn refresh(&self) {
        let Some(list) = self.current_list().await else {
            self.snapshots.clear().await;
            self.render.request_render();
            return;
        };
        if self.snapshots.retarget(&list.list_id).await {
            debug!(list_id = %list.list_id, "snapshot switched to the selected list");
        }

        let fetch_began_at = self.snapshots.revision().await;
        let items: Vec<Item> = match self.gateway.fetch(&list).await {
            Ok(items) => items.into_values().collect(),
            Err(err) => {
                warn!(list_id = %list.list_id, "failed to fetch list items: {err:#}");
                self.render.request_render();
                return;
            }
        };

        {
            let mut directory = self.directory.write().await;
            if directory.current_id() != Some(&list.list_id) {
                debug!(list_id = %list.list_id, "dropping fetch for a deselected list");
                return;
            }
            directory.update_items(&list.list_id, items.clone());
        }

        self.snapshots
            .replace_confirmed(list.list_id.clone(), &items, fetch_began_at)
            .await;
        self.render.request_render();
    }

    pub async fn select_list(&self, index: usize) -> Outcome {
        let changed = self.directory.write().await.select_list(index);
        if !changed {
            return Outcome::Declined;
        }
        self.cancel_edit().await;
        self.refresh().await;
        Outcome::Applied
    }

    pub async fn add_item(&self, text: &str, position: i64) -> Outcome {
        if text.trim().is_empty() {
            debug!("declining add of empty item");
            return Outcome::Declined;
        }
        let Some(list) = self.current_list().await else {
            debug!("declining add without a selected list");
            return Outcome::Declined;
        };

        let position = gateway_position(position);
        let result = self.gateway.add(&list.list_id, text, position).await;
        self.settle("add_item", &list, result).await
    }

    /// Adds an item using the position hint of the header row it was typed into.
    pub async fn add_below_header(&self, header_id: &ItemId, text: &str) -> Outcome {
        let position = self.selected_snapshot().await.and_then(|(_, snapshot)| {
            snapshot
                .find(header_id)
                .filter(|item| item.is_header())
                .map(|header| header.item_pos)
        });
        match position {
            Some(position) => self.add_item(text, position).await,
            None => {
                debug!(item_id = %header_id, "declining add below unknown header");
                Outcome::Declined
            }
        }
    }

    pub async fn begin_edit(&self, item_id: ItemId, text: String) -> Outcome {
        *self.editing.lock().await = Some(EditDraft { item_id, text });
        self.render.request_render();
        Outcome::Applied
    }

    pub async fn update_edit(&self, text: String) -> Outcome {
        let mut editing = self.editing.lock().await;
        match editing.as_mut() {
            Some(draft) => {
                draft.text = text;
                Outcome::Applied
            }
            None => Outcome::Declined,
        }
    }

    pub async fn cancel_edit(&self) -> Outcome {
        match self.editing.lock().await.take() {
            Some(_) => {
                self.render.request_render();
                Outcome::Applied
            }
            None => Outcome::Declined,
        }
    }

    /// Saves the draft started by [`Self::begin_edit`].
    pub async fn commit_edit(&self) -> Outcome {
        let draft = self.editing.lock().await.clone();
        match draft {
            Some(draft) => self.edit_item(&draft.item_id, &draft.text).await,
            None => Outcome::Declined,
        }
    }

    pub async fn edit_item(&self, item_id: &ItemId, new_text: &str) -> Outcome {
        if new_text.trim().is_empty() {
            debug!(item_id = %item_id, "declining edit to empty text");
            return Outcome::Declined;
        }
        let Some(list) = self.selected_item_list(item_id).await else {
            return Outcome::Declined;
        };

        let result = self.gateway.edit(&list.list_id, item_id, new_text).await;
        *self.editing.lock().await = None;
        self.settle("edit_item", &list, result).await
    }

    /// Toggles an item. `current_status` is the state the user saw.
    pub async fn mark_item(&self, item_id: &ItemId, current_status: bool) -> Outcome {
        let Some((list, snapshot)) = self.selected_snapshot().await else {
            return Outcome::Declined;
        };
        match snapshot.find(item_id) {
            Some(item) if item.is_header() => {
                debug!(item_id = %item_id, "headers cannot be marked");
                return Outcome::Declined;
            }
            Some(_) => {}
            None => {
                debug!(
                    item_id = %item_id,
                    list_id = %list.list_id,
                    "declining mark of unknown item"
                );
                return Outcome::Declined;
            }
        }

        let status = MarkStatus::toggled_from(current_status);
        let result = self.gateway.mark(&list.list_id, item_id, status).await;
        self.settle("mark_item", &list, result).await
    }

    pub async fn clear_completed(&self) -> Outcome {
        let Some((list, snapshot)) = self.selected_snapshot().await else {
            return Outcome::Declined;
        };
        let item_ids = snapshot.completed_ids();
        if item_ids.is_empty() {
            return Outcome::Declined;
        }

        let result = self.gateway.clear(&list.list_id, &item_ids).await;
        self.settle("clear_completed", &list, result).await
    }

    /// Creates a list, then reloads the directory since the list set changed.
    pub async fn create_list(&self, title: &str, list_type: ListType) -> Outcome {
        if title.trim().is_empty() {
            return Outcome::Declined;
        }

        let outcome = match self.gateway.create_list(title, list_type).await {
            Ok(()) => {
                info!(title, list_type = list_type.as_str(), "created list");
                Outcome::Committed
            }
            Err(err) => {
                warn!(title, "create_list rejected, reloading lists: {err:#}");
                Outcome::Reconciled
            }
        };
        self.reload_directory().await;
        outcome
    }

    /// Manual resync: global refresh on the service, then a snapshot refresh.
    pub async fn refresh_all(&self) -> Outcome {
        let outcome = match self.gateway.refresh_all().await {
            Ok(()) => Outcome::Committed,
            Err(err) => {
                warn!("refresh_all rejected: {err:#}");
                Outcome::Reconciled
            }
        };
        self.refresh().await;
        outcome
    }

    pub async fn toggle_reorder(&self) -> Outcome {
        let selected = self.selected_snapshot().await;
        let items = selected
            .as_ref()
            .map(|(_, snapshot)| snapshot.active.as_slice())
            .unwrap_or_default();
        let active = self
            .reorder
            .lock()
            .await
            .toggle(self.drag_handles.as_ref(), items);
        debug!(active, "reorder mode toggled");
        self.render.request_render();
        Outcome::Applied
    }

    /// Finishes a drag inside the active items.
    ///
    /// The moved order is shown immediately as a tentative snapshot, then the
    /// whole list is submitted. Whatever the gateway answers, the reorder
    /// container is reset and repopulated and the snapshot is refreshed, which
    /// replaces the tentative order with the service's.
    pub async fn complete_drag(&self, old_index: Option<usize>, new_index: Option<usize>) -> Outcome {
        let Some((list, snapshot)) = self.selected_snapshot().await else {
            return Outcome::Declined;
        };
        let Some(permuted) =
            self.reorder
                .lock()
                .await
                .stage_drag(&snapshot.active, old_index, new_index)
        else {
            return Outcome::Declined;
        };

        self.snapshots
            .install_tentative(list.list_id.clone(), permuted.clone())
            .await;
        self.render.request_render();

        let result = match serialize_items(permuted.iter().chain(snapshot.completed.iter())) {
            Ok(items) => {
                self.gateway
                    .reorder(&list.list_id, &list.title, &items, list.list_type)
                    .await
            }
            Err(err) => Err(err),
        };

        self.reorder.lock().await.take_pending();
        self.render.reset_reorder_container();
        self.render.repopulate_reorder_container();
        self.settle("reorder", &list, result).await
    }

    /// Current card state for the render layer.
    pub async fn view(&self) -> CardView {
        let directory = self.directory.read().await;
        let Some(list) = directory.current() else {
            return CardView::loading();
        };

        let snapshot = self.snapshot().await;
        let lists = directory
            .lists()
            .iter()
            .enumerate()
            .map(|(index, candidate)| ListChoice {
                index,
                title: candidate.title.clone(),
                selected: candidate.list_id == list.list_id,
            })
            .collect();

        let (status, active, completed) = if snapshot.describes(&list.list_id) {
            (
                ViewStatus::Ready,
                snapshot.active.clone(),
                snapshot.completed.clone(),
            )
        } else {
            (ViewStatus::Loading, Vec::new(), Vec::new())
        };

        CardView {
            status,
            title: self
                .title_override
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| list.title.clone()),
            list_type: Some(list.list_type),
            lists,
            active,
            completed,
            tentative: snapshot.is_tentative(),
            reordering: self.reorder.lock().await.is_active(),
            editing: self.editing.lock().await.clone(),
        }
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.current().await
    }

    pub async fn current_list(&self) -> Option<ListSummary> {
        self.directory.read().await.current().cloned()
    }

    pub async fn lists(&self) -> Vec<ListSummary> {
        self.directory.read().await.lists().to_vec()
    }

    pub async fn is_reordering(&self) -> bool {
        self.reorder.lock().await.is_active()
    }

    /// The selected list with its snapshot, or `None` while the snapshot does
    /// not describe that list yet.
    async fn selected_snapshot(&self) -> Option<(ListSummary, Arc<Snapshot>)> {
        let list = self.current_list().await?;
        let snapshot = self.snapshots.current().await;
        if !snapshot.describes(&list.list_id) {
            debug!(list_id = %list.list_id, "snapshot of the selected list is not loaded");
            return None;
        }
        Some((list, snapshot))
    }

    async fn selected_item_list(&self, item_id: &ItemId) -> Option<ListSummary> {
        let (list, snapshot) = self.selected_snapshot().await?;
        if snapshot.find(item_id).is_none() {
            debug!(
                item_id = %item_id,
                list_id = %list.list_id,
                "item is not in the selected list"
            );
            return None;
        }
        Some(list)
    }

    async fn settle(
        &self,
        operation: &'static str,
        list: &ListSummary,
        result: anyhow::Result<()>,
    ) -> Outcome {
        let outcome = match result {
            Ok(()) => {
                debug!(operation, list_id = %list.list_id, "list service accepted write");
                Outcome::Committed
            }
            Err(err) => {
                warn!(
                    operation,
                    list_id = %list.list_id,
                    "list service rejected write, resyncing: {err:#}"
                );
                Outcome::Reconciled
            }
        };
        self.refresh().await;
        outcome
    }
}

fn serialize_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> anyhow::Result<Vec<String>> {
    items
        .into_iter()
        .map(|item| serde_json::to_string(item).map_err(anyhow::Error::from))
        .collect()
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
