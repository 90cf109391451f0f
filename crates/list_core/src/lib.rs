//! List state reconciliation for the Cozi list card.
//!
//! The card mirrors lists published by the host, keeps an ordered snapshot of
//! the selected list and turns user intents into calls against a
//! [`ListGateway`], refreshing the snapshot after every write.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use shared::{
    domain::{Item, ItemId, ListId, ListSummary, ListType},
    protocol::{HostState, MarkStatus},
};

pub mod config;
pub mod coordinator;
pub mod directory;
pub mod hass;
pub mod intent;
pub mod reorder;
pub mod snapshot;
pub mod view;

pub use config::{load_settings, Settings};
pub use coordinator::{MutationCoordinator, Outcome};
pub use directory::ListDirectory;
pub use hass::HassGateway;
pub use intent::Intent;
pub use reorder::ReorderSession;
pub use snapshot::{Provenance, Snapshot, SnapshotStore};
pub use view::{CardView, ViewStatus};

/// Remote list service. Every mutation resolves once the service accepted it;
/// the resulting list contents are only observable through a later `fetch`.
#[async_trait]
pub trait ListGateway: Send + Sync {
    /// Pulls the host's attribute bag holding the lists sensor.
    async fn host_state(&self) -> Result<Option<HostState>>;
    async fn fetch(&self, list: &ListSummary) -> Result<IndexMap<ItemId, Item>>;
    async fn add(&self, list_id: &ListId, text: &str, position: i64) -> Result<()>;
    async fn edit(&self, list_id: &ListId, item_id: &ItemId, text: &str) -> Result<()>;
    async fn mark(&self, list_id: &ListId, item_id: &ItemId, status: MarkStatus) -> Result<()>;
    async fn clear(&self, list_id: &ListId, item_ids: &[ItemId]) -> Result<()>;
    async fn reorder(
        &self,
        list_id: &ListId,
        list_title: &str,
        serialized_items: &[String],
        list_type: ListType,
    ) -> Result<()>;
    async fn create_list(&self, title: &str, list_type: ListType) -> Result<()>;
    async fn refresh_all(&self) -> Result<()>;
}

pub struct MissingListGateway;

#[async_trait]
impl ListGateway for MissingListGateway {
    async fn host_state(&self) -> Result<Option<HostState>> {
        Ok(None)
    }

    async fn fetch(&self, list: &ListSummary) -> Result<IndexMap<ItemId, Item>> {
        Err(anyhow!("list service unavailable for list {}", list.list_id))
    }

    async fn add(&self, list_id: &ListId, _text: &str, _position: i64) -> Result<()> {
        Err(anyhow!("list service unavailable for list {list_id}"))
    }

    async fn edit(&self, list_id: &ListId, _item_id: &ItemId, _text: &str) -> Result<()> {
        Err(anyhow!("list service unavailable for list {list_id}"))
    }

    async fn mark(&self, list_id: &ListId, _item_id: &ItemId, _status: MarkStatus) -> Result<()> {
        Err(anyhow!("list service unavailable for list {list_id}"))
    }

    async fn clear(&self, list_id: &ListId, _item_ids: &[ItemId]) -> Result<()> {
        Err(anyhow!("list service unavailable for list {list_id}"))
    }

    async fn reorder(
        &self,
        list_id: &ListId,
        _list_title: &str,
        _serialized_items: &[String],
        _list_type: ListType,
    ) -> Result<()> {
        Err(anyhow!("list service unavailable for list {list_id}"))
    }

    async fn create_list(&self, _title: &str, _list_type: ListType) -> Result<()> {
        Err(anyhow!("list service unavailable"))
    }

    async fn refresh_all(&self) -> Result<()> {
        Err(anyhow!("list service unavailable"))
    }
}

/// Render layer hooks. Rendering itself reads state through
/// [`MutationCoordinator::view`].
pub trait RenderSink: Send + Sync {
    fn request_render(&self);
    /// Drops every child of the reorder container.
    fn reset_reorder_container(&self);
    /// Lets the reorder container rebuild its children from the snapshot.
    fn repopulate_reorder_container(&self);
}

pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn request_render(&self) {}
    fn reset_reorder_container(&self) {}
    fn repopulate_reorder_container(&self) {}
}

/// A drag library instance bound to the active items while reorder mode is on.
pub trait DragHandle: Send + Sync {
    fn release(&self);
}

pub trait DragHandleFactory: Send + Sync {
    fn acquire(&self, items: &[Item]) -> Box<dyn DragHandle>;
}

pub struct DetachedDragHandles;

struct DetachedDragHandle;

impl DragHandle for DetachedDragHandle {
    fn release(&self) {}
}

impl DragHandleFactory for DetachedDragHandles {
    fn acquire(&self, _items: &[Item]) -> Box<dyn DragHandle> {
        Box::new(DetachedDragHandle)
    }
}
