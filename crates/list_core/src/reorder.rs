//! Drag-and-drop reorder mode.

use shared::domain::Item;
use tracing::debug;

use crate::{DragHandle, DragHandleFactory};

enum ReorderState {
    Idle,
    Active {
        handle: Box<dyn DragHandle>,
        pending: Option<Vec<Item>>,
    },
}

/// Two-state machine: `Idle` or `Active` with a bound drag handle.
pub struct ReorderSession {
    state: ReorderState,
}

impl Default for ReorderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderSession {
    pub fn new() -> Self {
        Self {
            state: ReorderState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ReorderState::Active { .. })
    }

    /// Flips reorder mode. Turning it on binds a drag handle to `active_items`;
    /// turning it off releases the handle and drops any pending permutation.
    /// Returns whether the session is active afterwards.
    pub fn toggle(&mut self, handles: &dyn DragHandleFactory, active_items: &[Item]) -> bool {
        match std::mem::replace(&mut self.state, ReorderState::Idle) {
            ReorderState::Idle => {
                let handle = handles.acquire(active_items);
                self.state = ReorderState::Active {
                    handle,
                    pending: None,
                };
                true
            }
            ReorderState::Active { handle, .. } => {
                handle.release();
                false
            }
        }
    }

    /// Applies a finished drag to `active_items` and keeps the result as the
    /// pending permutation.
    ///
    /// Returns `None` when the drag changes nothing: the session is idle, an
    /// index is missing, the indices are equal or out of range.
    pub fn stage_drag(
        &mut self,
        active_items: &[Item],
        old_index: Option<usize>,
        new_index: Option<usize>,
    ) -> Option<Vec<Item>> {
        let ReorderState::Active { pending, .. } = &mut self.state else {
            debug!("drag completion ignored outside reorder mode");
            return None;
        };
        let (old_index, new_index) = (old_index?, new_index?);
        if old_index == new_index {
            return None;
        }

        let permuted = move_item(active_items, old_index, new_index)?;
        *pending = Some(permuted.clone());
        Some(permuted)
    }

    /// Hands the pending permutation back once the remote call settled.
    pub fn take_pending(&mut self) -> Option<Vec<Item>> {
        match &mut self.state {
            ReorderState::Active { pending, .. } => pending.take(),
            ReorderState::Idle => None,
        }
    }

    pub fn pending(&self) -> Option<&[Item]> {
        match &self.state {
            ReorderState::Active { pending, .. } => pending.as_deref(),
            ReorderState::Idle => None,
        }
    }
}

/// Removes the element at `from` and reinserts it at `to`.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() || to >= items.len() {
        return None;
    }
    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
