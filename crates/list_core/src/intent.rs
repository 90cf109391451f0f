//! Intents emitted by the render layer.

use shared::domain::{ItemId, ListType};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddItem {
        text: String,
        position: i64,
    },
    AddBelowHeader {
        header_id: ItemId,
        text: String,
    },
    BeginEdit {
        item_id: ItemId,
        text: String,
    },
    UpdateEdit {
        text: String,
    },
    CommitEdit,
    CancelEdit,
    EditItem {
        item_id: ItemId,
        text: String,
    },
    MarkItem {
        item_id: ItemId,
        status: bool,
    },
    ClearCompleted,
    ToggleReorder,
    CompleteDrag {
        old_index: Option<usize>,
        new_index: Option<usize>,
    },
    SelectList {
        index: usize,
    },
    CreateList {
        title: String,
        list_type: ListType,
    },
    RefreshAll,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::AddItem { .. } => "add_item",
            Intent::AddBelowHeader { .. } => "add_below_header",
            Intent::BeginEdit { .. } => "begin_edit",
            Intent::UpdateEdit { .. } => "update_edit",
            Intent::CommitEdit => "commit_edit",
            Intent::CancelEdit => "cancel_edit",
            Intent::EditItem { .. } => "edit_item",
            Intent::MarkItem { .. } => "mark_item",
            Intent::ClearCompleted => "clear_completed",
            Intent::ToggleReorder => "toggle_reorder",
            Intent::CompleteDrag { .. } => "complete_drag",
            Intent::SelectList { .. } => "select_list",
            Intent::CreateList { .. } => "create_list",
            Intent::RefreshAll => "refresh_all",
        }
    }
}
