use serde::Serialize;
use shared::domain::{Item, ItemId, ListType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    /// No lists published yet, none selected, or the selected list has not
    /// been fetched.
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListChoice {
    pub index: usize,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditDraft {
    pub item_id: ItemId,
    pub text: String,
}

/// Everything a render layer needs to draw the card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub status: ViewStatus,
    pub title: String,
    pub list_type: Option<ListType>,
    pub lists: Vec<ListChoice>,
    pub active: Vec<Item>,
    pub completed: Vec<Item>,
    pub tentative: bool,
    pub reordering: bool,
    pub editing: Option<EditDraft>,
}

impl CardView {
    pub fn loading() -> Self {
        Self {
            status: ViewStatus::Loading,
            title: String::new(),
            list_type: None,
            lists: Vec::new(),
            active: Vec::new(),
            completed: Vec::new(),
            tentative: false,
            reordering: false,
            editing: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    pub fn has_completed(&self) -> bool {
        !self.completed.is_empty()
    }
}
