use crate::{Draft, Record, RecordId, Status};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub signed_in: bool,
    pub loading: bool,
    pub refreshing: bool,
    /// Visible subset, newest first.
    pub records: Vec<RecordView>,
    /// Size of the unfiltered collection.
    pub total_count: usize,
    pub filter: FilterView,
    pub session: SessionView,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub record: Record,
    /// The record is open in the edit form.
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterView {
    pub all: bool,
    pub options: Vec<StatusOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOption {
    pub status: Status,
    pub selected: bool,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionView {
    #[default]
    Closed,
    Open { mode: SessionMode, draft: Draft },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Create,
    Edit(RecordId),
}
