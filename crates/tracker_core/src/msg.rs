use crate::{EditField, Generation, Origin, Record, RecordFields, RecordId, Status, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Auth capability reports a signed-in user.
    SignedIn(UserId),
    /// Auth capability reports sign-out.
    SignedOut,
    /// User asked for a manual refresh.
    RefreshRequested,
    /// Change notifier signalled that the remote collection changed.
    RemoteChanged,
    /// Change subscription could not be established or dropped.
    SubscriptionFailed(String),
    /// Store answered a fetch.
    RecordsFetched {
        generation: Generation,
        result: Result<Vec<Record>, String>,
    },
    /// Create a record without going through an edit session.
    CreateRequested(RecordFields),
    /// User picked a new status on a record card.
    StatusChangeRequested { id: RecordId, status: Status },
    /// User confirmed deletion of a record.
    DeleteRequested { id: RecordId },
    CreateCompleted {
        origin: Origin,
        result: Result<RecordId, String>,
    },
    UpdateCompleted {
        id: RecordId,
        origin: Origin,
        result: Result<(), String>,
    },
    DeleteCompleted {
        id: RecordId,
        origin: Origin,
        result: Result<(), String>,
    },
    /// User clicked the "All" filter.
    FilterAllSelected,
    /// User clicked a status filter.
    FilterToggled(Status),
    /// User clicked "Add New Job".
    ComposeStarted,
    /// User clicked a record card.
    EditStarted(RecordId),
    /// User typed into the edit form.
    FieldEdited { field: EditField, value: String },
    /// User submitted the edit form.
    SubmitClicked,
    /// User clicked Cancel on the edit form.
    EditCancelled,
    /// External dismissal signal (escape).
    EditDismissed,
    /// User dismissed the error banner.
    ErrorDismissed,
}
