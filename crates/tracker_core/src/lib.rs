//! Tracker core: pure state machine for the job-application board.
//!
//! Owns the canonical record collection, the status filter and the edit
//! session. Remote work is described as [`Effect`]s and its results come back
//! as [`Msg`]s; nothing in this crate performs IO.
mod edit_session;
mod effect;
mod error;
mod filter;
mod msg;
mod reconcile;
mod record;
mod state;
mod update;
mod view_model;

pub use edit_session::{Draft, EditField, EditSession, SessionState, SessionToken, Submission};
pub use effect::{Effect, Origin, UserEpoch};
pub use error::{Operation, SessionError, TrackerError, ValidationError};
pub use filter::FilterSelection;
pub use msg::Msg;
pub use reconcile::{Generation, Reconciler, RefreshOutcome};
pub use record::{Record, RecordFields, RecordId, RecordPatch, Status, UserId};
pub use state::AppState;
pub use update::update;
pub use view_model::{
    AppViewModel, FilterView, RecordView, SessionMode, SessionView, StatusOption,
};
