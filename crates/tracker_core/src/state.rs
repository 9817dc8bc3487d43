use crate::view_model::{
    AppViewModel, FilterView, RecordView, SessionMode, SessionView, StatusOption,
};
use crate::{
    EditField, EditSession, Effect, FilterSelection, Generation, Operation, Origin, Record,
    RecordFields, RecordId, RecordPatch, Reconciler, RefreshOutcome, SessionError, Status,
    Submission, TrackerError, UserEpoch, UserId,
};

/// Whole client state: canonical collection, filter, edit session and the
/// signed-in identity. Mutated only through [`crate::update`] or the methods
/// below, each of which returns the effects the engine must run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    user: Option<UserId>,
    epoch: UserEpoch,
    records: Reconciler,
    filter: FilterSelection,
    session: EditSession,
    last_error: Option<TrackerError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Epoch stamped on mutations issued for the current user.
    pub fn epoch(&self) -> UserEpoch {
        self.epoch
    }

    pub fn records(&self) -> &Reconciler {
        &self.records
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn last_error(&self) -> Option<&TrackerError> {
        self.last_error.as_ref()
    }

    /// True while the first refresh for the current user is outstanding.
    pub fn is_loading(&self) -> bool {
        self.user.is_some() && !self.records.is_loaded()
    }

    /// Canonical collection filtered by the current selection.
    pub fn visible(&self) -> Vec<&Record> {
        self.filter.visible(self.records.records())
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn view(&self) -> AppViewModel {
        let editing = self.session.editing_id();
        let records = self
            .visible()
            .into_iter()
            .map(|record| RecordView {
                editing: editing == Some(&record.id),
                record: record.clone(),
            })
            .collect();

        let counts = FilterSelection::counts(self.records.records());
        let filter = FilterView {
            all: self.filter.is_all(),
            options: counts
                .into_iter()
                .map(|(status, count)| StatusOption {
                    status,
                    selected: self.filter.is_selected(status),
                    count,
                })
                .collect(),
        };

        let session = match (self.session.draft(), editing) {
            (None, _) => SessionView::Closed,
            (Some(draft), None) => SessionView::Open {
                mode: SessionMode::Create,
                draft: draft.clone(),
            },
            (Some(draft), Some(id)) => SessionView::Open {
                mode: SessionMode::Edit(id.clone()),
                draft: draft.clone(),
            },
        };

        AppViewModel {
            signed_in: self.user.is_some(),
            loading: self.is_loading(),
            refreshing: self.records.is_refreshing(),
            records,
            total_count: self.records.records().len(),
            filter,
            session,
            last_error: self.last_error.as_ref().map(ToString::to_string),
            dirty: self.dirty,
        }
    }

    // -- identity ---------------------------------------------------------

    pub fn sign_in(&mut self, user: UserId) -> Vec<Effect> {
        if self.user.as_ref() == Some(&user) {
            return Vec::new();
        }
        self.clear_user_state();
        self.user = Some(user.clone());
        let mut effects = vec![Effect::Subscribe { user }];
        effects.extend(self.refresh());
        effects
    }

    pub fn sign_out(&mut self) -> Vec<Effect> {
        if self.user.take().is_none() {
            return Vec::new();
        }
        self.clear_user_state();
        vec![Effect::Unsubscribe]
    }

    fn clear_user_state(&mut self) {
        self.epoch = self.epoch.next();
        self.records.reset();
        self.filter.set_all();
        self.session.cancel();
        self.last_error = None;
        self.mark_dirty();
    }

    // -- reconciliation ---------------------------------------------------

    /// Requests a full refresh. Coalesces with a refresh already in flight.
    pub fn refresh(&mut self) -> Option<Effect> {
        let user = self.user.clone()?;
        let generation = self.records.request_refresh()?;
        self.mark_dirty();
        Some(Effect::FetchRecords { user, generation })
    }

    pub fn on_remote_change(&mut self) -> Option<Effect> {
        self.refresh()
    }

    pub fn apply_fetch(
        &mut self,
        generation: Generation,
        result: Result<Vec<Record>, String>,
    ) -> (RefreshOutcome, Option<Effect>) {
        let outcome = self.records.apply_refresh(generation, result);
        let effect = match &outcome {
            RefreshOutcome::Applied { .. } => {
                if matches!(
                    self.last_error,
                    Some(TrackerError::Remote {
                        operation: Operation::Fetch,
                        ..
                    })
                ) {
                    self.last_error = None;
                }
                self.mark_dirty();
                None
            }
            RefreshOutcome::Failed { message } => {
                self.last_error = Some(TrackerError::remote(Operation::Fetch, message.clone()));
                self.mark_dirty();
                None
            }
            RefreshOutcome::Superseded { follow_up } => {
                self.user.clone().map(|user| Effect::FetchRecords {
                    user,
                    generation: *follow_up,
                })
            }
            RefreshOutcome::Stale => None,
        };
        (outcome, effect)
    }

    pub fn create(&mut self, fields: RecordFields) -> Option<Effect> {
        let Some(user) = self.user.clone() else {
            self.fail(TrackerError::NotSignedIn);
            return None;
        };
        match fields.into_valid() {
            Ok(fields) => Some(Effect::CreateRecord {
                user,
                fields,
                origin: Origin::Direct(self.epoch),
            }),
            Err(err) => {
                self.fail(err.into());
                None
            }
        }
    }

    /// Optimistically sets the status, then asks the store to persist it.
    pub fn update_status(&mut self, id: RecordId, status: Status) -> Option<Effect> {
        self.user.as_ref()?;
        if !self.records.set_status(&id, status) {
            return None;
        }
        self.mark_dirty();
        Some(Effect::UpdateRecord {
            id,
            patch: RecordPatch::status(status),
            origin: Origin::Direct(self.epoch),
        })
    }

    /// Optimistically removes the record, then asks the store to delete it.
    pub fn delete(&mut self, id: RecordId) -> Option<Effect> {
        self.user.as_ref()?;
        self.records.remove(&id)?;
        self.mark_dirty();
        Some(Effect::DeleteRecord {
            id,
            origin: Origin::Direct(self.epoch),
        })
    }

    /// Completion of a create, update or delete. Successful saves refresh so
    /// the store-assigned id and timestamp become authoritative; failed direct
    /// mutations refresh so the optimistic state gets corrected. Completions
    /// for a previous user are dropped.
    pub fn complete_mutation(
        &mut self,
        operation: Operation,
        origin: Origin,
        result: Result<(), String>,
    ) -> Option<Effect> {
        if origin.epoch() != self.epoch {
            return None;
        }
        match origin {
            Origin::Session(_, token) => {
                let applied = self.session.complete(token, result.clone());
                match result {
                    Ok(()) => {
                        if applied {
                            self.mark_dirty();
                        }
                        self.refresh()
                    }
                    Err(_) if applied => {
                        self.mark_dirty();
                        None
                    }
                    // The session it belonged to is gone; report it globally.
                    Err(message) => {
                        self.fail(TrackerError::remote(operation, message));
                        None
                    }
                }
            }
            Origin::Direct(_) => match result {
                Ok(()) if operation == Operation::Create => self.refresh(),
                Ok(()) => None,
                Err(message) => {
                    self.fail(TrackerError::remote(operation, message));
                    self.refresh()
                }
            },
        }
    }

    // -- filter -------------------------------------------------------------

    pub fn set_all_filter(&mut self) {
        self.filter.set_all();
        self.mark_dirty();
    }

    pub fn toggle_filter(&mut self, status: Status) {
        self.filter.toggle(status);
        self.mark_dirty();
    }

    // -- edit session -----------------------------------------------------

    pub fn start_create(&mut self) {
        match self.session.start_create() {
            Ok(_) => self.mark_dirty(),
            Err(err) => self.fail(err.into()),
        }
    }

    /// Opens the edit form for a record in the canonical collection.
    pub fn start_edit(&mut self, id: &RecordId) -> bool {
        let Some(record) = self.records.get(id) else {
            return false;
        };
        let record = record.clone();
        self.session.start_edit(&record);
        self.mark_dirty();
        true
    }

    pub fn update_field(&mut self, field: EditField, value: String) {
        match self.session.update_field(field, value) {
            Ok(()) => self.mark_dirty(),
            Err(err) => self.fail(err.into()),
        }
    }

    pub fn submit(&mut self) -> Option<Effect> {
        let is_create = self.session.is_active() && self.session.editing_id().is_none();
        if is_create && self.user.is_none() {
            self.fail(TrackerError::NotSignedIn);
            return None;
        }

        let submission = self.session.submit();
        self.mark_dirty();
        match submission {
            Ok(Submission::Create { token, fields }) => {
                let user = self.user.clone()?;
                Some(Effect::CreateRecord {
                    user,
                    fields,
                    origin: Origin::Session(self.epoch, token),
                })
            }
            Ok(Submission::Update { token, id, patch }) => Some(Effect::UpdateRecord {
                id,
                patch,
                origin: Origin::Session(self.epoch, token),
            }),
            // The draft carries the message for re-display.
            Err(SessionError::Validation(_)) => None,
            Err(err) => {
                self.fail(err.into());
                None
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        if self.session.is_active() {
            self.session.cancel();
            self.mark_dirty();
        }
    }

    pub fn dismiss_edit(&mut self) {
        if self.session.is_active() {
            self.session.dismiss();
            self.mark_dirty();
        }
    }

    // -- errors -----------------------------------------------------------

    pub fn record_subscription_failure(&mut self, message: String) {
        self.fail(TrackerError::Subscription(message));
    }

    pub fn dismiss_error(&mut self) {
        if self.last_error.take().is_some() {
            self.mark_dirty();
        }
    }

    fn fail(&mut self, err: TrackerError) {
        self.last_error = Some(err);
        self.mark_dirty();
    }
}
