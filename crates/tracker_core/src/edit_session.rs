//! Single-record create/edit workflow.
//!
//! ```text
//! Idle --start_create--> Composing --submit ok / cancel / dismiss--> Idle
//! any  --start_edit----> Editing   --submit ok / cancel / dismiss--> Idle
//! ```
//!
//! The working copy lives in a [`Draft`]; the canonical record is only
//! changed through the store once a submission succeeds.

use std::str::FromStr;

use crate::{Record, RecordFields, RecordId, RecordPatch, SessionError, Status, ValidationError};

/// Identifies one session so completions for a replaced session are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Company,
    Status,
    Url,
    Notes,
}

impl FromStr for EditField {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(EditField::Title),
            "company" => Ok(EditField::Company),
            "status" => Ok(EditField::Status),
            "url" => Ok(EditField::Url),
            "notes" => Ok(EditField::Notes),
            other => Err(format!("unknown field {other:?}")),
        }
    }
}

/// Working copy of the editable fields, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub title: String,
    pub company: String,
    pub status: Status,
    pub url: String,
    pub notes: String,
    /// Message from the last failed submit.
    pub error: Option<String>,
    pub saving: bool,
}

impl Draft {
    fn from_record(record: &Record) -> Self {
        Self {
            title: record.title.clone(),
            company: record.company.clone(),
            status: record.status,
            url: record.url.clone().unwrap_or_default(),
            notes: record.notes.clone().unwrap_or_default(),
            error: None,
            saving: false,
        }
    }

    pub fn fields(&self) -> RecordFields {
        RecordFields {
            title: self.title.clone(),
            company: self.company.clone(),
            status: self.status,
            url: Some(self.url.clone()),
            notes: Some(self.notes.clone()),
        }
        .normalized()
    }

    fn set(&mut self, field: EditField, value: String) -> Result<(), ValidationError> {
        match field {
            EditField::Title => self.title = value,
            EditField::Company => self.company = value,
            EditField::Status => self.status = value.parse()?,
            EditField::Url => self.url = value,
            EditField::Notes => self.notes = value,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Composing {
        token: SessionToken,
        draft: Draft,
    },
    Editing {
        token: SessionToken,
        record_id: RecordId,
        draft: Draft,
    },
}

/// Remote work requested by a successful [`EditSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create {
        token: SessionToken,
        fields: RecordFields,
    },
    Update {
        token: SessionToken,
        id: RecordId,
        patch: RecordPatch,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditSession {
    state: SessionState,
    last_token: u64,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Composing { draft, .. } | SessionState::Editing { draft, .. } => {
                Some(draft)
            }
        }
    }

    pub fn token(&self) -> Option<SessionToken> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Composing { token, .. } | SessionState::Editing { token, .. } => {
                Some(*token)
            }
        }
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        match &self.state {
            SessionState::Editing { record_id, .. } => Some(record_id),
            _ => None,
        }
    }

    pub fn start_create(&mut self) -> Result<SessionToken, SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        let token = self.next_token();
        self.state = SessionState::Composing {
            token,
            draft: Draft::default(),
        };
        Ok(token)
    }

    /// Replaces any active session, discarding unsaved edits.
    pub fn start_edit(&mut self, record: &Record) -> SessionToken {
        let token = self.next_token();
        self.state = SessionState::Editing {
            token,
            record_id: record.id.clone(),
            draft: Draft::from_record(record),
        };
        token
    }

    pub fn update_field(
        &mut self,
        field: EditField,
        value: impl Into<String>,
    ) -> Result<(), SessionError> {
        let draft = self.draft_mut().ok_or(SessionError::Inactive)?;
        draft.set(field, value.into())?;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
    }

    /// External dismissal (e.g. an escape action). Same effect as `cancel`.
    pub fn dismiss(&mut self) {
        self.cancel();
    }

    /// Validates the draft and marks it as saving. On validation failure the
    /// session and its draft stay as they are, with the message recorded.
    pub fn submit(&mut self) -> Result<Submission, SessionError> {
        let token = self.token().ok_or(SessionError::Inactive)?;
        let editing = self.editing_id().cloned();
        let draft = self.draft_mut().ok_or(SessionError::Inactive)?;
        if draft.saving {
            return Err(SessionError::SaveInFlight);
        }

        let fields = draft.fields();
        if let Err(err) = fields.validate() {
            draft.error = Some(err.to_string());
            return Err(err.into());
        }
        draft.error = None;
        draft.saving = true;

        Ok(match editing {
            Some(id) => Submission::Update {
                token,
                id,
                patch: fields.into(),
            },
            None => Submission::Create { token, fields },
        })
    }

    /// Applies the store's answer to a submission. Returns false when the
    /// session it belonged to is gone.
    pub fn complete(&mut self, token: SessionToken, result: Result<(), String>) -> bool {
        if self.token() != Some(token) {
            return false;
        }
        match result {
            Ok(()) => self.state = SessionState::Idle,
            Err(message) => {
                if let Some(draft) = self.draft_mut() {
                    draft.saving = false;
                    draft.error = Some(message);
                }
            }
        }
        true
    }

    fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            SessionState::Idle => None,
            SessionState::Composing { draft, .. } | SessionState::Editing { draft, .. } => {
                Some(draft)
            }
        }
    }

    fn next_token(&mut self) -> SessionToken {
        self.last_token += 1;
        SessionToken(self.last_token)
    }
}
