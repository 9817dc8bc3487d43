use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::ValidationError;

/// Store-assigned record identifier. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the signed-in user, as produced by the auth capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Saved,
    Applied,
    InterviewStage,
    Rejected,
    Offer,
}

impl Status {
    /// All statuses in display order.
    pub const ALL: [Status; 5] = [
        Status::Saved,
        Status::Applied,
        Status::InterviewStage,
        Status::Rejected,
        Status::Offer,
    ];

    /// Canonical token, e.g. `interview_stage`.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Saved => "saved",
            Status::Applied => "applied",
            Status::InterviewStage => "interview_stage",
            Status::Rejected => "rejected",
            Status::Offer => "offer",
        }
    }

    /// Value stored in the `status` column of the jobs table.
    pub fn wire_value(self) -> &'static str {
        match self {
            Status::InterviewStage => "interview stage",
            other => other.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Saved => "Saved",
            Status::Applied => "Applied",
            Status::InterviewStage => "Interview stage",
            Status::Rejected => "Rejected",
            Status::Offer => "Offer",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    /// Accepts the canonical token, the wire value and the display label,
    /// ignoring ASCII case and surrounding whitespace.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == token)
            .ok_or_else(|| ValidationError::InvalidStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub company: String,
    pub status: Status,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Editable fields of this record.
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            title: self.title.clone(),
            company: self.company.clone(),
            status: self.status,
            url: self.url.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(company) = &patch.company {
            self.company.clone_from(company);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(url) = &patch.url {
            self.url.clone_from(url);
        }
        if let Some(notes) = &patch.notes {
            self.notes.clone_from(notes);
        }
    }
}

/// User-editable subset of a record, as sent on create.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFields {
    pub title: String,
    pub company: String,
    pub status: Status,
    pub url: Option<String>,
    pub notes: Option<String>,
}

impl RecordFields {
    pub fn new(title: impl Into<String>, company: impl Into<String>, status: Status) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            status,
            url: None,
            notes: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trims required fields and maps blank optional fields to `None`.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            status: self.status,
            url: non_blank(self.url),
            notes: non_blank(self.notes),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.company.trim().is_empty() {
            return Err(ValidationError::EmptyCompany);
        }
        if let Some(raw) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            url::Url::parse(raw).map_err(|err| ValidationError::InvalidUrl {
                url: raw.to_string(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Normalizes, then validates.
    pub fn into_valid(self) -> Result<Self, ValidationError> {
        let fields = self.normalized();
        fields.validate()?;
        Ok(fields)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Partial update. `url` and `notes` use a nested option so they can be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub status: Option<Status>,
    pub url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl RecordPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<RecordFields> for RecordPatch {
    fn from(fields: RecordFields) -> Self {
        Self {
            title: Some(fields.title),
            company: Some(fields.company),
            status: Some(fields.status),
            url: Some(fields.url),
            notes: Some(fields.notes),
        }
    }
}
