use crate::{Generation, RecordFields, RecordId, RecordPatch, SessionToken, UserId};

/// Remote work requested by [`crate::update`]. Executed by the engine in the
/// order they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Establish the change subscription for `user`, replacing any other.
    Subscribe { user: UserId },
    Unsubscribe,
    FetchRecords {
        user: UserId,
        generation: Generation,
    },
    CreateRecord {
        user: UserId,
        fields: RecordFields,
        origin: Origin,
    },
    UpdateRecord {
        id: RecordId,
        patch: RecordPatch,
        origin: Origin,
    },
    DeleteRecord { id: RecordId, origin: Origin },
}

/// Advances on every sign-in and sign-out. Completions tagged with an older
/// epoch belong to a previous user and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserEpoch(u64);

impl UserEpoch {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Who asked for a mutation, and for which user epoch; echoed back on
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Card-level action (status change, delete) or programmatic create.
    Direct(UserEpoch),
    /// Submit of an edit session.
    Session(UserEpoch, SessionToken),
}

impl Origin {
    pub fn epoch(self) -> UserEpoch {
        match self {
            Origin::Direct(epoch) | Origin::Session(epoch, _) => epoch,
        }
    }
}
