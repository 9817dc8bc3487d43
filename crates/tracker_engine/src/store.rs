use std::sync::Arc;

use tracker_core::{Record, RecordFields, RecordId, RecordPatch, UserId};

use crate::StoreError;

/// Remote authoritative store for job records, scoped by user on read and
/// create.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of `user`, newest first.
    async fn list_records(&self, user: &UserId) -> Result<Vec<Record>, StoreError>;

    async fn create_record(
        &self,
        user: &UserId,
        fields: &RecordFields,
    ) -> Result<RecordId, StoreError>;

    async fn update_record(&self, id: &RecordId, patch: &RecordPatch) -> Result<(), StoreError>;

    async fn delete_record(&self, id: &RecordId) -> Result<(), StoreError>;
}

/// Called by a [`ChangeFeed`] whenever any client changes the user's records.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ChangeFeed::subscribe`].
pub trait Subscription: Send {
    fn unsubscribe(self: Box<Self>);
}

/// Push-notification transport.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(
        &self,
        user: &UserId,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn Subscription>, StoreError>;
}
