//! In-process store with a change feed. Used by the demo backend and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Duration, Utc};
use tracker_core::{Record, RecordFields, RecordId, RecordPatch, UserId};

use crate::{ChangeCallback, ChangeFeed, FailureKind, RecordStore, StoreError, Subscription};

struct Row {
    owner: UserId,
    record: Record,
}

struct Listener {
    id: u64,
    user: UserId,
    callback: ChangeCallback,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Row>,
    listeners: Vec<Listener>,
    next_listener: u64,
    last_created: Option<DateTime<Utc>>,
    failure: Option<FailureKind>,
}

impl Inner {
    fn check(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(kind) => Err(StoreError::new(kind.clone(), "injected failure")),
            None => Ok(()),
        }
    }

    // Strictly increasing so newest-first order is total.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(created);
        created
    }

    fn callbacks_for(&self, user: &UserId) -> Vec<ChangeCallback> {
        self.listeners
            .iter()
            .filter(|listener| &listener.user == user)
            .map(|listener| listener.callback.clone())
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `kind` until cleared with `None`.
    pub fn set_failure(&self, kind: Option<FailureKind>) {
        self.lock().failure = kind;
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Stored records of `user`, newest first, bypassing failure injection.
    pub fn snapshot(&self, user: &UserId) -> Vec<Record> {
        let inner = self.lock();
        let mut records: Vec<Record> = inner
            .rows
            .iter()
            .filter(|row| &row.owner == user)
            .map(|row| row.record.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Inserts a record as another client would, notifying subscribers.
    pub fn insert(&self, user: &UserId, fields: RecordFields) -> Record {
        let (record, callbacks) = {
            let mut inner = self.lock();
            let record = Record {
                id: RecordId::new(uuid::Uuid::new_v4().to_string()),
                title: fields.title,
                company: fields.company,
                status: fields.status,
                url: fields.url,
                notes: fields.notes,
                created_at: inner.next_created_at(),
            };
            inner.rows.push(Row {
                owner: user.clone(),
                record: record.clone(),
            });
            (record, inner.callbacks_for(user))
        };
        notify(callbacks);
        record
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate_by_id(
        &self,
        id: &RecordId,
        apply: impl FnOnce(&mut Vec<Row>, usize),
    ) -> Result<(), StoreError> {
        let callbacks = {
            let mut inner = self.lock();
            inner.check()?;
            let index = inner
                .rows
                .iter()
                .position(|row| &row.record.id == id)
                .ok_or_else(|| StoreError::new(FailureKind::NotFound, format!("no job {id}")))?;
            let owner = inner.rows[index].owner.clone();
            apply(&mut inner.rows, index);
            inner.callbacks_for(&owner)
        };
        notify(callbacks);
        Ok(())
    }
}

// Listeners run outside the lock so they may call back into the store.
fn notify(callbacks: Vec<ChangeCallback>) {
    for callback in callbacks {
        callback();
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn list_records(&self, user: &UserId) -> Result<Vec<Record>, StoreError> {
        self.lock().check()?;
        Ok(self.snapshot(user))
    }

    async fn create_record(
        &self,
        user: &UserId,
        fields: &RecordFields,
    ) -> Result<RecordId, StoreError> {
        self.lock().check()?;
        Ok(self.insert(user, fields.clone()).id)
    }

    async fn update_record(&self, id: &RecordId, patch: &RecordPatch) -> Result<(), StoreError> {
        self.mutate_by_id(id, |rows, index| rows[index].record.apply(patch))
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), StoreError> {
        self.mutate_by_id(id, |rows, index| {
            rows.remove(index);
        })
    }
}

struct MemorySubscription {
    inner: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription for MemorySubscription {
    fn unsubscribe(self: Box<Self>) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|listener| listener.id != self.id);
        }
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(
        &self,
        user: &UserId,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        let mut inner = self.lock();
        inner.check()?;
        inner.next_listener += 1;
        let id = inner.next_listener;
        inner.listeners.push(Listener {
            id,
            user: user.clone(),
            callback: on_change,
        });
        Ok(Box::new(MemorySubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }))
    }
}
