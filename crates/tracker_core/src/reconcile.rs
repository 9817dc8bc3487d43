//! Canonical record collection and refresh bookkeeping.
//!
//! The reconciler never talks to the store itself. `request_refresh` hands out
//! a [`Generation`] when the caller must issue a fetch, and `apply_refresh`
//! accepts the response tagged with that generation. At most one generation is
//! in flight; requests arriving meanwhile collapse into one follow-up fetch.

use std::collections::HashSet;

use crate::{Record, RecordId, Status};

/// Token identifying one issued fetch. Strictly increasing per reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What happened to a fetch response handed to [`Reconciler::apply_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The collection was replaced.
    Applied { count: usize },
    /// The fetch failed; the collection is unchanged.
    Failed { message: String },
    /// A newer refresh was requested while this one was in flight. The
    /// response was dropped and `follow_up` must be fetched.
    Superseded { follow_up: Generation },
    /// Not the in-flight generation (e.g. issued before a user change).
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciler {
    records: Vec<Record>,
    last_generation: u64,
    in_flight: Option<Generation>,
    refresh_pending: bool,
    loaded: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records sorted by creation time, newest first.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// True once a refresh has completed (successfully or not) since the
    /// last reset.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Generation> {
        self.in_flight
    }

    /// Single-flight refresh. Returns the generation to fetch, or `None` when
    /// a fetch is already running; in that case exactly one more fetch runs
    /// once the current one completes.
    pub fn request_refresh(&mut self) -> Option<Generation> {
        if self.in_flight.is_some() {
            self.refresh_pending = true;
            return None;
        }
        Some(self.issue())
    }

    pub fn apply_refresh(
        &mut self,
        generation: Generation,
        result: Result<Vec<Record>, String>,
    ) -> RefreshOutcome {
        if self.in_flight != Some(generation) {
            return RefreshOutcome::Stale;
        }
        self.in_flight = None;

        if std::mem::take(&mut self.refresh_pending) {
            return RefreshOutcome::Superseded {
                follow_up: self.issue(),
            };
        }

        self.loaded = true;
        match result {
            Ok(records) => {
                self.records = canonicalize(records);
                RefreshOutcome::Applied {
                    count: self.records.len(),
                }
            }
            Err(message) => RefreshOutcome::Failed { message },
        }
    }

    /// Optimistic status change. Returns false if the record is unknown.
    pub fn set_status(&mut self, id: &RecordId, status: Status) -> bool {
        let Some(record) = self.records.iter_mut().find(|record| &record.id == id) else {
            return false;
        };
        record.status = status;
        self.supersede_in_flight();
        true
    }

    /// Optimistic removal.
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let index = self.records.iter().position(|record| &record.id == id)?;
        self.supersede_in_flight();
        Some(self.records.remove(index))
    }

    /// Drops all records and forgets the in-flight fetch. Generations keep
    /// increasing so responses issued before the reset are recognised as
    /// stale.
    pub fn reset(&mut self) {
        self.records.clear();
        self.in_flight = None;
        self.refresh_pending = false;
        self.loaded = false;
    }

    fn issue(&mut self) -> Generation {
        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        self.in_flight = Some(generation);
        generation
    }

    // A fetch already on the wire may predate the mutation's request; its
    // result must not overwrite the optimistic state.
    fn supersede_in_flight(&mut self) {
        if self.in_flight.is_some() {
            self.refresh_pending = true;
        }
    }
}

fn canonicalize(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut records: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect();
    // Stable sort keeps the store's order for equal timestamps.
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, minute: u32) -> Record {
        Record {
            id: RecordId::new(id),
            title: format!("Role {id}"),
            company: "Acme".to_string(),
            status: Status::Saved,
            url: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn canonicalize_sorts_newest_first_and_drops_duplicate_ids() {
        let records = canonicalize(vec![record("a", 1), record("b", 3), record("a", 9)]);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn generations_survive_reset() {
        let mut reconciler = Reconciler::new();
        let first = reconciler.request_refresh().unwrap();
        reconciler.reset();
        let second = reconciler.request_refresh().unwrap();
        assert!(second > first);
        assert_eq!(
            reconciler.apply_refresh(first, Ok(vec![record("a", 1)])),
            RefreshOutcome::Stale
        );
        assert!(reconciler.is_refreshing());
    }
}
