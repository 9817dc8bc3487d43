use std::collections::BTreeSet;

use crate::{Record, Status};

/// Multi-select status filter. No explicit selection means "All", so a
/// selection can never be empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    selected: BTreeSet<Status>,
}

impl FilterSelection {
    pub fn is_all(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether `status` is explicitly selected. Always false under "All".
    pub fn is_selected(&self, status: Status) -> bool {
        self.selected.contains(&status)
    }

    /// Whether records with `status` pass the filter.
    pub fn matches(&self, status: Status) -> bool {
        self.is_all() || self.is_selected(status)
    }

    pub fn set_all(&mut self) {
        self.selected.clear();
    }

    /// Adds or removes `status`. Removing the last selection falls back to "All".
    pub fn toggle(&mut self, status: Status) {
        if !self.selected.remove(&status) {
            self.selected.insert(status);
        }
    }

    /// Records passing the filter, in input order.
    pub fn visible<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records
            .iter()
            .filter(|record| self.matches(record.status))
            .collect()
    }

    /// Number of records per status, in display order, over the unfiltered
    /// collection.
    pub fn counts(records: &[Record]) -> Vec<(Status, usize)> {
        Status::ALL
            .into_iter()
            .map(|status| {
                let count = records.iter().filter(|r| r.status == status).count();
                (status, count)
            })
            .collect()
    }
}
