use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{Dimension, Status};
use crate::events::EventHandle;

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: Status,
    changed_at: DateTime<Utc>,
}

/// Current status of each monitored dimension.
///
/// Owned by the reconciler and handed to checkers by `&mut`. Every real
/// change is published as one status event; writing the same value again
/// is silent.
#[derive(Debug)]
pub struct StatusBoard {
    entries: BTreeMap<Dimension, Entry>,
    events: EventHandle,
}

/// Serializable view of one board row.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub status: Status,
    pub icon: &'static str,
    pub changed_at: DateTime<Utc>,
}

impl StatusBoard {
    pub fn new(events: EventHandle) -> Self {
        let now = Utc::now();
        let entries = Dimension::ALL
            .iter()
            .map(|d| {
                (
                    *d,
                    Entry {
                        status: Status::Unknown,
                        changed_at: now,
                    },
                )
            })
            .collect();
        Self { entries, events }
    }

    pub fn get(&self, dimension: Dimension) -> Status {
        self.entries
            .get(&dimension)
            .map(|e| e.status)
            .unwrap_or_default()
    }

    /// Overwrite a dimension. Returns true if the value changed.
    pub fn set(&mut self, dimension: Dimension, status: Status) -> bool {
        let entry = self.entries.entry(dimension).or_insert(Entry {
            status: Status::Unknown,
            changed_at: Utc::now(),
        });
        if entry.status == status {
            return false;
        }

        debug!(target: "status", %dimension, from = %entry.status, to = %status, "status changed");
        entry.status = status;
        entry.changed_at = Utc::now();
        self.events.status(dimension, status);
        true
    }

    /// Mark a dimension as being checked, unless it is already Ok.
    /// Re-verifying a satisfied precondition stays quiet.
    pub fn begin_check(&mut self, dimension: Dimension) {
        if self.get(dimension) != Status::Ok {
            self.set(dimension, Status::Checking);
        }
    }

    pub fn report(&self) -> Vec<DimensionReport> {
        self.entries
            .iter()
            .map(|(dimension, entry)| DimensionReport {
                dimension: *dimension,
                status: entry.status,
                icon: entry.status.icon(),
                changed_at: entry.changed_at,
            })
            .collect()
    }
}
