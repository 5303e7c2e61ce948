//! Snapshot storage.
//!
//! A snapshot is one CSV table captured for a `(timestamp, hostname, title)`
//! natural key. Stores keep at most one live snapshot per natural key:
//! - upsert overwrites in place, keeping the id
//! - a fresh insert triggers the retention sweep
//! - days and instants are derived from the timestamp in local time
//!
//! Two implementations satisfy [`Repository`]: [`sqlite::SqliteRepository`]
//! for real use and [`memory::MemoryRepository`] for fakes and throwaway runs.

pub mod memory;
pub mod sqlite;

#[cfg(test)]
mod contract;

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::calendar;
use crate::error::{Error, Result};
use crate::table::{self, Table};

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// A stored snapshot including its encoded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: i64,
    pub unix_timestamp: i64,
    pub hostname: String,
    pub title: String,
    pub raw_content: String,
}

impl Snapshot {
    pub fn timestamp(&self) -> DateTime<Local> {
        calendar::from_unix(self.unix_timestamp)
    }

    pub fn contents(&self) -> Result<Table> {
        table::decode(&self.raw_content)
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id,
            unix_timestamp: self.unix_timestamp,
            hostname: self.hostname.clone(),
            title: self.title.clone(),
        }
    }
}

/// Snapshot identity without the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub id: i64,
    pub unix_timestamp: i64,
    pub hostname: String,
    pub title: String,
}

impl SnapshotSummary {
    pub fn timestamp(&self) -> DateTime<Local> {
        calendar::from_unix(self.unix_timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Overwritten(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Overwritten(id) => *id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted(_) => "inserted",
            UpsertOutcome::Overwritten(_) => "overwritten",
        }
    }
}

/// How long snapshots live after a newer insert comes along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Forever,
    Window(Duration),
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Window(DEFAULT_RETENTION)
    }
}

impl Retention {
    /// Oldest unix timestamp that survives a sweep at `now`, or `None` when
    /// nothing is ever swept.
    pub fn cutoff(&self, now: DateTime<Local>) -> Option<i64> {
        match self {
            Retention::Forever => None,
            Retention::Window(window) => chrono::Duration::from_std(*window)
                .ok()
                .and_then(|window| now.checked_sub_signed(window))
                .map(|oldest| oldest.timestamp()),
        }
    }
}

pub trait Repository: Send + Sync {
    /// Insert or overwrite the snapshot at the natural key. Only inserts run
    /// the retention sweep, and the sweep spares the row just written.
    fn upsert(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
        table: &Table,
    ) -> Result<UpsertOutcome>;

    /// Distinct local days holding at least one snapshot, ascending.
    fn list_days(&self) -> Result<Vec<NaiveDate>>;

    /// Distinct instants falling on the local `day`, ascending.
    fn list_instants(&self, day: NaiveDate) -> Result<Vec<DateTime<Local>>>;

    /// Snapshots at exactly `timestamp`, ordered by hostname then title.
    fn list_at(&self, timestamp: DateTime<Local>) -> Result<Vec<SnapshotSummary>>;

    fn get(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
    ) -> Result<Option<Snapshot>>;
}

/// Hostname and title must both be non-empty.
pub fn validate_key(hostname: &str, title: &str) -> Result<()> {
    if hostname.is_empty() {
        return Err(Error::InvalidKey { field: "hostname" });
    }
    if title.is_empty() {
        return Err(Error::InvalidKey { field: "title" });
    }
    Ok(())
}

/// Collapse ascending unix timestamps into distinct local days.
fn distinct_days(timestamps: impl IntoIterator<Item = i64>) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = timestamps.into_iter().map(calendar::local_day).collect();
    days.sort_unstable();
    days.dedup();
    days
}

fn consistency_violation(unix_timestamp: i64, hostname: &str, title: &str, count: usize) -> Error {
    tracing::error!(
        unix_timestamp,
        hostname,
        title,
        count,
        "multiple snapshots share one natural key"
    );
    Error::Consistency {
        timestamp: unix_timestamp,
        hostname: hostname.to_string(),
        title: title.to_string(),
        count,
    }
}
