use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use parking_lot::Mutex;

use super::{
    consistency_violation, distinct_days, Repository, Retention, Snapshot, SnapshotSummary,
    UpsertOutcome, validate_key,
};
use crate::calendar;
use crate::clock::Clock;
use crate::error::Result;
use crate::table::{self, Table};

/// Repository kept entirely in process memory. Nothing survives a restart.
pub struct MemoryRepository {
    clock: Arc<dyn Clock>,
    retention: Retention,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    snapshots: Vec<Snapshot>,
}

impl MemoryRepository {
    pub fn new(clock: Arc<dyn Clock>, retention: Retention) -> Self {
        MemoryRepository {
            clock,
            retention,
            inner: Mutex::new(Inner {
                next_id: 1,
                snapshots: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append without checking the natural key, to simulate a corrupted store.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&self, unix_timestamp: i64, hostname: &str, title: &str) {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.snapshots.push(Snapshot {
            id,
            unix_timestamp,
            hostname: hostname.to_string(),
            title: title.to_string(),
            raw_content: String::new(),
        });
    }
}

impl Repository for MemoryRepository {
    fn upsert(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
        table: &Table,
    ) -> Result<UpsertOutcome> {
        validate_key(hostname, title)?;
        let raw_content = table::encode(table)?;
        let unix_timestamp = timestamp.timestamp();

        // one lock for check, write and sweep
        let mut inner = self.inner.lock();

        let positions: Vec<usize> = inner
            .snapshots
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.unix_timestamp == unix_timestamp && s.hostname == hostname && s.title == title
            })
            .map(|(index, _)| index)
            .collect();

        match positions.as_slice() {
            [] => {}
            [index] => {
                let existing = &mut inner.snapshots[*index];
                existing.raw_content = raw_content;
                return Ok(UpsertOutcome::Overwritten(existing.id));
            }
            _ => {
                return Err(consistency_violation(
                    unix_timestamp,
                    hostname,
                    title,
                    positions.len(),
                ));
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.snapshots.push(Snapshot {
            id,
            unix_timestamp,
            hostname: hostname.to_string(),
            title: title.to_string(),
            raw_content,
        });

        if let Some(cutoff) = self.retention.cutoff(self.clock.now()) {
            let before = inner.snapshots.len();
            inner
                .snapshots
                .retain(|s| s.id == id || s.unix_timestamp >= cutoff);
            let deleted = before - inner.snapshots.len();
            if deleted > 0 {
                tracing::info!(deleted, cutoff, "retention sweep removed old snapshots");
            }
        }

        Ok(UpsertOutcome::Inserted(id))
    }

    fn list_days(&self) -> Result<Vec<NaiveDate>> {
        let inner = self.inner.lock();
        Ok(distinct_days(inner.snapshots.iter().map(|s| s.unix_timestamp)))
    }

    fn list_instants(&self, day: NaiveDate) -> Result<Vec<DateTime<Local>>> {
        let (start, end) = calendar::day_bounds(day);
        let inner = self.inner.lock();

        let mut timestamps: Vec<i64> = inner
            .snapshots
            .iter()
            .map(|s| s.unix_timestamp)
            .filter(|ts| (start..end).contains(ts))
            .collect();
        timestamps.sort_unstable();
        timestamps.dedup();

        Ok(timestamps.into_iter().map(calendar::from_unix).collect())
    }

    fn list_at(&self, timestamp: DateTime<Local>) -> Result<Vec<SnapshotSummary>> {
        let unix_timestamp = timestamp.timestamp();
        let inner = self.inner.lock();

        let mut summaries: Vec<SnapshotSummary> = inner
            .snapshots
            .iter()
            .filter(|s| s.unix_timestamp == unix_timestamp)
            .map(Snapshot::summary)
            .collect();
        summaries.sort_by(|a, b| (&a.hostname, &a.title).cmp(&(&b.hostname, &b.title)));

        Ok(summaries)
    }

    fn get(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
    ) -> Result<Option<Snapshot>> {
        let unix_timestamp = timestamp.timestamp();
        let inner = self.inner.lock();

        let found: Vec<&Snapshot> = inner
            .snapshots
            .iter()
            .filter(|s| {
                s.unix_timestamp == unix_timestamp && s.hostname == hostname && s.title == title
            })
            .collect();

        match found.as_slice() {
            [] => Ok(None),
            [snapshot] => Ok(Some((*snapshot).clone())),
            _ => Err(consistency_violation(
                unix_timestamp,
                hostname,
                title,
                found.len(),
            )),
        }
    }
}
