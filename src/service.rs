//! Query facade over the repository, codec and sort engine.
//!
//! Each method maps to one operation of the HTTP surface. The service holds
//! nothing but the repository handle.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::sort::{self, Column};
use crate::store::{self, Repository, SnapshotSummary, UpsertOutcome};
use crate::table;

/// Titles captured for one host at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTitles {
    pub hostname: String,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotView {
    pub snapshot: SnapshotSummary,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

pub struct SnapshotService {
    repository: Arc<dyn Repository>,
}

impl SnapshotService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        SnapshotService { repository }
    }

    pub fn list_days(&self) -> Result<Vec<NaiveDate>> {
        self.repository.list_days()
    }

    pub fn list_instants(&self, day: NaiveDate) -> Result<Vec<DateTime<Local>>> {
        self.repository.list_instants(day)
    }

    /// Group the snapshots at `timestamp` by host. Hosts appear in the order
    /// the repository first yields them; titles keep repository order.
    pub fn list_hosts(&self, timestamp: DateTime<Local>) -> Result<Vec<HostTitles>> {
        let mut hosts: Vec<HostTitles> = Vec::new();

        for summary in self.repository.list_at(timestamp)? {
            match hosts.iter().position(|h| h.hostname == summary.hostname) {
                Some(index) => hosts[index].titles.push(summary.title),
                None => hosts.push(HostTitles {
                    hostname: summary.hostname,
                    titles: vec![summary.title],
                }),
            }
        }

        Ok(hosts)
    }

    /// Fetch one snapshot, optionally sorted by a named column. `Ok(None)`
    /// when no snapshot exists at that key.
    pub fn view(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
        sort_column: Option<&str>,
        reverse: bool,
    ) -> Result<Option<SnapshotView>> {
        let Some(snapshot) = self.repository.get(timestamp, hostname, title)? else {
            return Ok(None);
        };

        let (header, mut rows) = snapshot.contents()?.into_parts();
        let sort_column = sort_column.filter(|column| !column.is_empty());

        if let Some(column) = sort_column {
            rows = sort::sort_rows(&header, rows, column, reverse);
        }

        Ok(Some(SnapshotView {
            snapshot: snapshot.summary(),
            columns: sort::describe_columns(&header, sort_column, reverse),
            rows,
        }))
    }

    /// Decode `body` as CSV and store it under the natural key.
    pub fn submit(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
        body: &str,
    ) -> Result<UpsertOutcome> {
        store::validate_key(hostname, title)?;
        let table = table::decode(body)?;
        let outcome = self.repository.upsert(timestamp, hostname, title, &table)?;
        tracing::debug!(
            id = outcome.id(),
            outcome = outcome.as_str(),
            hostname,
            title,
            "stored snapshot"
        );
        Ok(outcome)
    }
}
