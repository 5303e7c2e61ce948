//! Serializable views of facade results, one per browsing level.
//!
//! Dates and times are pre-formatted as the `YYYY-MM-DD` / `HH:MM:SS` path
//! segments a client needs to request the next level down.

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::calendar;
use crate::service::{HostTitles, SnapshotView};
use crate::sort::Column;
use crate::store::UpsertOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaysPage {
    pub days: Vec<String>,
}

impl DaysPage {
    pub fn new(days: &[NaiveDate]) -> Self {
        DaysPage {
            days: days.iter().copied().map(calendar::format_day).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstantsPage {
    pub date: String,
    pub times: Vec<String>,
}

impl InstantsPage {
    pub fn new(day: NaiveDate, instants: &[DateTime<Local>]) -> Self {
        InstantsPage {
            date: calendar::format_day(day),
            times: instants.iter().map(calendar::format_time).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostsPage {
    pub date: String,
    pub time: String,
    pub timestamp: String,
    pub hosts: Vec<HostTitles>,
}

impl HostsPage {
    pub fn new(timestamp: DateTime<Local>, hosts: Vec<HostTitles>) -> Self {
        HostsPage {
            date: calendar::format_date(&timestamp),
            time: calendar::format_time(&timestamp),
            timestamp: calendar::format_datetime(&timestamp),
            hosts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotPage {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub timestamp: String,
    pub hostname: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    pub reverse: bool,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl SnapshotPage {
    pub fn new(view: SnapshotView, reverse: bool) -> Self {
        let timestamp = view.snapshot.timestamp();
        let sort = view
            .columns
            .iter()
            .find(|c| c.is_sort_column)
            .map(|c| c.name.clone());

        SnapshotPage {
            id: view.snapshot.id,
            date: calendar::format_date(&timestamp),
            time: calendar::format_time(&timestamp),
            timestamp: calendar::format_datetime(&timestamp),
            hostname: view.snapshot.hostname,
            title: view.snapshot.title,
            reverse: sort.is_some() && reverse,
            sort,
            columns: view.columns,
            rows: view.rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertReceipt {
    pub id: i64,
    pub outcome: &'static str,
}

impl From<UpsertOutcome> for UpsertReceipt {
    fn from(outcome: UpsertOutcome) -> Self {
        UpsertReceipt {
            id: outcome.id(),
            outcome: outcome.as_str(),
        }
    }
}

/// Any one browsing level, for callers that render generically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Page {
    Days(DaysPage),
    Instants(InstantsPage),
    Hosts(HostsPage),
    Snapshot(SnapshotPage),
}
