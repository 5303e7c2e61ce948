use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

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

/// How long a statement waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            unix_timestamp INTEGER NOT NULL,
            hostname TEXT NOT NULL,
            title TEXT NOT NULL,
            raw_content TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshots_natural_key
         ON snapshots(unix_timestamp, hostname, title)",
        [],
    )?;

    Ok(())
}

fn log_statement(sql: &str) {
    tracing::debug!(target: "timeturner::sql", "{sql}");
}

/// Database handle. One connection behind a mutex serves every request.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    retention: Retention,
}

impl SqliteRepository {
    pub fn open(path: &Path, clock: Arc<dyn Clock>, retention: Retention) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, clock, retention)
    }

    pub fn open_in_memory(clock: Arc<dyn Clock>, retention: Retention) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, clock, retention)
    }

    pub fn with_connection(
        conn: Connection,
        clock: Arc<dyn Clock>,
        retention: Retention,
    ) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        init_schema(&conn)?;
        Ok(SqliteRepository {
            conn: Mutex::new(conn),
            clock,
            retention,
        })
    }

    /// Forward every executed statement to `tracing` at debug level.
    pub fn enable_sql_logging(&mut self) {
        self.conn.get_mut().trace(Some(log_statement));
    }
}

impl Repository for SqliteRepository {
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

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Vec<i64> = {
            let mut stmt = tx.prepare_cached(
                "SELECT id FROM snapshots
                 WHERE unix_timestamp = ?1 AND hostname = ?2 AND title = ?3",
            )?;
            let ids = stmt
                .query_map(params![unix_timestamp, hostname, title], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            ids
        };

        let outcome = match existing.as_slice() {
            [] => {
                tx.execute(
                    "INSERT INTO snapshots (unix_timestamp, hostname, title, raw_content)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![unix_timestamp, hostname, title, raw_content],
                )?;
                let id = tx.last_insert_rowid();

                if let Some(cutoff) = self.retention.cutoff(self.clock.now()) {
                    let deleted = tx.execute(
                        "DELETE FROM snapshots WHERE unix_timestamp < ?1 AND id != ?2",
                        params![cutoff, id],
                    )?;
                    if deleted > 0 {
                        tracing::info!(deleted, cutoff, "retention sweep removed old snapshots");
                    }
                }

                UpsertOutcome::Inserted(id)
            }
            [id] => {
                tx.execute(
                    "UPDATE snapshots SET raw_content = ?1 WHERE id = ?2",
                    params![raw_content, id],
                )?;
                UpsertOutcome::Overwritten(*id)
            }
            _ => {
                return Err(consistency_violation(
                    unix_timestamp,
                    hostname,
                    title,
                    existing.len(),
                ));
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn list_days(&self) -> Result<Vec<NaiveDate>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT DISTINCT unix_timestamp FROM snapshots ORDER BY unix_timestamp",
        )?;

        let timestamps = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(distinct_days(timestamps))
    }

    fn list_instants(&self, day: NaiveDate) -> Result<Vec<DateTime<Local>>> {
        let (start, end) = calendar::day_bounds(day);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT DISTINCT unix_timestamp FROM snapshots
             WHERE unix_timestamp >= ?1 AND unix_timestamp < ?2
             ORDER BY unix_timestamp",
        )?;

        let instants = stmt
            .query_map(params![start, end], |row| {
                row.get::<_, i64>(0).map(calendar::from_unix)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(instants)
    }

    fn list_at(&self, timestamp: DateTime<Local>) -> Result<Vec<SnapshotSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, unix_timestamp, hostname, title
             FROM snapshots
             WHERE unix_timestamp = ?1
             ORDER BY hostname, title",
        )?;

        let summaries = stmt
            .query_map(params![timestamp.timestamp()], summary_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(summaries)
    }

    fn get(
        &self,
        timestamp: DateTime<Local>,
        hostname: &str,
        title: &str,
    ) -> Result<Option<Snapshot>> {
        let unix_timestamp = timestamp.timestamp();

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, unix_timestamp, hostname, title, raw_content
             FROM snapshots
             WHERE unix_timestamp = ?1 AND hostname = ?2 AND title = ?3",
        )?;

        let mut found = stmt
            .query_map(params![unix_timestamp, hostname, title], snapshot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            count => Err(consistency_violation(unix_timestamp, hostname, title, count)),
        }
    }
}

fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<SnapshotSummary> {
    Ok(SnapshotSummary {
        id: row.get(0)?,
        unix_timestamp: row.get(1)?,
        hostname: row.get(2)?,
        title: row.get(3)?,
    })
}

fn snapshot_from_row(row: &rusqlite::Row) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        id: row.get(0)?,
        unix_timestamp: row.get(1)?,
        hostname: row.get(2)?,
        title: row.get(3)?,
        raw_content: row.get(4)?,
    })
}
