//! Behaviour every [`Repository`] must show, run against each implementation.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};

use super::{Repository, UpsertOutcome};
use crate::calendar;
use crate::error::Error;
use crate::clock::{Clock, FixedClock};
use crate::table::Table;

pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .earliest()
        .unwrap()
}

pub fn now() -> DateTime<Local> {
    at(2013, 10, 6, 0, 0, 0)
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now()))
}

fn processes() -> Table {
    Table::from_rows([["pid", "name"], ["1", "init"]])
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// First day of `year` that is not 24 hours long in the local zone.
fn dst_transition_day(year: i32) -> Option<NaiveDate> {
    let mut current = day(year, 1, 1);
    while current.year() == year {
        let (start, end) = calendar::day_bounds(current);
        if end - start != 86_400 {
            return Some(current);
        }
        current = current.succ_opt()?;
    }
    None
}

pub fn end_to_end_scenario(repo: &dyn Repository) {
    let t0 = now();
    let outcome = repo.upsert(t0, "host1", "processes", &processes()).unwrap();
    assert!(matches!(outcome, UpsertOutcome::Inserted(_)));

    let snapshot = repo.get(t0, "host1", "processes").unwrap().unwrap();
    assert_eq!(snapshot.contents().unwrap(), processes());
    assert_eq!(snapshot.unix_timestamp, t0.timestamp());

    let summaries = repo.list_at(t0).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].hostname, "host1");
    assert_eq!(summaries[0].title, "processes");
    assert_eq!(summaries[0].id, outcome.id());

    assert_eq!(repo.list_days().unwrap(), vec![t0.date_naive()]);
    assert!(repo.get(t0, "host1", "queries").unwrap().is_none());
}

pub fn identical_upsert_is_idempotent(repo: &dyn Repository) {
    let first = repo.upsert(now(), "host1", "processes", &processes()).unwrap();
    let second = repo.upsert(now(), "host1", "processes", &processes()).unwrap();

    assert_eq!(second, UpsertOutcome::Overwritten(first.id()));
    assert_eq!(repo.list_at(now()).unwrap().len(), 1);
    let snapshot = repo.get(now(), "host1", "processes").unwrap().unwrap();
    assert_eq!(snapshot.contents().unwrap(), processes());
}

pub fn overwrite_replaces_content_and_keeps_id(repo: &dyn Repository) {
    let replacement = Table::from_rows([["pid", "name"], ["1", "systemd"], ["2", "kthreadd"]]);

    let first = repo.upsert(now(), "host1", "processes", &processes()).unwrap();
    let second = repo.upsert(now(), "host1", "processes", &replacement).unwrap();
    assert_eq!(second, UpsertOutcome::Overwritten(first.id()));

    let snapshot = repo.get(now(), "host1", "processes").unwrap().unwrap();
    assert_eq!(snapshot.id, first.id());
    assert_eq!(snapshot.contents().unwrap(), replacement);
    assert_eq!(repo.list_at(now()).unwrap().len(), 1);
}

pub fn natural_key_stays_unique(repo: &dyn Repository) {
    for round in 0..3 {
        for host in ["host1", "host2"] {
            for title in ["processes", "queries"] {
                let table = Table::from_rows([["round".to_string()], [round.to_string()]]);
                repo.upsert(now(), host, title, &table).unwrap();
            }
        }
    }

    let summaries = repo.list_at(now()).unwrap();
    assert_eq!(summaries.len(), 4);
    let mut keys: Vec<(&str, &str)> = summaries
        .iter()
        .map(|s| (s.hostname.as_str(), s.title.as_str()))
        .collect();
    keys.dedup();
    assert_eq!(keys.len(), 4);

    let snapshot = repo.get(now(), "host2", "queries").unwrap().unwrap();
    assert_eq!(snapshot.contents().unwrap().data()[0], ["2"]);
}

pub fn days_and_instants_group_by_local_day(repo: &dyn Repository) {
    let late = at(2013, 10, 6, 23, 0, 0);
    let early_next = at(2013, 10, 7, 1, 0, 0);
    let one_am = at(2013, 10, 6, 1, 0, 0);

    for timestamp in [late, early_next, now(), one_am] {
        repo.upsert(timestamp, "host1", "processes", &processes()).unwrap();
    }
    // second host at an existing instant must not duplicate the instant
    repo.upsert(late, "host2", "processes", &processes()).unwrap();

    assert_eq!(
        repo.list_days().unwrap(),
        vec![day(2013, 10, 6), day(2013, 10, 7)]
    );
    assert_eq!(
        repo.list_instants(day(2013, 10, 6)).unwrap(),
        vec![now(), one_am, late]
    );
    assert_eq!(repo.list_instants(day(2013, 10, 7)).unwrap(), vec![early_next]);
    assert!(repo.list_instants(day(2013, 10, 8)).unwrap().is_empty());
}

pub fn list_at_orders_by_host_then_title(repo: &dyn Repository) {
    let empty = Table::default();
    repo.upsert(now(), "host2", "processes", &empty).unwrap();
    repo.upsert(now(), "host1", "queries", &empty).unwrap();
    repo.upsert(now(), "host1", "processes", &empty).unwrap();
    repo.upsert(now() + Duration::hours(1), "host2", "queries", &empty)
        .unwrap();

    let keys: Vec<(String, String)> = repo
        .list_at(now())
        .unwrap()
        .into_iter()
        .map(|s| (s.hostname, s.title))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("host1".to_string(), "processes".to_string()),
            ("host1".to_string(), "queries".to_string()),
            ("host2".to_string(), "processes".to_string()),
        ]
    );
}

pub fn retention_sweeps_old_days_on_insert(repo: &dyn Repository, clock: &FixedClock) {
    repo.upsert(now(), "host1", "processes", &processes()).unwrap();

    clock.advance(Duration::days(100));
    let later = clock.now();
    repo.upsert(later, "host2", "queries", &processes()).unwrap();

    assert_eq!(repo.list_days().unwrap(), vec![later.date_naive()]);
    assert!(repo.get(now(), "host1", "processes").unwrap().is_none());
}

pub fn overwrite_does_not_sweep(repo: &dyn Repository, clock: &FixedClock) {
    repo.upsert(now(), "host1", "processes", &processes()).unwrap();
    repo.upsert(now(), "host2", "processes", &processes()).unwrap();

    clock.advance(Duration::days(100));
    let outcome = repo.upsert(now(), "host1", "processes", &Table::default()).unwrap();
    assert!(matches!(outcome, UpsertOutcome::Overwritten(_)));
    assert_eq!(repo.list_at(now()).unwrap().len(), 2);

    // the next insert sweeps both stale snapshots
    let later = clock.now();
    repo.upsert(later, "host1", "processes", &processes()).unwrap();
    assert!(repo.list_at(now()).unwrap().is_empty());
    assert_eq!(repo.list_days().unwrap(), vec![later.date_naive()]);
}

pub fn explicit_write_of_old_snapshot_survives_its_own_sweep(
    repo: &dyn Repository,
    clock: &FixedClock,
) {
    let ancient = clock.now() - Duration::days(30);
    let outcome = repo.upsert(ancient, "host1", "processes", &processes()).unwrap();
    assert!(matches!(outcome, UpsertOutcome::Inserted(_)));

    let snapshot = repo.get(ancient, "host1", "processes").unwrap();
    assert!(snapshot.is_some());
    assert_eq!(repo.list_days().unwrap(), vec![ancient.date_naive()]);
}

pub fn forever_retention_keeps_everything(repo: &dyn Repository, clock: &FixedClock) {
    repo.upsert(now(), "host1", "processes", &processes()).unwrap();
    clock.advance(Duration::days(100));
    repo.upsert(clock.now(), "host1", "processes", &processes()).unwrap();

    assert_eq!(
        repo.list_days().unwrap(),
        vec![now().date_naive(), clock.now().date_naive()]
    );
}

pub fn ids_are_never_reused(repo: &dyn Repository, clock: &FixedClock) {
    let a = repo.upsert(now(), "host1", "processes", &processes()).unwrap().id();
    clock.advance(Duration::days(100));
    let b = repo.upsert(clock.now(), "host1", "processes", &processes()).unwrap().id();
    assert!(repo.get(now(), "host1", "processes").unwrap().is_none());

    let c = repo.upsert(now(), "host1", "processes", &processes()).unwrap().id();
    assert_ne!(a, b);
    assert_ne!(c, a);
    assert!(c > b);
}

/// On a DST day the half-open window is 23 or 25 hours long; membership
/// must follow it exactly. Zones without DST exercise an ordinary day, so
/// run the suite under a DST zone as well, e.g.
/// `TZ=America/New_York cargo test` or `TZ=Australia/Lord_Howe cargo test`.
pub fn dst_transition_day_membership(repo: &dyn Repository, clock: &FixedClock) {
    let target = dst_transition_day(2013).unwrap_or_else(|| now().date_naive());
    let next = target.succ_opt().unwrap();
    let (start, end) = calendar::day_bounds(target);
    if dst_transition_day(2013).is_some() {
        assert_ne!(end - start, 86_400);
    }

    clock.set(calendar::from_unix(end));

    let first = calendar::from_unix(start);
    let last = calendar::from_unix(end - 1);
    let following = calendar::from_unix(end);
    for timestamp in [first, last, following] {
        repo.upsert(timestamp, "host1", "processes", &processes()).unwrap();
    }

    assert_eq!(repo.list_days().unwrap(), vec![target, next]);
    assert_eq!(repo.list_instants(target).unwrap(), vec![first, last]);
    assert_eq!(repo.list_instants(next).unwrap(), vec![following]);
}

pub fn empty_key_fields_rejected(repo: &dyn Repository) {
    let err = repo.upsert(now(), "", "processes", &processes()).unwrap_err();
    assert!(matches!(err, Error::InvalidKey { field: "hostname" }));

    let err = repo.upsert(now(), "host1", "", &processes()).unwrap_err();
    assert!(matches!(err, Error::InvalidKey { field: "title" }));

    assert!(repo.list_days().unwrap().is_empty());
}

pub fn table_with_empty_row_is_refused(repo: &dyn Repository) {
    let table = Table::new(vec![vec!["pid".to_string()], Vec::new()]);
    let err = repo.upsert(now(), "host1", "processes", &table).unwrap_err();
    assert!(matches!(err, Error::Encode(_)));
    assert!(repo.get(now(), "host1", "processes").unwrap().is_none());
}
