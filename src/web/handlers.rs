use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::error::ApiError;
use super::AppState;
use crate::calendar;
use crate::pages::{DaysPage, HostsPage, InstantsPage, SnapshotPage, UpsertReceipt};
use crate::service::SnapshotService;

/// Run a synchronous facade call on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&SnapshotService) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_days(State(state): State<Arc<AppState>>) -> Result<Json<DaysPage>, ApiError> {
    tracing::debug!("handling /");
    let days = run_blocking(&state, |service| service.list_days()).await?;
    Ok(Json(DaysPage::new(&days)))
}

pub async fn list_times(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<InstantsPage>, ApiError> {
    tracing::debug!("handling /{date}/");
    let day = calendar::parse_day(&date)?;
    let instants = run_blocking(&state, move |service| service.list_instants(day)).await?;
    Ok(Json(InstantsPage::new(day, &instants)))
}

pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Path((date, time)): Path<(String, String)>,
) -> Result<Json<HostsPage>, ApiError> {
    tracing::debug!("handling /{date}/{time}/");
    let timestamp = calendar::parse_instant(&date, &time)?;
    let hosts = run_blocking(&state, move |service| service.list_hosts(timestamp)).await?;
    Ok(Json(HostsPage::new(timestamp, hosts)))
}

pub async fn view_snapshot(
    State(state): State<Arc<AppState>>,
    Path((date, time, hostname, title)): Path<(String, String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SnapshotPage>, ApiError> {
    tracing::debug!("handling GET /{date}/{time}/{hostname}/{title}/");
    let timestamp = calendar::parse_instant(&date, &time)?;
    let sort = params.get("sort").cloned();
    // presence alone turns it on: ?sort=pid&reverse
    let reverse = params.contains_key("reverse");

    let view = run_blocking(&state, move |service| {
        service.view(timestamp, &hostname, &title, sort.as_deref(), reverse)
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(Json(SnapshotPage::new(view, reverse)))
}

pub async fn put_snapshot(
    State(state): State<Arc<AppState>>,
    Path((date, time, hostname, title)): Path<(String, String, String, String)>,
    body: String,
) -> Result<(StatusCode, Json<UpsertReceipt>), ApiError> {
    tracing::debug!("handling PUT /{date}/{time}/{hostname}/{title}/");
    let timestamp = calendar::parse_instant(&date, &time)?;

    let outcome = run_blocking(&state, move |service| {
        service.submit(timestamp, &hostname, &title, &body)
    })
    .await?;

    let status = match outcome {
        crate::store::UpsertOutcome::Inserted(_) => StatusCode::CREATED,
        crate::store::UpsertOutcome::Overwritten(_) => StatusCode::OK,
    };
    Ok((status, Json(UpsertReceipt::from(outcome))))
}
