//! HTTP surface.
//!
//! | Method | Path                                  | Operation                  |
//! |--------|---------------------------------------|----------------------------|
//! | GET    | `/`                                   | list days                  |
//! | GET    | `/{date}/`                            | list times on a day        |
//! | GET    | `/{date}/{time}/`                     | hosts and titles at a time |
//! | GET    | `/{date}/{time}/{hostname}/{title}/`  | view, `?sort=col&reverse`  |
//! | PUT    | `/{date}/{time}/{hostname}/{title}/`  | store CSV body             |

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::service::SnapshotService;

pub struct AppState {
    pub service: Arc<SnapshotService>,
}

impl AppState {
    pub fn new(service: SnapshotService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::list_days))
        .route("/health", get(handlers::health))
        .route("/{date}/", get(handlers::list_times))
        .route("/{date}/{time}/", get(handlers::list_snapshots))
        .route(
            "/{date}/{time}/{hostname}/{title}/",
            get(handlers::view_snapshot).put(handlers::put_snapshot),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listen: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
