use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::Error;

/// Everything a handler can fail with, mapped to a status and a plain-text body.
#[derive(Debug)]
pub enum ApiError {
    Service(Error),
    NotFound,
    /// The blocking task running the request panicked or was cancelled.
    Task(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Service(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Service(err @ Error::InvalidTimestamp { .. }) => {
                format!("Failed to parse timestamp: {err}")
            }
            ApiError::Service(err) => err.to_string(),
            ApiError::NotFound => String::from("No such snapshot found"),
            ApiError::Task(reason) => format!("request failed: {reason}"),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{message}");
        } else {
            tracing::debug!(%status, "{message}");
        }

        (status, message).into_response()
    }
}
