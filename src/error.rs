use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied table text does not parse.
    #[error("malformed table: {0}")]
    MalformedInput(String),

    #[error("invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("{field} must not be empty")]
    InvalidKey { field: &'static str },

    /// A table built in code that has no CSV form.
    #[error("cannot encode table: {0}")]
    Encode(String),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// More than one live snapshot shares a natural key.
    #[error(
        "found {count} snapshots for timestamp={timestamp}, hostname={hostname}, title={title}"
    )]
    Consistency {
        timestamp: i64,
        hostname: String,
        title: String,
        count: usize,
    },
}

impl Error {
    pub fn invalid_timestamp(input: impl Into<String>, reason: impl ToString) -> Self {
        Error::InvalidTimestamp {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Failures caused by what the caller sent rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput(_) | Error::InvalidTimestamp { .. } | Error::InvalidKey { .. }
        )
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::MalformedInput(err.to_string())
    }
}
