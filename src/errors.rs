use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures of one fetch against an external source. Every variant is
/// treated the same by the refresh loop: log it and wait for the next tick.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered {status}")]
    Status { status: u16, url: String },
    #[error("unexpected response envelope: {0}")]
    Envelope(String),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("query failed: {0}")]
    Query(String),
    #[error("no valid data found in the response")]
    NoData,
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown source kind {0:?}, expected gviz, values or static")]
    UnknownSource(String),
    #[error("{0} must be set for the selected source")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
