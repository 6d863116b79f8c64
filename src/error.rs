#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Missing or expired token. Surfaced as a "log in again" notice; never
    /// retried silently.
    #[error("authentication required")]
    Auth,
    #[error("not found")]
    NotFound,
    /// Client-side validation failure; the request is never sent.
    #[error("content must not be empty")]
    EmptyContent,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Maps a non-success HTTP status to the client taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ApiError::Auth,
            404 => ApiError::NotFound,
            other => ApiError::Status(other),
        }
    }
}
