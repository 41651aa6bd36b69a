use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Gesture conflict: {0}")]
    GestureConflict(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PlannerError {
    /// Storage-side failures: surfaced to the user, never retried by the core.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::Sqlite(_) | Self::Http(_) | Self::Io(_)
        )
    }
}
