use thiserror::Error;

use crate::query::Entity;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fetch of {entity} rows failed: {message}")]
    Fetch { entity: Entity, message: String },

    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// True when the error came from the record store rather than from the
    /// caller's request. Report generation aborts either way.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Fetch { .. })
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
