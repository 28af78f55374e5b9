use thiserror::Error;
use uuid::Uuid;

/// Per-article failures. None of these abort a batch.
#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Article {0} not found")]
    ArticleNotFound(Uuid),

    #[error("Failed to load article {id}: {message}")]
    Load { id: Uuid, message: String },

    #[error("Failed to persist location for article {id}: {message}")]
    Persistence { id: Uuid, message: String },

    #[error("Article {0} is already being processed")]
    AlreadyInFlight(Uuid),
}

impl LocatorError {
    pub fn article_id(&self) -> Uuid {
        match self {
            LocatorError::ArticleNotFound(id) | LocatorError::AlreadyInFlight(id) => *id,
            LocatorError::Load { id, .. } | LocatorError::Persistence { id, .. } => *id,
        }
    }
}
