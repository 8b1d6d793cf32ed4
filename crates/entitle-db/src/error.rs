//! Database-specific error types and conversions.

use entitle_core::error::EntitleError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Stored data could not be decoded: {0}")]
    Decode(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for EntitleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EntitleError::NotFound { entity, id },
            other => EntitleError::Database(other.to_string()),
        }
    }
}
