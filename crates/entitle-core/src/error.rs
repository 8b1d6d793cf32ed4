//! Error types for the Entitle system.
//!
//! These cover infrastructure and validation faults only. Expected
//! business-rule denials are values of [`crate::denial::DenyReason`]
//! and never travel through this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntitleError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EntitleResult<T> = Result<T, EntitleError>;
