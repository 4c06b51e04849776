use thiserror::Error;
use validator::ValidationErrors;

use crate::store::{Collection, StoreError};

/// Errors surfaced by the console operations.
#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Document {collection}/{id} not found.")]
    NotFound { collection: Collection, id: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    AlreadyExists(String),

    /// Someone else changed the same documents first. Nothing was written; the request can be
    /// sent again.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Remote(StoreError),
}

impl CampusError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for CampusError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { collection, id } => Self::NotFound { collection, id },
            conflict @ StoreError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            other => Self::Remote(other),
        }
    }
}

/// Reports the first offending field, in alphabetical order so the message is stable.
impl From<ValidationErrors> for CampusError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().copied().collect();
        fields.sort_unstable();

        let Some(field) = fields.first() else {
            return Self::validation("input", "is invalid");
        };
        let message = field_errors[field]
            .first()
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .unwrap_or_else(|| "is invalid".to_owned());
        Self::validation(*field, message)
    }
}
