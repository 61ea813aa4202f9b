use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

use crate::domain::ValidationError;
use crate::providers::ProviderError;

/// Server error code MongoDB reports for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<mongodb::bson::de::Error> for CoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for CoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// Detects code 11000 on single writes and on unordered bulk inserts.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()
            .is_some_and(|errors| {
                !errors.is_empty()
                    && errors.iter().all(|e| e.code == DUPLICATE_KEY_CODE)
            }),
        ErrorKind::Command(command_error) => {
            command_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
