use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{ParseCentsError, PlanError, ProjectionError};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed record fields, on append or when reading the ledger back.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad parameters for a computation, such as a non-positive payment.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, AppError::Io { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Io { path, source } => AppError::Io { path, source },
            invalid @ (StoreError::InvalidRecord(_) | StoreError::MalformedRow { .. }) => {
                AppError::Validation(invalid.to_string())
            }
        }
    }
}

impl From<ParseCentsError> for AppError {
    fn from(error: ParseCentsError) -> Self {
        AppError::Validation(format!("Invalid amount: {}", error))
    }
}

impl From<ProjectionError> for AppError {
    fn from(error: ProjectionError) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}

impl From<PlanError> for AppError {
    fn from(error: PlanError) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}
