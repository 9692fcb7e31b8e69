//! Ingestion worker error types

use insurellm_common::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Malformed event: {message}")]
    Event { message: String },

    #[error(transparent)]
    App(#[from] AppError),
}
