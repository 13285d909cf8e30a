//! Shared error types for the pipeline orchestration system

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Unknown worker: {input}")]
    UnknownWorker { input: String },

    #[error("Unknown worker status: {input}")]
    UnknownStatus { input: String },

    #[error("Invalid extra data: {message}")]
    InvalidExtraData { message: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
