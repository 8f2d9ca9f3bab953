//! Error types for the log store and session layer.
//!
//! Analytics never return these: missing data maps to sentinel values there.

use thiserror::Error;

use crate::log_store::ValidationError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("app is locked")]
    Locked,

    #[error("a vault already exists; unlock it or wipe it first")]
    AlreadySetup,

    #[error("invalid log: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("session state poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
