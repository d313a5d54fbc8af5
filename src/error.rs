//! Error types shared across the store, scheduler, composer and importer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the post store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to serialize store")]
    Json(#[from] serde_json::Error),

    /// Another writer saved the store after we loaded it
    #[error("store changed on disk (loaded revision {expected}, found {found}); reload and retry")]
    Conflict { expected: u64, found: u64 },

    #[error("no {kind} with id `{id}`")]
    NotFound { kind: &'static str, id: String },
}

/// Errors raised while turning a local date/time into a publish instant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("unknown timezone `{0}` (use an offset like -05:00 or an IANA name)")]
    InvalidZone(String),

    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid time `{0}` (expected HH:MM)")]
    InvalidTime(String),

    #[error("{0} does not exist in the site timezone")]
    NonexistentLocalTime(String),

    #[error("scheduled time {0} is not in the future")]
    InPast(String),
}

/// Errors raised by composer workflows
#[derive(Debug, Error)]
pub enum ComposeError {
    /// User-facing validation failure; nothing was changed
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot attach `{0}`: {1}")]
    Image(PathBuf, String),
}

/// Errors raised while importing legacy post collections
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized document: expected a date-keyed post map or {{\"posts\": [...]}}")]
    UnknownFormat,

    #[error("post `{id}` has an unreadable date `{date}`")]
    InvalidDate { id: String, date: String },
}
