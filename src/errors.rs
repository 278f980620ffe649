//! Unified application error type.
//! All modules (db, core, ai, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid month format: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Invalid place category: {0}")]
    InvalidCategory(String),

    // ---------------------------
    // Visit logic errors
    // ---------------------------
    #[error("Place #{0} not found")]
    PlaceNotFound(i64),

    #[error("Place #{0} still has recorded visits")]
    PlaceInUse(i64),

    #[error("Visit #{0} not found")]
    VisitNotFound(i64),

    #[error("A visit at place #{0} is already open")]
    VisitAlreadyOpen(i64),

    #[error("No open visit at place #{0}")]
    NoOpenVisit(i64),

    #[error("Exit time {exit} is before entry time {entry}")]
    ExitBeforeEntry { entry: String, exit: String },

    #[error("{0}")]
    Merge(#[from] MergeError),

    // ---------------------------
    // Text generation
    // ---------------------------
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Text generation failed: {0}")]
    Generation(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

/// Validation failures of a merge request. The messages are shown to the
/// user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Select exactly two visits to merge.")]
    WrongSelection(usize),

    #[error("You can only merge visits at the same location.")]
    DifferentPlaces,
}

pub type AppResult<T> = Result<T, AppError>;
