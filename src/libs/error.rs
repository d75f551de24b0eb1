//! Domain error type shared by the repositories and the break tracker.
//!
//! Repositories return `Result<T, TrackerError>`; command handlers convert
//! into `anyhow::Error` at the edge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    // ---------------------------
    // Storage
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Users
    // ---------------------------
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User is deactivated: {0}")]
    UserInactive(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    // ---------------------------
    // Sessions
    // ---------------------------
    #[error("User {0} already has an active session")]
    SessionAlreadyOpen(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} is already closed")]
    SessionAlreadyClosed(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    // ---------------------------
    // Schedules and breaks
    // ---------------------------
    #[error("Break schedule not found: {0}")]
    ScheduleNotFound(i64),

    #[error("Break schedule '{0}' has no limit for break type '{1}'")]
    BreakTypeNotInSchedule(String, String),

    #[error("No break schedule assigned to {0}")]
    NoScheduleAssigned(String),

    #[error("User {0} already has an active break")]
    BreakAlreadyActive(String),

    #[error("No active break for {0}")]
    NoActiveBreak(String),

    #[error("Break {0} is already closed")]
    BreakAlreadyClosed(i64),

    #[error("Break not found: {0}")]
    BreakNotFound(i64),

    // ---------------------------
    // Input validation
    // ---------------------------
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("End time {end} is before start time {start}")]
    NegativeSpan { start: String, end: String },

    #[error("Invalid value: {0}")]
    InvalidInput(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
