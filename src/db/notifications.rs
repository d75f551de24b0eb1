use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::format_datetime;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const SELECT_LAST_SENT: &str = "SELECT last_sent_utc FROM rule_last_sent WHERE rule_id = ?1 AND email = ?2 AND context = ?3";
const UPSERT_LAST_SENT: &str = "INSERT INTO rule_last_sent (rule_id, email, context, last_sent_utc) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(rule_id, email, context) DO UPDATE SET last_sent_utc = excluded.last_sent_utc";
const INSERT_APP_LOG: &str = "INSERT INTO app_logs (ts, level, message) VALUES (?1, ?2, ?3)";
const SELECT_APP_LOGS: &str = "SELECT id, ts, level, message FROM app_logs ORDER BY ts DESC, id DESC LIMIT ?1";

/// Shortest gap between two notifications for the same rule and recipient.
pub const MIN_COOLDOWN_SECS: i64 = 1;

/// Last-sent bookkeeping for notification rules.
///
/// Keyed by `(rule_id, email, context)`; a rule that is not user-specific
/// uses an empty email, one without context an empty context.
pub struct RuleLastSent<'a> {
    conn: &'a Connection,
}

impl<'a> RuleLastSent<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        RuleLastSent { conn }
    }

    pub fn last_sent(&self, rule_id: &str, email: &str, context: &str) -> TrackerResult<Option<DateTime<Utc>>> {
        let value: Option<NaiveDateTime> = self
            .conn
            .query_row(SELECT_LAST_SENT, params![rule_id, email.trim().to_lowercase(), context], |row| row.get(0))
            .optional()?;
        Ok(value.map(|v| v.and_utc()))
    }

    /// True when nothing was sent yet or the cooldown (at least one second) has passed.
    pub fn should_send(&self, rule_id: &str, email: &str, context: &str, cooldown_secs: i64, now: DateTime<Utc>) -> TrackerResult<bool> {
        let cooldown = Duration::try_seconds(cooldown_secs.max(MIN_COOLDOWN_SECS))
            .ok_or_else(|| TrackerError::InvalidInput(format!("cooldown of {} seconds is out of range", cooldown_secs)))?;
        Ok(match self.last_sent(rule_id, email, context)? {
            Some(last) => now.signed_duration_since(last) >= cooldown,
            None => true,
        })
    }

    pub fn touch(&self, rule_id: &str, email: &str, context: &str, now: DateTime<Utc>) -> TrackerResult<()> {
        self.conn.execute(
            UPSERT_LAST_SENT,
            params![rule_id, email.trim().to_lowercase(), context, format_datetime(&now.naive_utc())],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(TrackerError::InvalidInput(format!("unknown log level {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppLogEntry {
    pub id: i64,
    pub ts: NaiveDateTime,
    pub level: String,
    pub message: String,
}

pub struct AppLogs<'a> {
    conn: &'a Connection,
}

impl<'a> AppLogs<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        AppLogs { conn }
    }

    pub fn write(&self, level: LogLevel, message: &str) -> TrackerResult<i64> {
        self.conn.execute(
            INSERT_APP_LOG,
            params![format_datetime(&Local::now().naive_local()), level.as_str(), message],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest entries first.
    pub fn recent(&self, limit: usize) -> TrackerResult<Vec<AppLogEntry>> {
        let mut stmt = self.conn.prepare(SELECT_APP_LOGS)?;
        let entries = stmt
            .query_map([limit as i64], |row| {
                Ok(AppLogEntry {
                    id: row.get(0)?,
                    ts: row.get(1)?,
                    level: row.get(2)?,
                    message: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
