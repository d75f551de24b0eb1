use crate::db::users::Users;
use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::{format_date, format_datetime};
use crate::libs::rules::duration_minutes;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const INSERT: &str = "INSERT INTO work_sessions (session_id, user_id, email, login_time, status, comment)
    VALUES (?1, ?2, ?3, ?4, 'active', ?5)";
const CLOSE: &str = "UPDATE work_sessions SET logout_time = ?2, duration_minutes = ?3, status = ?4, logout_reason = ?5
    WHERE session_id = ?1 AND logout_time IS NULL";
const SELECT_COLUMNS: &str = "SELECT id, session_id, user_id, email, login_time, logout_time, duration_minutes, status, logout_reason, comment
    FROM work_sessions";
const SELECT_ACTIVE_VIEW: &str = "SELECT id, session_id, user_id, email, login_time, logout_time, duration_minutes, status, logout_reason, comment, name
    FROM active_sessions ORDER BY login_time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    ForcedLogout,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::ForcedLogout => "forced_logout",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "forced_logout" => Ok(SessionStatus::ForcedLogout),
            other => Err(TrackerError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSession {
    pub id: i64,
    pub session_id: String,
    pub user_id: i64,
    pub email: String,
    pub login_time: NaiveDateTime,
    pub logout_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
    pub status: SessionStatus,
    pub logout_reason: Option<String>,
    pub comment: Option<String>,
}

impl WorkSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get(7)?;
        Ok(WorkSession {
            id: row.get(0)?,
            session_id: row.get(1)?,
            user_id: row.get(2)?,
            email: row.get(3)?,
            login_time: row.get(4)?,
            logout_time: row.get(5)?,
            duration_minutes: row.get(6)?,
            status: status
                .parse()
                .map_err(|e: TrackerError| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?,
            logout_reason: row.get(8)?,
            comment: row.get(9)?,
        })
    }

    pub fn is_open(&self) -> bool {
        self.logout_time.is_none()
    }
}

/// An open session together with the user's display name.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    pub session: WorkSession,
    pub name: String,
}

pub struct WorkSessions<'a> {
    conn: &'a Connection,
}

impl<'a> WorkSessions<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        WorkSessions { conn }
    }

    /// Opens a session for an active user who has no open session yet.
    pub fn start(&self, email: &str, session_id: &str, login_time: NaiveDateTime, comment: Option<&str>) -> TrackerResult<WorkSession> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(TrackerError::InvalidInput("empty session id".to_string()));
        }
        let user = Users::new(self.conn).require_active(email)?;
        if self.active_for(&user.email)?.is_some() {
            return Err(TrackerError::SessionAlreadyOpen(user.email));
        }

        self.conn.execute(
            INSERT,
            params![session_id, user.id, user.email, format_datetime(&login_time), comment],
        )?;
        tracing::debug!(session_id, email = %user.email, "session started");

        self.get(session_id)?.ok_or_else(|| TrackerError::SessionNotFound(session_id.to_string()))
    }

    /// Sets `logout_time`, the rounded duration and the final status.
    ///
    /// `logout_time` is written once; closing an already closed session fails.
    pub fn close(&self, session_id: &str, logout_time: NaiveDateTime, status: SessionStatus, reason: Option<&str>) -> TrackerResult<WorkSession> {
        if status == SessionStatus::Active {
            return Err(TrackerError::InvalidStatus(status.to_string()));
        }
        let session = self.get(session_id)?.ok_or_else(|| TrackerError::SessionNotFound(session_id.to_string()))?;
        if !session.is_open() {
            return Err(TrackerError::SessionAlreadyClosed(session.session_id));
        }
        let minutes = duration_minutes(session.login_time, logout_time)?;

        let updated = self.conn.execute(
            CLOSE,
            params![session.session_id, format_datetime(&logout_time), minutes, status.as_str(), reason],
        )?;
        if updated == 0 {
            return Err(TrackerError::SessionAlreadyClosed(session.session_id));
        }
        tracing::debug!(session_id, minutes, status = status.as_str(), "session closed");

        self.get(session_id)?.ok_or_else(|| TrackerError::SessionNotFound(session_id.to_string()))
    }

    pub fn get(&self, session_id: &str) -> TrackerResult<Option<WorkSession>> {
        let session = self
            .conn
            .query_row(&format!("{} WHERE session_id = ?1", SELECT_COLUMNS), [session_id], WorkSession::from_row)
            .optional()?;
        Ok(session)
    }

    pub fn active_for(&self, email: &str) -> TrackerResult<Option<WorkSession>> {
        let email = email.trim().to_lowercase();
        let session = self
            .conn
            .query_row(
                &format!("{} WHERE email = ?1 AND status = 'active' ORDER BY login_time DESC LIMIT 1", SELECT_COLUMNS),
                [&email],
                WorkSession::from_row,
            )
            .optional()?;
        Ok(session)
    }

    pub fn list_active(&self) -> TrackerResult<Vec<ActiveSession>> {
        let mut stmt = self.conn.prepare(SELECT_ACTIVE_VIEW)?;
        let sessions = stmt
            .query_map([], |row| {
                Ok(ActiveSession {
                    session: WorkSession::from_row(row)?,
                    name: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Sessions of one user that started on `date`, oldest first.
    pub fn list_for_user(&self, email: &str, date: NaiveDate) -> TrackerResult<Vec<WorkSession>> {
        let email = email.trim().to_lowercase();
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE email = ?1 AND date(login_time) = ?2 ORDER BY login_time",
            SELECT_COLUMNS
        ))?;
        let sessions = stmt
            .query_map(params![email, format_date(&date)], WorkSession::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [SessionStatus::Active, SessionStatus::Completed, SessionStatus::ForcedLogout] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!(matches!("closed".parse::<SessionStatus>(), Err(TrackerError::InvalidStatus(_))));
    }
}
