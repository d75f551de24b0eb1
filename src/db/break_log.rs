use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::{format_date, format_datetime};
use crate::libs::rules::{duration_minutes, over_limit_excess};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const INSERT: &str = "INSERT INTO break_log (user_id, email, session_id, break_type, date, start_time, limit_minutes, status, in_window)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'Active', ?8)";
const CLOSE: &str = "UPDATE break_log SET end_time = ?2, duration_minutes = ?3, status = 'Completed', is_over_limit = ?4
    WHERE id = ?1 AND end_time IS NULL";
const SELECT_COLUMNS: &str = "SELECT id, user_id, email, session_id, break_type, date, start_time, end_time, duration_minutes,
    limit_minutes, status, is_over_limit, in_window FROM break_log";
const COUNT_FOR_DAY: &str = "SELECT COUNT(*) FROM break_log WHERE user_id = ?1 AND lower(break_type) = lower(?2) AND date = ?3";
const USAGE_FOR_DAY: &str = "SELECT break_type, COUNT(*), COALESCE(SUM(duration_minutes), 0) FROM break_log
    WHERE user_id = ?1 AND date = ?2 GROUP BY break_type ORDER BY MIN(start_time)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakStatus {
    Active,
    Completed,
}

impl BreakStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakStatus::Active => "Active",
            BreakStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakRecord {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub session_id: Option<String>,
    pub break_type: String,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
    pub limit_minutes: Option<i64>,
    pub status: BreakStatus,
    pub is_over_limit: bool,
    pub in_window: bool,
}

impl BreakRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get(10)?;
        Ok(BreakRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            session_id: row.get(3)?,
            break_type: row.get(4)?,
            date: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            duration_minutes: row.get(8)?,
            limit_minutes: row.get(9)?,
            status: if status == "Active" { BreakStatus::Active } else { BreakStatus::Completed },
            is_over_limit: row.get(11)?,
            in_window: row.get(12)?,
        })
    }

    /// Minutes beyond the limit for a closed over-limit break.
    pub fn excess_minutes(&self) -> Option<i64> {
        match (self.is_over_limit, self.duration_minutes, self.limit_minutes) {
            (true, Some(duration), Some(limit)) => Some(duration - limit),
            _ => None,
        }
    }
}

/// A break about to be opened.
#[derive(Debug, Clone)]
pub struct NewBreak<'s> {
    pub user_id: i64,
    pub email: &'s str,
    pub session_id: Option<&'s str>,
    pub break_type: &'s str,
    pub start_time: NaiveDateTime,
    pub limit_minutes: Option<i64>,
    pub in_window: bool,
}

/// Per-type usage for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakUsage {
    pub break_type: String,
    pub count: i64,
    pub minutes: i64,
}

pub struct BreakLog<'a> {
    conn: &'a Connection,
}

impl<'a> BreakLog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        BreakLog { conn }
    }

    /// Opens a break; a user may only have one active break at a time.
    pub fn start(&self, new: &NewBreak) -> TrackerResult<BreakRecord> {
        if self.active_for_user(new.user_id)?.is_some() {
            return Err(TrackerError::BreakAlreadyActive(new.email.to_string()));
        }
        self.conn.execute(
            INSERT,
            params![
                new.user_id,
                new.email,
                new.session_id,
                new.break_type.trim(),
                format_date(&new.start_time.date()),
                format_datetime(&new.start_time),
                new.limit_minutes,
                new.in_window
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get(id)?.ok_or(TrackerError::BreakNotFound(id))
    }

    /// Closes a break, storing its rounded duration and over-limit flag.
    ///
    /// Once closed, the end time, duration and status never change.
    pub fn close(&self, id: i64, end_time: NaiveDateTime, grace_minutes: i64) -> TrackerResult<BreakRecord> {
        let record = self.get(id)?.ok_or(TrackerError::BreakNotFound(id))?;
        if record.end_time.is_some() {
            return Err(TrackerError::BreakAlreadyClosed(id));
        }
        let minutes = duration_minutes(record.start_time, end_time)?;
        let over_limit = record
            .limit_minutes
            .and_then(|limit| over_limit_excess(minutes, limit, grace_minutes))
            .is_some();

        let updated = self.conn.execute(CLOSE, params![id, format_datetime(&end_time), minutes, over_limit])?;
        if updated == 0 {
            return Err(TrackerError::BreakAlreadyClosed(id));
        }
        self.get(id)?.ok_or(TrackerError::BreakNotFound(id))
    }

    pub fn get(&self, id: i64) -> TrackerResult<Option<BreakRecord>> {
        let record = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], BreakRecord::from_row)
            .optional()?;
        Ok(record)
    }

    pub fn active_for_user(&self, user_id: i64) -> TrackerResult<Option<BreakRecord>> {
        let record = self
            .conn
            .query_row(&format!("{} WHERE user_id = ?1 AND status = 'Active'", SELECT_COLUMNS), [user_id], BreakRecord::from_row)
            .optional()?;
        Ok(record)
    }

    /// Every currently open break, read from the `active_breaks` view.
    pub fn list_active(&self) -> TrackerResult<Vec<BreakRecord>> {
        let sql = SELECT_COLUMNS.replace("FROM break_log", "FROM active_breaks") + " ORDER BY start_time";
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt.query_map([], BreakRecord::from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Breaks of one type started on `date`, including an open one.
    pub fn count_for_day(&self, user_id: i64, break_type: &str, date: NaiveDate) -> TrackerResult<i64> {
        let count = self
            .conn
            .query_row(COUNT_FOR_DAY, params![user_id, break_type.trim(), format_date(&date)], |row| row.get(0))?;
        Ok(count)
    }

    pub fn usage_for_day(&self, user_id: i64, date: NaiveDate) -> TrackerResult<Vec<BreakUsage>> {
        let mut stmt = self.conn.prepare(USAGE_FOR_DAY)?;
        let usage = stmt
            .query_map(params![user_id, format_date(&date)], |row| {
                Ok(BreakUsage {
                    break_type: row.get(0)?,
                    count: row.get(1)?,
                    minutes: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(usage)
    }

    /// Breaks started on `date`, for everybody or for one user.
    pub fn list_for_date(&self, date: NaiveDate, email: Option<&str>) -> TrackerResult<Vec<BreakRecord>> {
        let date = format_date(&date);
        let records = match email {
            Some(email) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{} WHERE date = ?1 AND email = ?2 ORDER BY start_time", SELECT_COLUMNS))?;
                let rows = stmt
                    .query_map(params![date, email.trim().to_lowercase()], BreakRecord::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{} WHERE date = ?1 ORDER BY start_time", SELECT_COLUMNS))?;
                let rows = stmt.query_map([date], BreakRecord::from_row)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(records)
    }
}
