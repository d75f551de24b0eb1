use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::{format_date, format_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const INSERT: &str = "INSERT INTO violations (user_id, email, session_id, break_id, violation_type, severity, break_type,
    expected_duration, actual_duration, excess_minutes, timestamp, date, details)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";
const SELECT_COLUMNS: &str = "SELECT id, user_id, email, session_id, break_id, violation_type, severity, break_type,
    expected_duration, actual_duration, excess_minutes, timestamp, date, details FROM violations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    OverLimit,
    QuotaExceeded,
    OutOfWindow,
    NoSchedule,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::OverLimit => "OVER_LIMIT",
            ViolationKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ViolationKind::OutOfWindow => "OUT_OF_WINDOW",
            ViolationKind::NoSchedule => "NO_SCHEDULE",
        }
    }

    /// Severity each kind is recorded with.
    pub fn severity(&self) -> Severity {
        match self {
            ViolationKind::OverLimit | ViolationKind::QuotaExceeded => Severity::Critical,
            ViolationKind::NoSchedule => Severity::Warning,
            ViolationKind::OutOfWindow => Severity::Info,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "OVER_LIMIT" => Ok(ViolationKind::OverLimit),
            "QUOTA_EXCEEDED" => Ok(ViolationKind::QuotaExceeded),
            "OUT_OF_WINDOW" => Ok(ViolationKind::OutOfWindow),
            "NO_SCHEDULE" => Ok(ViolationKind::NoSchedule),
            other => Err(TrackerError::InvalidInput(format!("unknown violation type {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(TrackerError::InvalidInput(format!("unknown severity {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub id: i64,
    pub user_id: Option<i64>,
    pub email: String,
    pub session_id: Option<String>,
    pub break_id: Option<i64>,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub break_type: Option<String>,
    pub expected_duration: Option<i64>,
    pub actual_duration: Option<i64>,
    pub excess_minutes: Option<i64>,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub details: Option<String>,
}

fn parse_column<T: FromStr<Err = TrackerError>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: TrackerError| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

impl Violation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Violation {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            session_id: row.get(3)?,
            break_id: row.get(4)?,
            kind: parse_column(row, 5)?,
            severity: parse_column(row, 6)?,
            break_type: row.get(7)?,
            expected_duration: row.get(8)?,
            actual_duration: row.get(9)?,
            excess_minutes: row.get(10)?,
            timestamp: row.get(11)?,
            date: row.get(12)?,
            details: row.get(13)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewViolation {
    pub user_id: Option<i64>,
    pub email: String,
    pub session_id: Option<String>,
    pub break_id: Option<i64>,
    pub kind: ViolationKind,
    pub break_type: Option<String>,
    pub expected_duration: Option<i64>,
    pub actual_duration: Option<i64>,
    pub excess_minutes: Option<i64>,
    pub timestamp: NaiveDateTime,
    pub details: Option<String>,
}

impl NewViolation {
    pub fn new(kind: ViolationKind, email: &str, timestamp: NaiveDateTime) -> Self {
        NewViolation {
            user_id: None,
            email: email.to_string(),
            session_id: None,
            break_id: None,
            kind,
            break_type: None,
            expected_duration: None,
            actual_duration: None,
            excess_minutes: None,
            timestamp,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViolationFilter {
    pub email: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<ViolationKind>,
}

pub struct Violations<'a> {
    conn: &'a Connection,
}

impl<'a> Violations<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Violations { conn }
    }

    /// Records a violation; severity follows from the kind.
    ///
    /// A second `OVER_LIMIT` row for the same break is rejected by the
    /// `idx_violations_one_over_limit` unique index.
    pub fn insert(&self, violation: &NewViolation) -> TrackerResult<i64> {
        self.conn.execute(
            INSERT,
            params![
                violation.user_id,
                violation.email,
                violation.session_id,
                violation.break_id,
                violation.kind.as_str(),
                violation.kind.severity().as_str(),
                violation.break_type,
                violation.expected_duration,
                violation.actual_duration,
                violation.excess_minutes,
                format_datetime(&violation.timestamp),
                format_date(&violation.timestamp.date()),
                violation.details
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, kind = violation.kind.as_str(), email = %violation.email, "violation recorded");
        Ok(id)
    }

    pub fn list(&self, filter: &ViolationFilter) -> TrackerResult<Vec<Violation>> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(email) = &filter.email {
            values.push(Value::Text(email.trim().to_lowercase()));
            clauses.push(format!("email = ?{}", values.len()));
        }
        if let Some(from) = &filter.from {
            values.push(Value::Text(format_date(from)));
            clauses.push(format!("date >= ?{}", values.len()));
        }
        if let Some(to) = &filter.to {
            values.push(Value::Text(format_date(to)));
            clauses.push(format!("date <= ?{}", values.len()));
        }
        if let Some(kind) = &filter.kind {
            values.push(Value::Text(kind.as_str().to_string()));
            clauses.push(format!("violation_type = ?{}", values.len()));
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let violations = stmt
            .query_map(params_from_iter(values), Violation::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(violations)
    }

    pub fn for_break(&self, break_id: i64) -> TrackerResult<Vec<Violation>> {
        let mut stmt = self.conn.prepare(&format!("{} WHERE break_id = ?1 ORDER BY id", SELECT_COLUMNS))?;
        let violations = stmt.query_map([break_id], Violation::from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_by_kind() {
        assert_eq!(ViolationKind::OverLimit.severity(), Severity::Critical);
        assert_eq!(ViolationKind::QuotaExceeded.severity(), Severity::Critical);
        assert_eq!(ViolationKind::NoSchedule.severity(), Severity::Warning);
        assert_eq!(ViolationKind::OutOfWindow.severity(), Severity::Info);
    }

    #[test]
    fn parses_kind_loosely() {
        assert_eq!("over-limit".parse::<ViolationKind>().unwrap(), ViolationKind::OverLimit);
        assert_eq!("no_schedule".parse::<ViolationKind>().unwrap(), ViolationKind::NoSchedule);
        assert!("late".parse::<ViolationKind>().is_err());
    }
}
