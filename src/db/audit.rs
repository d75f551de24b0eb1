//! Append-only trail of administrative actions.
//!
//! Rows are only ever inserted; the `audit_log_no_update` and
//! `audit_log_no_delete` triggers reject everything else. Writing an entry
//! never fails the action being audited: errors are reported and swallowed.

use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::format_datetime;
use crate::libs::messages::Message;
use crate::msg_warning;
use chrono::{Duration, Local, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;

const INSERT: &str = "INSERT INTO audit_log (timestamp, admin_email, action, entity_type, entity_id, before_state, after_state,
    hostname, success, error_message) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
const SELECT_COLUMNS: &str = "SELECT id, timestamp, admin_email, action, entity_type, entity_id, before_state, after_state,
    hostname, success, error_message FROM audit_log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Import,
    Assign,
    Unassign,
    ForceLogout,
    Export,
    ConfigChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Import => "IMPORT",
            AuditAction::Assign => "ASSIGN",
            AuditAction::Unassign => "UNASSIGN",
            AuditAction::ForceLogout => "FORCE_LOGOUT",
            AuditAction::Export => "EXPORT",
            AuditAction::ConfigChange => "CONFIG_CHANGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    Session,
    Schedule,
    Assignment,
    Violation,
    Config,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "USER",
            EntityType::Session => "SESSION",
            EntityType::Schedule => "SCHEDULE",
            EntityType::Assignment => "ASSIGNMENT",
            EntityType::Violation => "VIOLATION",
            EntityType::Config => "CONFIG",
        }
    }
}

/// One action to record.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        AuditRecord {
            action,
            entity_type,
            entity_id: Some(entity_id.into()),
            before_state: None,
            after_state: None,
            success: true,
            error_message: None,
        }
    }

    pub fn before<T: Serialize>(mut self, state: &T) -> Self {
        self.before_state = serde_json::to_value(state).ok();
        self
    }

    pub fn after<T: Serialize>(mut self, state: &T) -> Self {
        self.after_state = serde_json::to_value(state).ok();
        self
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.success = false;
        self.error_message = Some(error.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub admin_email: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub hostname: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

fn json_column(row: &Row, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

impl AuditEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AuditEntry {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            admin_email: row.get(2)?,
            action: row.get(3)?,
            entity_type: row.get(4)?,
            entity_id: row.get(5)?,
            before_state: json_column(row, 6)?,
            after_state: json_column(row, 7)?,
            hostname: row.get(8)?,
            success: row.get(9)?,
            error_message: row.get(10)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditStats {
    pub total: i64,
    pub by_action: BTreeMap<String, i64>,
    pub by_entity_type: BTreeMap<String, i64>,
}

fn hostname() -> Option<String> {
    env::var("HOSTNAME").or_else(|_| env::var("COMPUTERNAME")).ok().filter(|h| !h.is_empty())
}

pub struct AuditLog<'a> {
    conn: &'a Connection,
    admin_email: String,
}

impl<'a> AuditLog<'a> {
    pub fn new(conn: &'a Connection, admin_email: &str) -> Self {
        AuditLog {
            conn,
            admin_email: admin_email.trim().to_lowercase(),
        }
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Appends an entry, returning its id, or `None` when the write failed.
    pub fn log_action(&self, record: &AuditRecord) -> Option<i64> {
        match self.insert(record) {
            Ok(id) => {
                tracing::debug!(
                    id,
                    action = record.action.as_str(),
                    entity = record.entity_type.as_str(),
                    "audit entry written"
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!("failed to write audit entry: {}", e);
                msg_warning!(Message::AuditWriteFailed(e.to_string()));
                None
            }
        }
    }

    fn insert(&self, record: &AuditRecord) -> TrackerResult<i64> {
        let before = record.before_state.as_ref().map(serde_json::to_string).transpose()?;
        let after = record.after_state.as_ref().map(serde_json::to_string).transpose()?;
        self.conn.execute(
            INSERT,
            params![
                format_datetime(&Local::now().naive_local()),
                self.admin_email,
                record.action.as_str(),
                record.entity_type.as_str(),
                record.entity_id,
                before,
                after,
                hostname(),
                record.success,
                record.error_message
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Changes to one entity, newest first.
    pub fn entity_history(&self, entity_type: &str, entity_id: &str, limit: usize) -> TrackerResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY timestamp DESC, id DESC LIMIT ?3",
            SELECT_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![entity_type.to_uppercase(), entity_id, limit as i64], AuditEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Entries by any administrator in the last `hours` hours, newest first.
    pub fn recent(&self, hours: i64, limit: usize) -> TrackerResult<Vec<AuditEntry>> {
        let since = Duration::try_hours(hours)
            .and_then(|span| Local::now().naive_local().checked_sub_signed(span))
            .ok_or_else(|| TrackerError::InvalidInput(format!("{} hours is out of range", hours)))?;
        self.query(None, Some(since), None, limit)
    }

    /// Entries by one administrator, newest first.
    pub fn by_admin(&self, admin_email: &str, limit: usize) -> TrackerResult<Vec<AuditEntry>> {
        self.query(Some(admin_email), None, None, limit)
    }

    fn query(
        &self,
        admin_email: Option<&str>,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
        limit: usize,
    ) -> TrackerResult<Vec<AuditEntry>> {
        let (where_sql, mut values) = Self::filter(admin_email, from, to);
        values.push(Value::Integer(limit as i64));
        let sql = format!(
            "{}{} ORDER BY timestamp DESC, id DESC LIMIT ?{}",
            SELECT_COLUMNS,
            where_sql,
            values.len()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), AuditEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Counts per action and per entity type over an optional time range.
    pub fn statistics(&self, from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> TrackerResult<AuditStats> {
        let (where_sql, values) = Self::filter(None, from, to);
        let sql = format!(
            "SELECT action, entity_type, COUNT(*) FROM audit_log{} GROUP BY action, entity_type",
            where_sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = AuditStats::default();
        for (action, entity_type, count) in rows {
            stats.total += count;
            *stats.by_action.entry(action).or_insert(0) += count;
            *stats.by_entity_type.entry(entity_type).or_insert(0) += count;
        }
        Ok(stats)
    }

    fn filter(admin_email: Option<&str>, from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(admin) = admin_email {
            values.push(Value::Text(admin.trim().to_lowercase()));
            clauses.push(format!("admin_email = ?{}", values.len()));
        }
        if let Some(from) = from {
            values.push(Value::Text(format_datetime(&from)));
            clauses.push(format!("timestamp >= ?{}", values.len()));
        }
        if let Some(to) = to {
            values.push(Value::Text(format_datetime(&to)));
            clauses.push(format!("timestamp <= ?{}", values.len()));
        }
        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}
