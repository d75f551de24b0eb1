//! Administrative mutations, each one recorded in the audit log.
//!
//! The audit entry is written after the mutation with the before/after
//! snapshots, or with the error when it failed. A failed audit write never
//! changes the result of the mutation.

use crate::db::assignments::{Assignment, Assignments};
use crate::db::audit::{AuditAction, AuditLog, AuditRecord, EntityType};
use crate::db::schedules::{BreakSchedule, BreakSchedules, NewSchedule};
use crate::db::sessions::{SessionStatus, WorkSessions};
use crate::db::users::{NewUser, User, Users};
use crate::libs::config::TrackingConfig;
use crate::libs::error::TrackerResult;
use crate::libs::tracker::{BreakTracker, SessionClose};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

pub struct Admin<'a> {
    conn: &'a Connection,
    audit: AuditLog<'a>,
    tracking: TrackingConfig,
}

impl<'a> Admin<'a> {
    pub fn new(conn: &'a Connection, admin_email: &str, tracking: TrackingConfig) -> Self {
        Admin {
            conn,
            audit: AuditLog::new(conn, admin_email),
            tracking,
        }
    }

    /// Writes the audit entry for `result` and hands the result back unchanged.
    fn audited<T: Serialize>(&self, record: AuditRecord, result: TrackerResult<T>) -> TrackerResult<T> {
        let record = match &result {
            Ok(value) => record.after(value),
            Err(e) => record.failed(e),
        };
        self.audit.log_action(&record);
        result
    }

    /// Creates or updates users. Stops at the first invalid row.
    pub fn import_users(&self, users: &[NewUser]) -> TrackerResult<Vec<User>> {
        let repo = Users::new(self.conn);
        let mut imported = Vec::with_capacity(users.len());
        for user in users {
            let before = repo.get_by_email(&user.email)?;
            let action = if before.is_some() { AuditAction::Update } else { AuditAction::Import };
            let mut record = AuditRecord::new(action, EntityType::User, user.email.trim().to_lowercase());
            if let Some(before) = &before {
                record = record.before(before);
            }
            imported.push(self.audited(record, repo.upsert(user))?);
        }
        Ok(imported)
    }

    pub fn deactivate_user(&self, email: &str) -> TrackerResult<User> {
        let repo = Users::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Update, EntityType::User, email.trim().to_lowercase());
        if let Some(before) = repo.get_by_email(email)? {
            record = record.before(&before);
        }
        self.audited(record, repo.deactivate(email))
    }

    pub fn reactivate_user(&self, email: &str) -> TrackerResult<User> {
        let repo = Users::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Update, EntityType::User, email.trim().to_lowercase());
        if let Some(before) = repo.get_by_email(email)? {
            record = record.before(&before);
        }
        self.audited(record, repo.reactivate(email))
    }

    pub fn create_schedule(&self, schedule: &NewSchedule) -> TrackerResult<BreakSchedule> {
        let result = BreakSchedules::new(self.conn).create(schedule);
        let entity_id = match &result {
            Ok(created) => created.id.to_string(),
            Err(_) => schedule.name.trim().to_string(),
        };
        self.audited(AuditRecord::new(AuditAction::Create, EntityType::Schedule, entity_id), result)
    }

    /// Rewrites a schedule in place; assignments stay attached.
    pub fn update_schedule(&self, id: i64, schedule: &NewSchedule) -> TrackerResult<BreakSchedule> {
        let repo = BreakSchedules::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Update, EntityType::Schedule, id.to_string());
        if let Some(before) = repo.get(id)? {
            record = record.before(&before);
        }
        self.audited(record, repo.update(id, schedule))
    }

    pub fn set_schedule_active(&self, id: i64, active: bool) -> TrackerResult<BreakSchedule> {
        let repo = BreakSchedules::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Update, EntityType::Schedule, id.to_string());
        if let Some(before) = repo.get(id)? {
            record = record.before(&before);
        }
        self.audited(record, repo.set_active(id, active))
    }

    /// Deletes a schedule; its limits, windows and assignments cascade.
    pub fn delete_schedule(&self, id: i64) -> TrackerResult<()> {
        let repo = BreakSchedules::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Delete, EntityType::Schedule, id.to_string());
        if let Some(before) = repo.get(id)? {
            record = record.before(&before);
        }
        self.audited(record, repo.delete(id))
    }

    pub fn assign_schedule(&self, email: &str, schedule_id: i64) -> TrackerResult<Assignment> {
        let repo = Assignments::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Assign, EntityType::Assignment, email.trim().to_lowercase());
        if let Some(before) = repo.active_for(email)? {
            record = record.before(&before);
        }
        self.audited(record, repo.assign(email, schedule_id, Some(self.audit.admin_email())))
    }

    pub fn unassign_schedule(&self, email: &str) -> TrackerResult<bool> {
        let repo = Assignments::new(self.conn);
        let mut record = AuditRecord::new(AuditAction::Unassign, EntityType::Assignment, email.trim().to_lowercase());
        if let Some(before) = repo.active_for(email)? {
            record = record.before(&before);
        }
        self.audited(record, repo.unassign(email))
    }

    /// Ends a user's open session as `forced_logout`, closing any open break.
    pub fn force_logout(&self, session_id: &str, at: NaiveDateTime, reason: Option<&str>) -> TrackerResult<SessionClose> {
        let mut record = AuditRecord::new(AuditAction::ForceLogout, EntityType::Session, session_id);
        if let Some(before) = WorkSessions::new(self.conn).get(session_id)? {
            record = record.before(&before);
        }
        let tracker = BreakTracker::new(self.conn, self.tracking.clone());
        let result = tracker.end_session(session_id, at, SessionStatus::ForcedLogout, reason);
        self.audited(record, result)
    }
}
