use crate::db::schedules::BreakSchedules;
use crate::db::users::Users;
use crate::libs::error::{TrackerError, TrackerResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const DEACTIVATE_FOR_USER: &str = "UPDATE user_break_assignments SET is_active = 0 WHERE user_id = ?1 AND is_active = 1";
const INSERT: &str = "INSERT INTO user_break_assignments (user_id, schedule_id, assigned_by, is_active) VALUES (?1, ?2, ?3, 1)";
const SELECT_ACTIVE: &str = "SELECT a.id, a.user_id, u.email, a.schedule_id, s.name, a.assigned_by, a.assigned_at, a.is_active
    FROM user_break_assignments a
    JOIN users u ON u.id = a.user_id
    JOIN break_schedules s ON s.id = a.schedule_id
    WHERE a.is_active = 1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub schedule_id: i64,
    pub schedule_name: String,
    pub assigned_by: Option<String>,
    pub assigned_at: NaiveDateTime,
    pub is_active: bool,
}

impl Assignment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Assignment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            schedule_id: row.get(3)?,
            schedule_name: row.get(4)?,
            assigned_by: row.get(5)?,
            assigned_at: row.get(6)?,
            is_active: row.get(7)?,
        })
    }
}

pub struct Assignments<'a> {
    conn: &'a Connection,
}

impl<'a> Assignments<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Assignments { conn }
    }

    /// Makes `schedule_id` the user's only active schedule.
    ///
    /// The previous assignment is kept as history with `is_active = 0`.
    pub fn assign(&self, email: &str, schedule_id: i64, assigned_by: Option<&str>) -> TrackerResult<Assignment> {
        let user = Users::new(self.conn)
            .get_by_email(email)?
            .ok_or_else(|| TrackerError::UserNotFound(email.trim().to_lowercase()))?;
        if BreakSchedules::new(self.conn).get(schedule_id)?.is_none() {
            return Err(TrackerError::ScheduleNotFound(schedule_id));
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(DEACTIVATE_FOR_USER, [user.id])?;
        tx.execute(INSERT, params![user.id, schedule_id, assigned_by])?;
        tx.commit()?;
        tracing::debug!(email = %user.email, schedule_id, "schedule assigned");

        self.active_for(&user.email)?.ok_or(TrackerError::NoScheduleAssigned(user.email))
    }

    /// Deactivates the user's assignment; returns whether there was one.
    pub fn unassign(&self, email: &str) -> TrackerResult<bool> {
        let user = Users::new(self.conn)
            .get_by_email(email)?
            .ok_or_else(|| TrackerError::UserNotFound(email.trim().to_lowercase()))?;
        let updated = self.conn.execute(DEACTIVATE_FOR_USER, [user.id])?;
        Ok(updated > 0)
    }

    pub fn active_for(&self, email: &str) -> TrackerResult<Option<Assignment>> {
        let email = email.trim().to_lowercase();
        let assignment = self
            .conn
            .query_row(&format!("{} AND u.email = ?1", SELECT_ACTIVE), [&email], Assignment::from_row)
            .optional()?;
        Ok(assignment)
    }

    /// Active assignments, optionally limited to one schedule.
    pub fn list(&self, schedule_id: Option<i64>) -> TrackerResult<Vec<Assignment>> {
        let assignments = match schedule_id {
            Some(id) => {
                let mut stmt = self.conn.prepare(&format!("{} AND a.schedule_id = ?1 ORDER BY u.email", SELECT_ACTIVE))?;
                let rows = stmt.query_map([id], Assignment::from_row)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{} ORDER BY u.email", SELECT_ACTIVE))?;
                let rows = stmt.query_map([], Assignment::from_row)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(assignments)
    }
}
