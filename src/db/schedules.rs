//! Break schedules: named shifts with per-type limits and time-of-day windows.
//!
//! Limits and windows belong to their schedule and are removed with it
//! (`ON DELETE CASCADE`), as are the user assignments pointing at it.

use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::format_time;
use crate::libs::rules::time_in_range;
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashSet;

const INSERT_SCHEDULE: &str = "INSERT INTO break_schedules (name, description, shift_start, shift_end) VALUES (?1, ?2, ?3, ?4)";
const INSERT_LIMIT: &str = "INSERT INTO break_limits (schedule_id, break_type, duration_minutes, daily_count, position) VALUES (?1, ?2, ?3, ?4, ?5)";
const INSERT_WINDOW: &str = "INSERT INTO break_windows (schedule_id, break_type, window_start, window_end, priority) VALUES (?1, ?2, ?3, ?4, ?5)";
const SELECT_SCHEDULE: &str = "SELECT id, name, description, shift_start, shift_end, is_active, created_at, updated_at FROM break_schedules";
const SELECT_LIMITS: &str = "SELECT id, schedule_id, break_type, duration_minutes, daily_count, position
    FROM break_limits WHERE schedule_id = ?1 ORDER BY position, id";
const SELECT_WINDOWS: &str = "SELECT id, schedule_id, break_type, window_start, window_end, priority
    FROM break_windows WHERE schedule_id = ?1 ORDER BY priority, window_start, id";
const DELETE_SCHEDULE: &str = "DELETE FROM break_schedules WHERE id = ?1";
const SET_ACTIVE: &str = "UPDATE break_schedules SET is_active = ?2 WHERE id = ?1";
const UPDATE_SCHEDULE: &str = "UPDATE break_schedules SET name = ?2, description = ?3, shift_start = ?4, shift_end = ?5 WHERE id = ?1";
const DELETE_LIMITS: &str = "DELETE FROM break_limits WHERE schedule_id = ?1";
const DELETE_WINDOWS: &str = "DELETE FROM break_windows WHERE schedule_id = ?1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakLimit {
    pub id: i64,
    pub schedule_id: i64,
    pub break_type: String,
    pub duration_minutes: i64,
    pub daily_count: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakWindow {
    pub id: i64,
    pub schedule_id: i64,
    pub break_type: String,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub priority: i64,
}

impl BreakWindow {
    /// Both bounds are inclusive.
    pub fn contains(&self, at: NaiveTime) -> bool {
        time_in_range(self.window_start, self.window_end, at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakSchedule {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub limits: Vec<BreakLimit>,
    pub windows: Vec<BreakWindow>,
}

impl BreakSchedule {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BreakSchedule {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            shift_start: row.get(3)?,
            shift_end: row.get(4)?,
            is_active: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            limits: Vec::new(),
            windows: Vec::new(),
        })
    }

    /// Limit for a break type, matched case-insensitively.
    pub fn limit_for(&self, break_type: &str) -> Option<&BreakLimit> {
        let wanted = break_type.trim().to_lowercase();
        self.limits.iter().find(|l| l.break_type.to_lowercase() == wanted)
    }

    pub fn windows_for(&self, break_type: &str) -> Vec<&BreakWindow> {
        let wanted = break_type.trim().to_lowercase();
        self.windows.iter().filter(|w| w.break_type.to_lowercase() == wanted).collect()
    }

    /// Editable copy of the schedule, without IDs and timestamps.
    pub fn to_new(&self) -> NewSchedule {
        NewSchedule {
            name: self.name.clone(),
            description: self.description.clone(),
            shift_start: self.shift_start,
            shift_end: self.shift_end,
            limits: self
                .limits
                .iter()
                .map(|l| NewLimit {
                    break_type: l.break_type.clone(),
                    duration_minutes: l.duration_minutes,
                    daily_count: l.daily_count,
                })
                .collect(),
            windows: self
                .windows
                .iter()
                .map(|w| NewWindow {
                    break_type: w.break_type.clone(),
                    window_start: w.window_start,
                    window_end: w.window_end,
                    priority: w.priority,
                })
                .collect(),
        }
    }

    /// A break type without windows may be taken at any time.
    pub fn in_window(&self, break_type: &str, at: NaiveTime) -> bool {
        let windows = self.windows_for(break_type);
        windows.is_empty() || windows.iter().any(|w| w.contains(at))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLimit {
    pub break_type: String,
    pub duration_minutes: i64,
    pub daily_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWindow {
    pub break_type: String,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub name: String,
    pub description: Option<String>,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub limits: Vec<NewLimit>,
    pub windows: Vec<NewWindow>,
}

impl NewSchedule {
    fn validate(&self) -> TrackerResult<()> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidInput("schedule name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for limit in &self.limits {
            let key = limit.break_type.trim().to_lowercase();
            if key.is_empty() {
                return Err(TrackerError::InvalidInput("break type is empty".to_string()));
            }
            if !seen.insert(key) {
                return Err(TrackerError::InvalidInput(format!("duplicate limit for {}", limit.break_type)));
            }
            if limit.duration_minutes <= 0 || limit.daily_count < 0 {
                return Err(TrackerError::InvalidInput(format!(
                    "limit for {} must be positive, got {} min x {}",
                    limit.break_type, limit.duration_minutes, limit.daily_count
                )));
            }
        }
        for window in &self.windows {
            if !seen.contains(&window.break_type.trim().to_lowercase()) {
                return Err(TrackerError::InvalidInput(format!("window for {} has no matching limit", window.break_type)));
            }
            if window.window_start > window.window_end {
                return Err(TrackerError::InvalidInput(format!(
                    "window {}-{} ends before it starts",
                    format_time(&window.window_start),
                    format_time(&window.window_end)
                )));
            }
        }
        Ok(())
    }
}

pub struct BreakSchedules<'a> {
    conn: &'a Connection,
}

impl<'a> BreakSchedules<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        BreakSchedules { conn }
    }

    /// Inserts the schedule with all its limits and windows, or nothing.
    pub fn create(&self, schedule: &NewSchedule) -> TrackerResult<BreakSchedule> {
        schedule.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            INSERT_SCHEDULE,
            params![
                schedule.name.trim(),
                schedule.description,
                format_time(&schedule.shift_start),
                format_time(&schedule.shift_end)
            ],
        )?;
        let id = tx.last_insert_rowid();
        Self::insert_children(&tx, id, schedule)?;
        tx.commit()?;
        tracing::debug!(id, name = %schedule.name, "schedule created");

        self.get(id)?.ok_or(TrackerError::ScheduleNotFound(id))
    }

    /// Replaces name, shift, limits and windows in place.
    ///
    /// The ID is kept, so assignments keep pointing at the schedule.
    pub fn update(&self, id: i64, schedule: &NewSchedule) -> TrackerResult<BreakSchedule> {
        schedule.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            UPDATE_SCHEDULE,
            params![
                id,
                schedule.name.trim(),
                schedule.description,
                format_time(&schedule.shift_start),
                format_time(&schedule.shift_end)
            ],
        )?;
        if updated == 0 {
            return Err(TrackerError::ScheduleNotFound(id));
        }
        tx.execute(DELETE_LIMITS, [id])?;
        tx.execute(DELETE_WINDOWS, [id])?;
        Self::insert_children(&tx, id, schedule)?;
        tx.commit()?;
        tracing::debug!(id, name = %schedule.name, "schedule updated");

        self.get(id)?.ok_or(TrackerError::ScheduleNotFound(id))
    }

    fn insert_children(conn: &Connection, id: i64, schedule: &NewSchedule) -> TrackerResult<()> {
        for (position, limit) in schedule.limits.iter().enumerate() {
            conn.execute(
                INSERT_LIMIT,
                params![id, limit.break_type.trim(), limit.duration_minutes, limit.daily_count, position as i64],
            )?;
        }
        for window in &schedule.windows {
            conn.execute(
                INSERT_WINDOW,
                params![
                    id,
                    window.break_type.trim(),
                    format_time(&window.window_start),
                    format_time(&window.window_end),
                    window.priority
                ],
            )?;
        }
        Ok(())
    }

    /// Schedule with its limits and windows loaded.
    pub fn get(&self, id: i64) -> TrackerResult<Option<BreakSchedule>> {
        let schedule = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_SCHEDULE), [id], BreakSchedule::from_row)
            .optional()?;
        schedule.map(|s| self.load_children(s)).transpose()
    }

    pub fn get_by_name(&self, name: &str) -> TrackerResult<Option<BreakSchedule>> {
        let schedule = self
            .conn
            .query_row(&format!("{} WHERE name = ?1", SELECT_SCHEDULE), [name.trim()], BreakSchedule::from_row)
            .optional()?;
        schedule.map(|s| self.load_children(s)).transpose()
    }

    pub fn list(&self) -> TrackerResult<Vec<BreakSchedule>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY name", SELECT_SCHEDULE))?;
        let schedules = stmt.query_map([], BreakSchedule::from_row)?.collect::<Result<Vec<_>, _>>()?;
        schedules.into_iter().map(|s| self.load_children(s)).collect()
    }

    /// Deletes the schedule; limits, windows and assignments go with it.
    pub fn delete(&self, id: i64) -> TrackerResult<()> {
        let deleted = self.conn.execute(DELETE_SCHEDULE, [id])?;
        if deleted == 0 {
            return Err(TrackerError::ScheduleNotFound(id));
        }
        tracing::debug!(id, "schedule deleted");
        Ok(())
    }

    /// An inactive schedule keeps its assignments but is ignored when limits are resolved.
    pub fn set_active(&self, id: i64, active: bool) -> TrackerResult<BreakSchedule> {
        let updated = self.conn.execute(SET_ACTIVE, params![id, active])?;
        if updated == 0 {
            return Err(TrackerError::ScheduleNotFound(id));
        }
        self.get(id)?.ok_or(TrackerError::ScheduleNotFound(id))
    }

    fn load_children(&self, mut schedule: BreakSchedule) -> TrackerResult<BreakSchedule> {
        let mut stmt = self.conn.prepare(SELECT_LIMITS)?;
        schedule.limits = stmt
            .query_map([schedule.id], |row| {
                Ok(BreakLimit {
                    id: row.get(0)?,
                    schedule_id: row.get(1)?,
                    break_type: row.get(2)?,
                    duration_minutes: row.get(3)?,
                    daily_count: row.get(4)?,
                    position: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(SELECT_WINDOWS)?;
        schedule.windows = stmt
            .query_map([schedule.id], |row| {
                Ok(BreakWindow {
                    id: row.get(0)?,
                    schedule_id: row.get(1)?,
                    break_type: row.get(2)?,
                    window_start: row.get(3)?,
                    window_end: row.get(4)?,
                    priority: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(schedule)
    }
}
