//! Break lifecycle service.
//!
//! [`BreakTracker`] is the one place where the stores are combined: it
//! resolves which limit applies to a break, opens and closes breaks, and
//! records the violations that follow from them.
//!
//! ## Flow
//!
//! ```text
//! start_break ─▶ resolve ─▶ break_log INSERT ─▶ NO_SCHEDULE / QUOTA_EXCEEDED / OUT_OF_WINDOW
//! end_break   ─▶ break_log UPDATE (duration, is_over_limit) ─▶ OVER_LIMIT
//! end_session ─▶ end_break (if open) ─▶ work_sessions UPDATE
//! ```
//!
//! Every public operation that writes more than one row runs in a single
//! transaction.

use crate::db::assignments::Assignments;
use crate::db::break_log::{BreakLog, BreakRecord, NewBreak};
use crate::db::schedules::BreakSchedules;
use crate::db::sessions::{SessionStatus, WorkSession, WorkSessions};
use crate::db::users::{User, Users};
use crate::db::violations::{NewViolation, ViolationKind, Violations};
use crate::libs::config::{TrackingConfig, UnassignedPolicy};
use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::rules::{duration_minutes, quota_exhausted};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

/// Where the applicable limit came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LimitSource {
    Schedule { id: i64, name: String },
    /// No schedule assigned; the configured fallback limits apply.
    Defaults,
}

/// Limit and window outcome for one break type at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub source: LimitSource,
    pub break_type: String,
    pub limit_minutes: Option<i64>,
    pub daily_count: Option<i64>,
    pub in_window: bool,
    /// Set when the break should be recorded as a `NO_SCHEDULE` violation.
    pub flag_unassigned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakStart {
    pub record: BreakRecord,
    pub resolution: Resolution,
    pub violations: Vec<ViolationKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakOutcome {
    pub record: BreakRecord,
    pub excess_minutes: Option<i64>,
    pub violation_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionClose {
    pub session: WorkSession,
    pub closed_break: Option<BreakOutcome>,
}

/// Today's usage of one break type against its limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitUsage {
    pub break_type: String,
    pub limit_minutes: i64,
    pub daily_count: i64,
    pub used_count: i64,
    pub used_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    pub email: String,
    pub schedule: Option<String>,
    pub limits: Vec<LimitUsage>,
    pub active_break: Option<BreakRecord>,
    pub active_minutes: Option<i64>,
}

pub struct BreakTracker<'a> {
    conn: &'a Connection,
    config: TrackingConfig,
}

impl<'a> BreakTracker<'a> {
    pub fn new(conn: &'a Connection, config: TrackingConfig) -> Self {
        BreakTracker { conn, config }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Which limit applies to `break_type` for `email` at `at`.
    ///
    /// Fails with `NoScheduleAssigned` under the `deny` policy and with
    /// `BreakTypeNotInSchedule` when the assigned schedule has no such type.
    pub fn resolve(&self, email: &str, break_type: &str, at: NaiveDateTime) -> TrackerResult<Resolution> {
        let user = self.find_user(self.conn, email)?;
        self.resolve_for(self.conn, &user, break_type, at)
    }

    fn resolve_for(&self, conn: &Connection, user: &User, break_type: &str, at: NaiveDateTime) -> TrackerResult<Resolution> {
        let break_type = break_type.trim();
        if break_type.is_empty() {
            return Err(TrackerError::InvalidInput("empty break type".to_string()));
        }

        let assignment = Assignments::new(conn).active_for(&user.email)?;
        let schedule = match assignment {
            Some(a) => BreakSchedules::new(conn).get(a.schedule_id)?.filter(|s| s.is_active),
            None => None,
        };

        if let Some(schedule) = schedule {
            let limit = schedule
                .limit_for(break_type)
                .ok_or_else(|| TrackerError::BreakTypeNotInSchedule(schedule.name.clone(), break_type.to_string()))?;
            return Ok(Resolution {
                break_type: limit.break_type.clone(),
                limit_minutes: Some(limit.duration_minutes),
                daily_count: Some(limit.daily_count),
                in_window: schedule.in_window(break_type, at.time()),
                flag_unassigned: false,
                source: LimitSource::Schedule {
                    id: schedule.id,
                    name: schedule.name.clone(),
                },
            });
        }

        if self.config.unassigned_policy == UnassignedPolicy::Deny {
            return Err(TrackerError::NoScheduleAssigned(user.email.clone()));
        }
        let fallback = self.config.default_limit(break_type);
        Ok(Resolution {
            source: LimitSource::Defaults,
            break_type: fallback.map(|l| l.break_type.clone()).unwrap_or_else(|| break_type.to_string()),
            limit_minutes: fallback.map(|l| l.duration_minutes),
            daily_count: fallback.map(|l| l.daily_count),
            in_window: true,
            flag_unassigned: self.config.unassigned_policy == UnassignedPolicy::AllowAndFlag,
        })
    }

    /// Opens a break and records the violations its start triggers.
    ///
    /// With no `session_id` the user's open session, if any, is linked.
    pub fn start_break(&self, email: &str, break_type: &str, session_id: Option<&str>, at: NaiveDateTime) -> TrackerResult<BreakStart> {
        let tx = self.conn.unchecked_transaction()?;

        let user = Users::new(&tx).require_active(email)?;
        let breaks = BreakLog::new(&tx);
        if breaks.active_for_user(user.id)?.is_some() {
            return Err(TrackerError::BreakAlreadyActive(user.email));
        }

        let resolution = self.resolve_for(&tx, &user, break_type, at)?;
        let session_id = match session_id {
            Some(id) => Some(id.to_string()),
            None => WorkSessions::new(&tx).active_for(&user.email)?.map(|s| s.session_id),
        };
        let used_today = breaks.count_for_day(user.id, &resolution.break_type, at.date())?;

        let record = breaks.start(&NewBreak {
            user_id: user.id,
            email: &user.email,
            session_id: session_id.as_deref(),
            break_type: &resolution.break_type,
            start_time: at,
            limit_minutes: resolution.limit_minutes,
            in_window: resolution.in_window,
        })?;

        let mut kinds = Vec::new();
        if resolution.flag_unassigned {
            kinds.push(ViolationKind::NoSchedule);
        }
        if let Some(count) = resolution.daily_count {
            if self.config.check_daily_quota && quota_exhausted(used_today, count) {
                kinds.push(ViolationKind::QuotaExceeded);
            }
        }
        if self.config.check_windows && !resolution.in_window {
            kinds.push(ViolationKind::OutOfWindow);
        }

        let violations = Violations::new(&tx);
        for kind in &kinds {
            let details = match kind {
                ViolationKind::NoSchedule => "no break schedule assigned".to_string(),
                ViolationKind::QuotaExceeded => format!(
                    "{} of {} allowed {} breaks already taken",
                    used_today,
                    resolution.daily_count.unwrap_or_default(),
                    resolution.break_type
                ),
                ViolationKind::OutOfWindow => format!("{} started outside its windows", resolution.break_type),
                ViolationKind::OverLimit => String::new(),
            };
            violations.insert(&NewViolation {
                user_id: Some(user.id),
                session_id: record.session_id.clone(),
                break_id: Some(record.id),
                break_type: Some(record.break_type.clone()),
                expected_duration: resolution.limit_minutes,
                details: Some(details),
                ..NewViolation::new(*kind, &user.email, at)
            })?;
        }

        tx.commit()?;
        tracing::info!(email = %user.email, break_type = %record.break_type, id = record.id, "break started");

        Ok(BreakStart {
            record,
            resolution,
            violations: kinds,
        })
    }

    /// Closes the user's active break.
    pub fn end_break(&self, email: &str, at: NaiveDateTime) -> TrackerResult<BreakOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let user = self.find_user(&tx, email)?;
        let active = BreakLog::new(&tx)
            .active_for_user(user.id)?
            .ok_or_else(|| TrackerError::NoActiveBreak(user.email.clone()))?;
        let outcome = self.close_break(&tx, active.id, at)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Stores duration and over-limit flag, and the single `OVER_LIMIT`
    /// violation when the break ran long. Runs inside the caller's transaction.
    fn close_break(&self, conn: &Connection, break_id: i64, at: NaiveDateTime) -> TrackerResult<BreakOutcome> {
        let record = BreakLog::new(conn).close(break_id, at, self.config.over_limit_grace_minutes)?;
        let excess = record.excess_minutes();

        let violation_id = match excess {
            Some(excess) => {
                let id = Violations::new(conn).insert(&NewViolation {
                    user_id: Some(record.user_id),
                    session_id: record.session_id.clone(),
                    break_id: Some(record.id),
                    break_type: Some(record.break_type.clone()),
                    expected_duration: record.limit_minutes,
                    actual_duration: record.duration_minutes,
                    excess_minutes: Some(excess),
                    details: Some(format!("{} exceeded by {} min", record.break_type, excess)),
                    ..NewViolation::new(ViolationKind::OverLimit, &record.email, at)
                })?;
                Some(id)
            }
            None => None,
        };

        tracing::info!(id = record.id, minutes = ?record.duration_minutes, over_limit = record.is_over_limit, "break ended");
        Ok(BreakOutcome {
            record,
            excess_minutes: excess,
            violation_id,
        })
    }

    /// Closes a session, ending the user's open break first.
    pub fn end_session(&self, session_id: &str, at: NaiveDateTime, status: SessionStatus, reason: Option<&str>) -> TrackerResult<SessionClose> {
        if status == SessionStatus::Active {
            return Err(TrackerError::InvalidStatus(status.to_string()));
        }
        let tx = self.conn.unchecked_transaction()?;
        let sessions = WorkSessions::new(&tx);
        let session = sessions
            .get(session_id)?
            .ok_or_else(|| TrackerError::SessionNotFound(session_id.to_string()))?;
        if !session.is_open() {
            return Err(TrackerError::SessionAlreadyClosed(session.session_id));
        }

        let closed_break = match BreakLog::new(&tx).active_for_user(session.user_id)? {
            Some(active) => Some(self.close_break(&tx, active.id, at.max(active.start_time))?),
            None => None,
        };
        let session = sessions.close(session_id, at, status, reason)?;
        tx.commit()?;

        Ok(SessionClose { session, closed_break })
    }

    /// Limits in force for the user, today's usage and the active break.
    pub fn status(&self, email: &str, at: NaiveDateTime) -> TrackerResult<TrackerStatus> {
        let user = self.find_user(self.conn, email)?;
        let schedule = match Assignments::new(self.conn).active_for(&user.email)? {
            Some(a) => BreakSchedules::new(self.conn).get(a.schedule_id)?.filter(|s| s.is_active),
            None => None,
        };

        let limits: Vec<(String, i64, i64)> = match &schedule {
            Some(s) => s
                .limits
                .iter()
                .map(|l| (l.break_type.clone(), l.duration_minutes, l.daily_count))
                .collect(),
            None if self.config.unassigned_policy == UnassignedPolicy::Deny => Vec::new(),
            None => self
                .config
                .default_limits
                .iter()
                .map(|l| (l.break_type.clone(), l.duration_minutes, l.daily_count))
                .collect(),
        };

        let breaks = BreakLog::new(self.conn);
        let usage = breaks.usage_for_day(user.id, at.date())?;
        let limits = limits
            .into_iter()
            .map(|(break_type, limit_minutes, daily_count)| {
                let used = usage.iter().find(|u| u.break_type.to_lowercase() == break_type.to_lowercase());
                LimitUsage {
                    used_count: used.map(|u| u.count).unwrap_or(0),
                    used_minutes: used.map(|u| u.minutes).unwrap_or(0),
                    break_type,
                    limit_minutes,
                    daily_count,
                }
            })
            .collect();

        let active_break = breaks.active_for_user(user.id)?;
        let active_minutes = match &active_break {
            Some(b) => Some(duration_minutes(b.start_time, at.max(b.start_time))?),
            None => None,
        };

        Ok(TrackerStatus {
            email: user.email,
            schedule: schedule.map(|s| s.name),
            limits,
            active_break,
            active_minutes,
        })
    }

    fn find_user(&self, conn: &Connection, email: &str) -> TrackerResult<User> {
        Users::new(conn)
            .get_by_email(email)?
            .ok_or_else(|| TrackerError::UserNotFound(email.trim().to_lowercase()))
    }
}
