use crate::db::assignments::Assignment;
use crate::db::audit::AuditEntry;
use crate::db::break_log::BreakRecord;
use crate::db::notifications::AppLogEntry;
use crate::db::schedules::BreakSchedule;
use crate::db::sessions::{ActiveSession, WorkSession};
use crate::db::users::User;
use crate::db::violations::Violation;
use crate::libs::formatter::{format_datetime, format_minutes, format_time};
use crate::libs::messages::Message;
use crate::msg_print;
use chrono::NaiveDateTime;
use prettytable::{row, Table};

fn opt_time(value: &Option<NaiveDateTime>) -> String {
    value.as_ref().map(|v| v.format("%H:%M").to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_minutes(value: Option<i64>) -> String {
    value.map(format_minutes).unwrap_or_else(|| "-".to_string())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub struct View {}

impl View {
    pub fn users(users: &[User]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "EMAIL", "NAME", "ROLE", "GROUP", "ACTIVE"]);
        for user in users {
            table.add_row(row![
                user.id,
                user.email,
                user.name,
                user.role,
                user.group_name.as_deref().unwrap_or("-"),
                yes_no(user.is_active)
            ]);
        }
        table.printstd();
    }

    pub fn active_sessions(sessions: &[ActiveSession]) {
        let mut table = Table::new();
        table.add_row(row!["SESSION", "EMAIL", "NAME", "LOGIN", "COMMENT"]);
        for active in sessions {
            let s = &active.session;
            table.add_row(row![
                s.session_id,
                s.email,
                active.name,
                format_datetime(&s.login_time),
                s.comment.as_deref().unwrap_or("")
            ]);
        }
        table.printstd();
    }

    pub fn sessions(sessions: &[WorkSession]) {
        let mut table = Table::new();
        table.add_row(row!["SESSION", "LOGIN", "LOGOUT", "DURATION", "STATUS", "REASON"]);
        for s in sessions {
            table.add_row(row![
                s.session_id,
                format_datetime(&s.login_time),
                opt_time(&s.logout_time),
                opt_minutes(s.duration_minutes),
                s.status,
                s.logout_reason.as_deref().unwrap_or("")
            ]);
        }
        table.printstd();
    }

    pub fn breaks(breaks: &[BreakRecord]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "EMAIL", "TYPE", "START", "END", "DURATION", "LIMIT", "OVER", "IN WINDOW"]);
        for b in breaks {
            table.add_row(row![
                b.id,
                b.email,
                b.break_type,
                b.start_time.format("%H:%M"),
                opt_time(&b.end_time),
                opt_minutes(b.duration_minutes),
                opt_minutes(b.limit_minutes),
                yes_no(b.is_over_limit),
                yes_no(b.in_window)
            ]);
        }
        table.printstd();
    }

    pub fn violations(violations: &[Violation]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "TIME", "EMAIL", "TYPE", "SEVERITY", "BREAK", "LIMIT", "ACTUAL", "EXCESS"]);
        for v in violations {
            table.add_row(row![
                v.id,
                format_datetime(&v.timestamp),
                v.email,
                v.kind,
                v.severity,
                v.break_type.as_deref().unwrap_or("-"),
                opt_minutes(v.expected_duration),
                opt_minutes(v.actual_duration),
                v.excess_minutes.map(|m| m.to_string()).unwrap_or_default()
            ]);
        }
        table.printstd();
    }

    pub fn schedules(schedules: &[BreakSchedule]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "NAME", "SHIFT", "ACTIVE", "LIMITS", "WINDOWS"]);
        for s in schedules {
            let limits = s
                .limits
                .iter()
                .map(|l| format!("{} {}m x{}", l.break_type, l.duration_minutes, l.daily_count))
                .collect::<Vec<_>>()
                .join("\n");
            table.add_row(row![
                s.id,
                s.name,
                format!("{}-{}", format_time(&s.shift_start), format_time(&s.shift_end)),
                yes_no(s.is_active),
                limits,
                s.windows.len()
            ]);
        }
        table.printstd();
    }

    /// One schedule with its limits and windows as separate tables.
    pub fn schedule(schedule: &BreakSchedule) {
        msg_print!(format!(
            "{} ({}-{})",
            schedule.name,
            format_time(&schedule.shift_start),
            format_time(&schedule.shift_end)
        ));

        msg_print!(Message::ScheduleLimitsHeader);
        let mut limits = Table::new();
        limits.add_row(row!["TYPE", "MINUTES", "PER DAY"]);
        for l in &schedule.limits {
            limits.add_row(row![l.break_type, l.duration_minutes, l.daily_count]);
        }
        limits.printstd();

        if !schedule.windows.is_empty() {
            msg_print!(Message::ScheduleWindowsHeader);
            let mut windows = Table::new();
            windows.add_row(row!["TYPE", "FROM", "TO", "PRIORITY"]);
            for w in &schedule.windows {
                windows.add_row(row![w.break_type, format_time(&w.window_start), format_time(&w.window_end), w.priority]);
            }
            windows.printstd();
        }
    }

    pub fn assignments(assignments: &[Assignment]) {
        let mut table = Table::new();
        table.add_row(row!["EMAIL", "SCHEDULE", "ASSIGNED BY", "ASSIGNED AT"]);
        for a in assignments {
            table.add_row(row![
                a.email,
                a.schedule_name,
                a.assigned_by.as_deref().unwrap_or("-"),
                format_datetime(&a.assigned_at)
            ]);
        }
        table.printstd();
    }

    pub fn audit(entries: &[AuditEntry]) {
        let mut table = Table::new();
        table.add_row(row!["ID", "TIME", "ADMIN", "ACTION", "ENTITY", "ID", "OK", "ERROR"]);
        for e in entries {
            table.add_row(row![
                e.id,
                format_datetime(&e.timestamp),
                e.admin_email,
                e.action,
                e.entity_type,
                e.entity_id.as_deref().unwrap_or("-"),
                yes_no(e.success),
                e.error_message.as_deref().unwrap_or("")
            ]);
        }
        table.printstd();
    }

    pub fn counts(title: &str, counts: &[(String, i64)]) {
        let mut table = Table::new();
        table.add_row(row![title, "COUNT"]);
        for (key, count) in counts {
            table.add_row(row![key, count]);
        }
        table.printstd();
    }

    pub fn app_logs(entries: &[AppLogEntry]) {
        let mut table = Table::new();
        table.add_row(row!["TIME", "LEVEL", "MESSAGE"]);
        for e in entries {
            table.add_row(row![format_datetime(&e.ts), e.level, e.message]);
        }
        table.printstd();
    }
}
