use crate::{
    commands::admin_email,
    db::{
        assignments::Assignments,
        db::Db,
        schedules::{BreakSchedule, BreakSchedules, NewLimit, NewSchedule, NewWindow},
    },
    libs::{admin::Admin, config::Config, formatter::parse_hhmm, messages::Message, view::View},
    msg_bail_anyhow, msg_error_anyhow, msg_info, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use rusqlite::Connection;

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    command: ScheduleCommand,
    /// Administrator recorded in the audit log
    #[arg(long, global = true)]
    admin: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ScheduleCommand {
    /// Create a schedule with its limits and windows
    Create {
        name: String,
        /// Shift bounds, `HH:MM-HH:MM`
        #[arg(long, default_value = "09:00-18:00")]
        shift: String,
        /// Break limit, `TYPE:MINUTES[:COUNT]`; repeatable
        #[arg(short, long = "limit", required = true)]
        limits: Vec<String>,
        /// Break window, `TYPE:HH:MM-HH:MM[:PRIORITY]`; repeatable
        #[arg(short, long = "window")]
        windows: Vec<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a schedule in place; omitted options keep their current value
    Update {
        schedule: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Shift bounds, `HH:MM-HH:MM`
        #[arg(long)]
        shift: Option<String>,
        /// Replaces all limits, `TYPE:MINUTES[:COUNT]`; repeatable
        #[arg(short, long = "limit")]
        limits: Vec<String>,
        /// Replaces all windows, `TYPE:HH:MM-HH:MM[:PRIORITY]`; repeatable
        #[arg(short, long = "window")]
        windows: Vec<String>,
        /// Drop all windows
        #[arg(long, conflicts_with = "windows")]
        clear_windows: bool,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Make a schedule apply again to its assigned users
    Activate {
        schedule: String,
    },
    /// Stop applying a schedule; its users get the unassigned policy
    Deactivate {
        schedule: String,
    },
    /// List all schedules
    List,
    /// Show one schedule by ID or name
    Show {
        schedule: String,
    },
    /// Delete a schedule with its limits, windows and assignments
    Delete {
        schedule: String,
    },
    /// Assign a schedule to a user, replacing the current one
    Assign {
        email: String,
        schedule: String,
    },
    /// Remove a user's schedule assignment
    Unassign {
        email: String,
    },
    /// Show active assignments
    Assignments {
        /// Only this schedule
        #[arg(short, long)]
        schedule: Option<String>,
    },
}

pub fn cmd(args: ScheduleArgs) -> Result<()> {
    let db = Db::new()?;
    let admin = Admin::new(&db.conn, &admin_email(args.admin), Config::read()?.tracking_or_default());

    match args.command {
        ScheduleCommand::Create {
            name,
            shift,
            limits,
            windows,
            description,
        } => {
            let (shift_start, shift_end) = parse_range(&shift).ok_or_else(|| msg_error_anyhow!(Message::InvalidShiftSpec(shift.clone())))?;
            let schedule = NewSchedule {
                name,
                description,
                shift_start,
                shift_end,
                limits: limits.iter().map(|s| parse_limit(s)).collect::<Result<Vec<_>>>()?,
                windows: windows.iter().map(|s| parse_window(s)).collect::<Result<Vec<_>>>()?,
            };
            let created = admin.create_schedule(&schedule)?;
            msg_success!(Message::ScheduleCreated(created.id, created.name.clone()));
            View::schedule(&created);
        }
        ScheduleCommand::Update {
            schedule,
            name,
            shift,
            limits,
            windows,
            clear_windows,
            description,
        } => {
            let current = find_schedule(&db.conn, &schedule)?;
            let mut changed = current.to_new();
            if let Some(name) = name {
                changed.name = name;
            }
            if let Some(shift) = shift {
                let (start, end) = parse_range(&shift).ok_or_else(|| msg_error_anyhow!(Message::InvalidShiftSpec(shift.clone())))?;
                changed.shift_start = start;
                changed.shift_end = end;
            }
            if description.is_some() {
                changed.description = description;
            }
            if !limits.is_empty() {
                changed.limits = limits.iter().map(|s| parse_limit(s)).collect::<Result<Vec<_>>>()?;
            }
            if clear_windows {
                changed.windows.clear();
            } else if !windows.is_empty() {
                changed.windows = windows.iter().map(|s| parse_window(s)).collect::<Result<Vec<_>>>()?;
            }
            let updated = admin.update_schedule(current.id, &changed)?;
            msg_success!(Message::ScheduleUpdated(updated.id, updated.name.clone()));
            View::schedule(&updated);
        }
        ScheduleCommand::Activate { schedule } => {
            let schedule = find_schedule(&db.conn, &schedule)?;
            admin.set_schedule_active(schedule.id, true)?;
            msg_success!(Message::ScheduleActivated(schedule.id));
        }
        ScheduleCommand::Deactivate { schedule } => {
            let schedule = find_schedule(&db.conn, &schedule)?;
            admin.set_schedule_active(schedule.id, false)?;
            msg_success!(Message::ScheduleDeactivated(schedule.id));
        }
        ScheduleCommand::List => {
            let schedules = BreakSchedules::new(&db.conn).list()?;
            if schedules.is_empty() {
                msg_info!(Message::NoSchedules);
            } else {
                View::schedules(&schedules);
            }
        }
        ScheduleCommand::Show { schedule } => {
            View::schedule(&find_schedule(&db.conn, &schedule)?);
        }
        ScheduleCommand::Delete { schedule } => {
            let schedule = find_schedule(&db.conn, &schedule)?;
            admin.delete_schedule(schedule.id)?;
            msg_success!(Message::ScheduleDeleted(schedule.id));
        }
        ScheduleCommand::Assign { email, schedule } => {
            let schedule = find_schedule(&db.conn, &schedule)?;
            let assignment = admin.assign_schedule(&email, schedule.id)?;
            msg_success!(Message::ScheduleAssigned(assignment.email, assignment.schedule_name));
        }
        ScheduleCommand::Unassign { email } => {
            if admin.unassign_schedule(&email)? {
                msg_success!(Message::ScheduleUnassigned(email));
            } else {
                msg_info!(Message::ScheduleNotAssigned(email));
            }
        }
        ScheduleCommand::Assignments { schedule } => {
            let schedule_id = match schedule {
                Some(s) => Some(find_schedule(&db.conn, &s)?.id),
                None => None,
            };
            let assignments = Assignments::new(&db.conn).list(schedule_id)?;
            if assignments.is_empty() {
                msg_info!(Message::NoAssignments);
            } else {
                View::assignments(&assignments);
            }
        }
    }
    Ok(())
}

/// Looks a schedule up by numeric ID first, then by name.
fn find_schedule(conn: &Connection, identifier: &str) -> Result<BreakSchedule> {
    let schedules = BreakSchedules::new(conn);
    let found = match identifier.trim().parse::<i64>() {
        Ok(id) => schedules.get(id)?,
        Err(_) => schedules.get_by_name(identifier)?,
    };
    found.ok_or_else(|| msg_error_anyhow!(Message::ScheduleNotFound(identifier.to_string())))
}

/// `TYPE:MINUTES[:COUNT]`; the count defaults to 1.
fn parse_limit(spec: &str) -> Result<NewLimit> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    let (break_type, minutes, count) = match parts.as_slice() {
        [t, m] => (*t, *m, "1"),
        [t, m, c] => (*t, *m, *c),
        _ => msg_bail_anyhow!(Message::InvalidLimitSpec(spec.to_string())),
    };
    match (minutes.parse::<i64>(), count.parse::<i64>()) {
        (Ok(duration_minutes), Ok(daily_count)) if !break_type.is_empty() => Ok(NewLimit {
            break_type: break_type.to_string(),
            duration_minutes,
            daily_count,
        }),
        _ => msg_bail_anyhow!(Message::InvalidLimitSpec(spec.to_string())),
    }
}

/// `TYPE:HH:MM-HH:MM[:PRIORITY]`; the priority defaults to 1.
fn parse_window(spec: &str) -> Result<NewWindow> {
    let invalid = || msg_error_anyhow!(Message::InvalidWindowSpec(spec.to_string()));

    let (break_type, range) = spec.split_once(':').ok_or_else(invalid)?;
    let (range, priority) = match range.matches(':').count() {
        2 => (range, 1),
        3 => {
            let (range, priority) = range.rsplit_once(':').ok_or_else(invalid)?;
            (range, priority.trim().parse::<i64>().map_err(|_| invalid())?)
        }
        _ => return Err(invalid()),
    };
    let (window_start, window_end) = parse_range(range).ok_or_else(invalid)?;
    if break_type.trim().is_empty() {
        return Err(invalid());
    }

    Ok(NewWindow {
        break_type: break_type.trim().to_string(),
        window_start,
        window_end,
        priority,
    })
}

fn parse_range(range: &str) -> Option<(chrono::NaiveTime, chrono::NaiveTime)> {
    let (start, end) = range.split_once('-')?;
    Some((parse_hhmm(start).ok()?, parse_hhmm(end).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn parses_limits() {
        let limit = parse_limit("Lunch:60").unwrap();
        assert_eq!((limit.break_type.as_str(), limit.duration_minutes, limit.daily_count), ("Lunch", 60, 1));
        let limit = parse_limit("Break:15:3").unwrap();
        assert_eq!((limit.duration_minutes, limit.daily_count), (15, 3));
        assert!(parse_limit("Break").is_err());
        assert!(parse_limit("Break:x").is_err());
        assert!(parse_limit(":15").is_err());
    }

    #[test]
    fn parses_windows() {
        let window = parse_window("Lunch:12:00-14:00").unwrap();
        assert_eq!(window.break_type, "Lunch");
        assert_eq!(window.window_start, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(window.window_end, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(window.priority, 1);

        assert_eq!(parse_window("Break:10:00-10:30:2").unwrap().priority, 2);
        assert!(parse_window("Lunch:12:00").is_err());
        assert!(parse_window("Lunch:12:00-25:00").is_err());
    }
}
