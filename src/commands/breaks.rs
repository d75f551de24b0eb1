use crate::{
    commands::{at_or_now, date_or_today},
    db::{break_log::BreakLog, db::Db, violations::ViolationKind},
    libs::{
        config::Config,
        formatter::{format_date, format_datetime},
        messages::Message,
        tracker::{BreakTracker, LimitSource},
        view::View,
    },
    msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct BreakArgs {
    #[command(subcommand)]
    command: BreakCommand,
}

#[derive(Debug, Subcommand)]
enum BreakCommand {
    /// Start a break
    Start {
        email: String,
        /// Break type as named in the schedule, e.g. `Lunch`
        break_type: String,
        /// Session to link; the user's open session when omitted
        #[arg(short, long)]
        session: Option<String>,
        /// Start time, `YYYY-MM-DD HH:MM:SS`
        #[arg(long)]
        at: Option<String>,
    },
    /// End the user's active break
    End {
        email: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Limits, today's usage and the active break of a user
    Status {
        email: String,
    },
    /// Breaks recorded for a day
    List {
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// All currently open breaks
    Active,
}

pub fn cmd(args: BreakArgs) -> Result<()> {
    let db = Db::new()?;
    let tracker = BreakTracker::new(&db.conn, Config::read()?.tracking_or_default());

    match args.command {
        BreakCommand::Start {
            email,
            break_type,
            session,
            at,
        } => {
            let started = tracker.start_break(&email, &break_type, session.as_deref(), at_or_now(at)?)?;
            let record = &started.record;
            if record.session_id.is_none() {
                msg_info!(Message::NoActiveSessionFor(record.email.clone()));
            }
            for kind in &started.violations {
                match kind {
                    ViolationKind::NoSchedule => msg_warning!(Message::UnassignedBreakAllowed(record.email.clone())),
                    other => msg_warning!(Message::ViolationLogged(other.to_string(), record.email.clone())),
                }
            }
            if started.resolution.source == LimitSource::Defaults && !started.violations.contains(&ViolationKind::NoSchedule) {
                msg_info!(Message::ScheduleNotAssigned(record.email.clone()));
            }
            msg_success!(Message::BreakStarted(record.break_type.clone()));
        }
        BreakCommand::End { email, at } => {
            let outcome = tracker.end_break(&email, at_or_now(at)?)?;
            msg_success!(Message::BreakEnded(
                outcome.record.break_type.clone(),
                outcome.record.duration_minutes.unwrap_or(0)
            ));
            if let Some(excess) = outcome.excess_minutes {
                msg_warning!(Message::BreakOverLimit(excess));
            }
        }
        BreakCommand::Status { email } => {
            let status = tracker.status(&email, at_or_now(None)?)?;
            if status.schedule.is_none() {
                msg_info!(Message::ScheduleNotAssigned(status.email.clone()));
            }
            for usage in &status.limits {
                msg_print!(Message::BreakUsage(
                    usage.break_type.clone(),
                    usage.used_count,
                    usage.daily_count,
                    usage.limit_minutes
                ));
            }
            match (&status.active_break, status.active_minutes) {
                (Some(active), Some(minutes)) => msg_print!(Message::ActiveBreak(
                    active.break_type.clone(),
                    format_datetime(&active.start_time),
                    minutes
                )),
                _ => msg_info!(Message::NoActiveBreakFor(status.email.clone())),
            }
        }
        BreakCommand::List { date, email } => {
            let date = date_or_today(date)?;
            let breaks = BreakLog::new(&db.conn).list_for_date(date, email.as_deref())?;
            if breaks.is_empty() {
                msg_info!(Message::NoBreaksForDate(format_date(&date)));
            } else {
                View::breaks(&breaks);
            }
        }
        BreakCommand::Active => {
            let breaks = BreakLog::new(&db.conn).list_active()?;
            if breaks.is_empty() {
                msg_info!(Message::NoActiveBreaks);
            } else {
                View::breaks(&breaks);
            }
        }
    }
    Ok(())
}
