use crate::{
    commands::{admin_email, at_or_now, date_or_today},
    db::{
        db::Db,
        sessions::{SessionStatus, WorkSessions},
    },
    libs::{
        admin::Admin,
        config::Config,
        formatter::format_date,
        messages::Message,
        tracker::{BreakTracker, SessionClose},
        view::View,
    },
    msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Open a work session (login)
    Start {
        email: String,
        /// Session identifier; generated from the login time when omitted
        #[arg(long)]
        id: Option<String>,
        /// Login time, `YYYY-MM-DD HH:MM:SS`
        #[arg(long)]
        at: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Close a work session (logout); an open break is closed with it
    End {
        session_id: String,
        #[arg(long)]
        at: Option<String>,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Close another user's session as an administrator
    ForceLogout {
        session_id: String,
        #[arg(long)]
        at: Option<String>,
        #[arg(short, long)]
        reason: Option<String>,
        #[arg(long)]
        admin: Option<String>,
    },
    /// Show all open sessions
    Active,
    /// Show one user's sessions for a day
    List {
        email: String,
        /// Day, `YYYY-MM-DD`; today when omitted
        #[arg(short, long)]
        date: Option<String>,
    },
}

pub fn cmd(args: SessionArgs) -> Result<()> {
    let db = Db::new()?;
    let tracking = Config::read()?.tracking_or_default();

    match args.command {
        SessionCommand::Start { email, id, at, comment } => {
            let login = at_or_now(at)?;
            let session_id = id.unwrap_or_else(|| format!("{}-{}", login.format("%Y%m%d%H%M%S"), email.trim().to_lowercase()));
            let session = WorkSessions::new(&db.conn).start(&email, &session_id, login, comment.as_deref())?;
            msg_success!(Message::SessionStarted(session.session_id));
        }
        SessionCommand::End { session_id, at, reason } => {
            let closed = BreakTracker::new(&db.conn, tracking).end_session(
                &session_id,
                at_or_now(at)?,
                SessionStatus::Completed,
                reason.as_deref(),
            )?;
            report_close(&closed);
        }
        SessionCommand::ForceLogout { session_id, at, reason, admin } => {
            let closed = Admin::new(&db.conn, &admin_email(admin), tracking).force_logout(
                &session_id,
                at_or_now(at)?,
                reason.as_deref(),
            )?;
            msg_warning!(Message::SessionForcedLogout(closed.session.session_id.clone()));
            report_close(&closed);
        }
        SessionCommand::Active => {
            let sessions = WorkSessions::new(&db.conn).list_active()?;
            if sessions.is_empty() {
                msg_info!(Message::NoActiveSessions);
            } else {
                View::active_sessions(&sessions);
            }
        }
        SessionCommand::List { email, date } => {
            let date = date_or_today(date)?;
            let sessions = WorkSessions::new(&db.conn).list_for_user(&email, date)?;
            if sessions.is_empty() {
                msg_info!(Message::NoSessionsFor(email, format_date(&date)));
            } else {
                View::sessions(&sessions);
            }
        }
    }
    Ok(())
}

fn report_close(closed: &SessionClose) {
    if let Some(outcome) = &closed.closed_break {
        msg_info!(Message::BreakAutoClosed(outcome.record.id));
        if let Some(excess) = outcome.excess_minutes {
            msg_warning!(Message::BreakOverLimit(excess));
        }
    }
    msg_success!(Message::SessionEnded(
        closed.session.session_id.clone(),
        closed.session.duration_minutes.unwrap_or(0)
    ));
}
