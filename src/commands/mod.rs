pub mod audit;
pub mod breaks;
pub mod init;
pub mod migrations;
pub mod notify;
pub mod schedule;
pub mod schema;
pub mod session;
pub mod user;
pub mod violations;

use crate::libs::formatter::{parse_date, parse_datetime};
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use clap::{Parser, Subcommand};
use std::env;

/// Environment variable naming the administrator recorded in the audit log.
pub const ADMIN_ENV: &str = "BREAKWATCH_ADMIN";
const DEFAULT_ADMIN: &str = "admin@localhost";

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Import, list and deactivate users")]
    User(user::UserArgs),
    #[command(about = "Start and end work sessions")]
    Session(session::SessionArgs),
    #[command(about = "Manage break schedules and assignments")]
    Schedule(schedule::ScheduleArgs),
    #[command(about = "Start and end breaks")]
    Break(breaks::BreakArgs),
    #[command(about = "List or export violations")]
    Violations(violations::ViolationsArgs),
    #[command(about = "Inspect the administrative audit log")]
    Audit(audit::AuditArgs),
    #[command(about = "Notification cooldowns and the application log")]
    Notify(notify::NotifyArgs),
    #[command(about = "Database migrations")]
    Migrations(migrations::MigrationsArgs),
    #[command(about = "Print the DDL for a database backend")]
    Schema(schema::SchemaArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::User(args) => user::cmd(args),
            Commands::Session(args) => session::cmd(args),
            Commands::Schedule(args) => schedule::cmd(args),
            Commands::Break(args) => breaks::cmd(args),
            Commands::Violations(args) => violations::cmd(args),
            Commands::Audit(args) => audit::cmd(args),
            Commands::Notify(args) => notify::cmd(args),
            Commands::Migrations(args) => migrations::cmd(args),
            Commands::Schema(args) => schema::cmd(args),
        }
    }
}

/// Administrator for audit entries: `--admin`, then `BREAKWATCH_ADMIN`.
pub(crate) fn admin_email(flag: Option<String>) -> String {
    flag.or_else(|| env::var(ADMIN_ENV).ok())
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN.to_string())
}

/// `--at` timestamp, or now.
pub(crate) fn at_or_now(at: Option<String>) -> Result<NaiveDateTime> {
    match at {
        Some(value) => Ok(parse_datetime(&value)?),
        None => {
            // stored timestamps carry whole seconds
            let now = Local::now().naive_local();
            Ok(now.with_nanosecond(0).unwrap_or(now))
        }
    }
}

/// `--date`, or today.
pub(crate) fn date_or_today(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(value) => Ok(parse_date(&value)?),
        None => Ok(Local::now().date_naive()),
    }
}
