use crate::{
    db::{
        db::Db,
        notifications::{AppLogs, LogLevel, RuleLastSent},
    },
    libs::{config::Config, messages::Message, view::View},
    msg_info, msg_success,
};
use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct NotifyArgs {
    #[command(subcommand)]
    command: NotifyCommand,
}

#[derive(Debug, Subcommand)]
enum NotifyCommand {
    /// Decide whether a rule may fire now and record it when it does
    Check {
        rule_id: String,
        #[arg(short, long, default_value = "")]
        email: String,
        #[arg(short, long, default_value = "")]
        context: String,
        /// Seconds between two sends; the configured default when omitted
        #[arg(long)]
        cooldown: Option<i64>,
    },
    /// Show the newest application log entries
    Logs {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
}

pub fn cmd(args: NotifyArgs) -> Result<()> {
    let db = Db::new()?;

    match args.command {
        NotifyCommand::Check {
            rule_id,
            email,
            context,
            cooldown,
        } => {
            let cooldown = cooldown.unwrap_or(Config::read()?.notifications_or_default().cooldown_secs);
            let now = Utc::now();
            let rules = RuleLastSent::new(&db.conn);
            let logs = AppLogs::new(&db.conn);

            if rules.should_send(&rule_id, &email, &context, cooldown, now)? {
                rules.touch(&rule_id, &email, &context, now)?;
                logs.write(LogLevel::Info, &format!("notification {} sent to {}", rule_id, email))?;
                msg_success!(Message::NotificationSent(rule_id, email));
            } else {
                logs.write(LogLevel::Debug, &format!("notification {} for {} suppressed", rule_id, email))?;
                msg_info!(Message::NotificationSuppressed(rule_id, email));
            }
        }
        NotifyCommand::Logs { limit } => {
            let entries = AppLogs::new(&db.conn).recent(limit)?;
            if entries.is_empty() {
                msg_info!(Message::NoAppLogs);
            } else {
                View::app_logs(&entries);
            }
        }
    }
    Ok(())
}
