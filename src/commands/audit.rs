use crate::{
    commands::admin_email,
    db::{audit::AuditLog, db::Db},
    libs::{formatter::parse_datetime, messages::Message, view::View},
    msg_info, msg_print,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    command: AuditCommand,
}

#[derive(Debug, Subcommand)]
enum AuditCommand {
    /// Entries from the last hours
    Recent {
        #[arg(long, default_value_t = 24)]
        hours: i64,
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// History of one entity, e.g. `USER jane@example.com`
    Entity {
        entity_type: String,
        entity_id: String,
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Entries written by one administrator
    Admin {
        email: String,
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,
    },
    /// Counts by action and entity type
    Stats {
        /// From, `YYYY-MM-DD HH:MM:SS`
        #[arg(long)]
        from: Option<String>,
        /// To, `YYYY-MM-DD HH:MM:SS`
        #[arg(long)]
        to: Option<String>,
    },
}

pub fn cmd(args: AuditArgs) -> Result<()> {
    let db = Db::new()?;
    // reads do not depend on who is asking
    let audit = AuditLog::new(&db.conn, &admin_email(None));

    let entries = match args.command {
        AuditCommand::Recent { hours, limit } => audit.recent(hours, limit)?,
        AuditCommand::Entity {
            entity_type,
            entity_id,
            limit,
        } => audit.entity_history(&entity_type, &entity_id, limit)?,
        AuditCommand::Admin { email, limit } => audit.by_admin(&email, limit)?,
        AuditCommand::Stats { from, to } => {
            let from = from.as_deref().map(parse_datetime).transpose()?;
            let to = to.as_deref().map(parse_datetime).transpose()?;
            let stats = audit.statistics(from, to)?;

            msg_print!(Message::AuditStatsHeader, true);
            msg_print!(Message::AuditTotal(stats.total));
            View::counts("ACTION", &stats.by_action.into_iter().collect::<Vec<_>>());
            View::counts("ENTITY", &stats.by_entity_type.into_iter().collect::<Vec<_>>());
            return Ok(());
        }
    };

    if entries.is_empty() {
        msg_info!(Message::NoAuditEntries);
    } else {
        View::audit(&entries);
    }
    Ok(())
}
