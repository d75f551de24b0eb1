//! Interactive configuration wizard.

use crate::{
    commands::admin_email,
    db::{
        audit::{AuditAction, AuditLog, AuditRecord, EntityType},
        db::Db,
    },
    libs::{config::Config, messages::Message},
    msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Remove the existing configuration instead of creating a new one
    #[arg(short, long)]
    delete: bool,
    /// Administrator recorded in the audit log
    #[arg(long)]
    admin: Option<String>,
}

pub fn cmd(args: InitArgs) -> Result<()> {
    let before = Config::read().unwrap_or_default();

    let after = if args.delete {
        Config::delete()?;
        None
    } else {
        let config = Config::init()?;
        config.save()?;
        Some(config)
    };

    let db = Db::new()?;
    let mut record = AuditRecord::new(AuditAction::ConfigChange, EntityType::Config, "config.json").before(&before);
    if let Some(after) = &after {
        record = record.after(after);
    }
    AuditLog::new(&db.conn, &admin_email(args.admin)).log_action(&record);

    if after.is_some() {
        msg_success!(Message::ConfigSaved);
    }
    Ok(())
}
