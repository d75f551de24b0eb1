use crate::{
    commands::admin_email,
    db::{
        audit::{AuditAction, AuditLog, AuditRecord, EntityType},
        db::Db,
        violations::{ViolationFilter, ViolationKind, Violations},
    },
    libs::{
        export::{ExportFormat, Exporter},
        formatter::parse_date,
        messages::Message,
        view::View,
    },
    msg_info, msg_success,
};
use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ViolationsArgs {
    /// Only this user
    #[arg(short, long)]
    email: Option<String>,
    /// First day, `YYYY-MM-DD`
    #[arg(long)]
    from: Option<String>,
    /// Last day, `YYYY-MM-DD`
    #[arg(long)]
    to: Option<String>,
    /// OVER_LIMIT, QUOTA_EXCEEDED, OUT_OF_WINDOW or NO_SCHEDULE
    #[arg(short = 't', long = "type")]
    kind: Option<String>,
    /// Write the result to a CSV file instead of printing it
    #[arg(long, conflicts_with = "json")]
    csv: Option<PathBuf>,
    /// Write the result to a JSON file instead of printing it
    #[arg(long)]
    json: Option<PathBuf>,
    /// Administrator recorded in the audit log for exports
    #[arg(long)]
    admin: Option<String>,
}

pub fn cmd(args: ViolationsArgs) -> Result<()> {
    let db = Db::new()?;
    let filter = ViolationFilter {
        email: args.email.clone(),
        from: args.from.as_deref().map(parse_date).transpose()?,
        to: args.to.as_deref().map(parse_date).transpose()?,
        kind: args.kind.as_deref().map(str::parse::<ViolationKind>).transpose()?,
    };
    let violations = Violations::new(&db.conn).list(&filter)?;

    let export = match (args.csv, args.json) {
        (Some(path), _) => Some(Exporter::new(ExportFormat::Csv, Some(path))),
        (None, Some(path)) => Some(Exporter::new(ExportFormat::Json, Some(path))),
        (None, None) => None,
    };

    match export {
        Some(exporter) => {
            let count = exporter.export_violations(&violations)?;
            let path = exporter.output_path().display().to_string();
            let record = AuditRecord::new(AuditAction::Export, EntityType::Violation, path.clone()).after(&json!({
                "count": count,
                "email": args.email,
                "from": args.from,
                "to": args.to,
                "type": args.kind,
            }));
            AuditLog::new(&db.conn, &admin_email(args.admin)).log_action(&record);
            msg_success!(Message::ViolationsExported(path, count));
        }
        None if violations.is_empty() => msg_info!(Message::NoViolations),
        None => View::violations(&violations),
    }
    Ok(())
}
