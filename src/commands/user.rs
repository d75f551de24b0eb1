use crate::{
    commands::admin_email,
    db::{
        db::Db,
        users::{NewUser, Users},
    },
    libs::{admin::Admin, config::Config, messages::Message, view::View},
    msg_info, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
    /// Administrator recorded in the audit log
    #[arg(long, global = true)]
    admin: Option<String>,
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Create or update a single user
    Add {
        email: String,
        name: String,
        #[arg(short, long)]
        role: Option<String>,
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Import users from a CSV file with an `email,name[,role][,group]` header
    Import {
        file: PathBuf,
    },
    /// List users
    List {
        /// Include deactivated users
        #[arg(short, long)]
        all: bool,
    },
    /// Deactivate a user; users are never deleted
    Deactivate {
        email: String,
    },
    /// Reactivate a deactivated user
    Reactivate {
        email: String,
    },
}

#[derive(Debug, Deserialize)]
struct UserRow {
    email: String,
    name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "group_name")]
    group: Option<String>,
}

impl From<UserRow> for NewUser {
    fn from(row: UserRow) -> Self {
        NewUser {
            email: row.email,
            name: row.name,
            role: row.role.filter(|r| !r.trim().is_empty()),
            group_name: row.group.filter(|g| !g.trim().is_empty()),
        }
    }
}

pub fn cmd(args: UserArgs) -> Result<()> {
    let db = Db::new()?;
    let admin = Admin::new(&db.conn, &admin_email(args.admin), Config::read()?.tracking_or_default());

    match args.command {
        UserCommand::Add { email, name, role, group } => {
            let users = admin.import_users(&[NewUser {
                email,
                name,
                role,
                group_name: group,
            }])?;
            for user in users {
                msg_success!(Message::UserImported(user.email));
            }
        }
        UserCommand::Import { file } => {
            let rows = read_users(&file)?;
            let users = admin.import_users(&rows)?;
            msg_success!(Message::UsersImportedCount(users.len()));
        }
        UserCommand::List { all } => {
            let users = Users::new(&db.conn).list(!all)?;
            if users.is_empty() {
                msg_info!(Message::UsersNotFound);
            } else {
                View::users(&users);
            }
        }
        UserCommand::Deactivate { email } => {
            let user = admin.deactivate_user(&email)?;
            msg_success!(Message::UserDeactivated(user.email));
        }
        UserCommand::Reactivate { email } => {
            let user = admin.reactivate_user(&email)?;
            msg_success!(Message::UserReactivated(user.email));
        }
    }
    Ok(())
}

fn read_users(path: &Path) -> Result<Vec<NewUser>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut users = Vec::new();
    for row in reader.deserialize::<UserRow>() {
        users.push(row?.into());
    }
    Ok(users)
}
