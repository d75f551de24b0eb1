//! DDL for the two supported backends.
//!
//! SQLite is what the crate runs on; the PostgreSQL script is shipped for
//! the hosted (Supabase) deployment and keeps the same table and column
//! names and the same cascade rules.

use crate::db::migrations::MigrationManager;
use clap::ValueEnum;
use std::fmt;

const POSTGRES_SCHEMA: &str = include_str!("../../sql/postgres/001_schema.sql");

/// Tables every backend must define, in dependency order.
pub const TABLES: [&str; 11] = [
    "users",
    "work_sessions",
    "break_schedules",
    "break_limits",
    "break_windows",
    "user_break_assignments",
    "break_log",
    "violations",
    "audit_log",
    "rule_last_sent",
    "app_logs",
];

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Complete DDL script for `backend`.
pub fn ddl(backend: Backend) -> String {
    match backend {
        Backend::Sqlite => MigrationManager::new().sql_script(),
        Backend::Postgres => POSTGRES_SCHEMA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_backends_define_every_table() {
        for backend in [Backend::Sqlite, Backend::Postgres] {
            let script = ddl(backend);
            for table in TABLES {
                let needle = format!("CREATE TABLE IF NOT EXISTS {} (", table);
                assert!(script.contains(&needle), "{} missing from {} schema", table, backend);
            }
        }
    }

    #[test]
    fn both_backends_cascade_schedule_children() {
        for backend in [Backend::Sqlite, Backend::Postgres] {
            let script = ddl(backend);
            assert_eq!(
                script.matches("REFERENCES break_schedules(id) ON DELETE CASCADE").count(),
                3,
                "{} schema",
                backend
            );
        }
    }
}
