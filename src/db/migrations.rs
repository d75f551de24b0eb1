//! Database schema migration management and versioning.
//!
//! Each migration is a batch of SQL applied inside the migration
//! transaction and recorded in the `migrations` table. The same SQL is what
//! [`schema`](crate::db::schema) prints for the SQLite backend, so the
//! migrations are the single definition of the SQLite schema.
//!
//! ## Usage
//!
//! ```rust
//! use breakwatch::db::migrations::{init_with_migrations, get_db_version};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open_in_memory()?;
//! init_with_migrations(&mut conn)?;
//! assert!(get_db_version(&conn)? > 0);
//! # Ok::<(), breakwatch::libs::error::TrackerError>(())
//! ```

use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error, msg_info, msg_success};
use rusqlite::{params, Connection};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// Users and the work session lifecycle.
const V1_USERS_AND_SESSIONS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    group_name TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime')),
    updated_at TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime'))
);

CREATE TABLE IF NOT EXISTS work_sessions (
    id INTEGER PRIMARY KEY,
    session_id TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    email TEXT NOT NULL,
    login_time TIMESTAMP NOT NULL,
    logout_time TIMESTAMP,
    duration_minutes INTEGER,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed', 'forced_logout')),
    logout_reason TEXT,
    comment TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_sessions_user_status ON work_sessions(user_id, status);
CREATE INDEX IF NOT EXISTS idx_work_sessions_login ON work_sessions(login_time);
CREATE UNIQUE INDEX IF NOT EXISTS idx_work_sessions_one_active
    ON work_sessions(user_id) WHERE status = 'active';

CREATE TRIGGER IF NOT EXISTS users_touch_updated_at
AFTER UPDATE ON users
FOR EACH ROW
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE users SET updated_at = datetime('now', 'localtime') WHERE id = NEW.id;
END;

CREATE TRIGGER IF NOT EXISTS users_no_delete
BEFORE DELETE ON users
BEGIN
    SELECT RAISE(ABORT, 'users are never deleted, deactivate instead');
END;

CREATE TRIGGER IF NOT EXISTS work_sessions_logout_immutable
BEFORE UPDATE OF logout_time ON work_sessions
FOR EACH ROW
WHEN OLD.logout_time IS NOT NULL AND NEW.logout_time IS NOT OLD.logout_time
BEGIN
    SELECT RAISE(ABORT, 'logout_time is immutable once set');
END;

CREATE TRIGGER IF NOT EXISTS work_sessions_fill_duration
AFTER UPDATE OF logout_time ON work_sessions
FOR EACH ROW
WHEN NEW.logout_time IS NOT NULL AND NEW.duration_minutes IS NULL
BEGIN
    UPDATE work_sessions
    SET duration_minutes =
        (CAST(ROUND((julianday(NEW.logout_time) - julianday(NEW.login_time)) * 86400) AS INTEGER) + 30) / 60
    WHERE id = NEW.id;
END;

CREATE VIEW IF NOT EXISTS active_sessions AS
    SELECT s.*, u.name FROM work_sessions s JOIN users u ON u.id = s.user_id
    WHERE s.status = 'active';
";

/// Break schedules with their limits, windows and user assignments.
const V2_BREAK_SCHEDULES: &str = "
CREATE TABLE IF NOT EXISTS break_schedules (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    shift_start TEXT NOT NULL,
    shift_end TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime')),
    updated_at TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime'))
);

CREATE TABLE IF NOT EXISTS break_limits (
    id INTEGER PRIMARY KEY,
    schedule_id INTEGER NOT NULL REFERENCES break_schedules(id) ON DELETE CASCADE,
    break_type TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
    daily_count INTEGER NOT NULL DEFAULT 1 CHECK (daily_count >= 0),
    position INTEGER NOT NULL DEFAULT 0,
    UNIQUE (schedule_id, break_type)
);

CREATE TABLE IF NOT EXISTS break_windows (
    id INTEGER PRIMARY KEY,
    schedule_id INTEGER NOT NULL REFERENCES break_schedules(id) ON DELETE CASCADE,
    break_type TEXT NOT NULL,
    window_start TEXT NOT NULL,
    window_end TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS user_break_assignments (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    schedule_id INTEGER NOT NULL REFERENCES break_schedules(id) ON DELETE CASCADE,
    assigned_by TEXT,
    assigned_at TIMESTAMP NOT NULL DEFAULT (datetime('now', 'localtime')),
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_break_limits_schedule ON break_limits(schedule_id);
CREATE INDEX IF NOT EXISTS idx_break_windows_schedule ON break_windows(schedule_id, break_type);
CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_one_active
    ON user_break_assignments(user_id) WHERE is_active = 1;

CREATE TRIGGER IF NOT EXISTS break_schedules_touch_updated_at
AFTER UPDATE ON break_schedules
FOR EACH ROW
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE break_schedules SET updated_at = datetime('now', 'localtime') WHERE id = NEW.id;
END;
";

/// Break log and the violations derived from it.
const V3_BREAK_LOG_AND_VIOLATIONS: &str = "
CREATE TABLE IF NOT EXISTS break_log (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    email TEXT NOT NULL,
    session_id TEXT,
    break_type TEXT NOT NULL,
    date DATE NOT NULL,
    start_time TIMESTAMP NOT NULL,
    end_time TIMESTAMP,
    duration_minutes INTEGER,
    limit_minutes INTEGER,
    status TEXT NOT NULL DEFAULT 'Active' CHECK (status IN ('Active', 'Completed')),
    is_over_limit INTEGER NOT NULL DEFAULT 0,
    in_window INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_break_log_user_date ON break_log(user_id, date);
CREATE INDEX IF NOT EXISTS idx_break_log_status ON break_log(status);
CREATE UNIQUE INDEX IF NOT EXISTS idx_break_log_one_active
    ON break_log(user_id) WHERE status = 'Active';

CREATE TRIGGER IF NOT EXISTS break_log_closed_frozen
BEFORE UPDATE ON break_log
FOR EACH ROW
WHEN OLD.end_time IS NOT NULL
    AND OLD.duration_minutes IS NOT NULL
    AND (NEW.end_time IS NOT OLD.end_time
        OR NEW.duration_minutes IS NOT OLD.duration_minutes
        OR NEW.status IS NOT OLD.status)
BEGIN
    SELECT RAISE(ABORT, 'closed break is frozen');
END;

CREATE TRIGGER IF NOT EXISTS break_log_fill_duration
AFTER UPDATE OF end_time ON break_log
FOR EACH ROW
WHEN NEW.end_time IS NOT NULL AND NEW.duration_minutes IS NULL
BEGIN
    UPDATE break_log
    SET duration_minutes =
        (CAST(ROUND((julianday(NEW.end_time) - julianday(NEW.start_time)) * 86400) AS INTEGER) + 30) / 60,
        status = 'Completed'
    WHERE id = NEW.id;
END;

CREATE VIEW IF NOT EXISTS active_breaks AS
    SELECT b.*, u.name FROM break_log b JOIN users u ON u.id = b.user_id
    WHERE b.status = 'Active';

CREATE TABLE IF NOT EXISTS violations (
    id INTEGER PRIMARY KEY,
    user_id INTEGER REFERENCES users(id),
    email TEXT NOT NULL,
    session_id TEXT,
    break_id INTEGER REFERENCES break_log(id) ON DELETE SET NULL,
    violation_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    break_type TEXT,
    expected_duration INTEGER,
    actual_duration INTEGER,
    excess_minutes INTEGER,
    timestamp TIMESTAMP NOT NULL,
    date DATE NOT NULL,
    details TEXT
);

CREATE INDEX IF NOT EXISTS idx_violations_email_date ON violations(email, date);
CREATE INDEX IF NOT EXISTS idx_violations_type ON violations(violation_type, date);
CREATE UNIQUE INDEX IF NOT EXISTS idx_violations_one_over_limit
    ON violations(break_id) WHERE violation_type = 'OVER_LIMIT';
";

/// Append-only administrative audit trail.
const V4_AUDIT_LOG: &str = "
CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    admin_email TEXT NOT NULL,
    action TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT,
    before_state TEXT,
    after_state TEXT,
    hostname TEXT,
    success INTEGER NOT NULL DEFAULT 1,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
CREATE INDEX IF NOT EXISTS idx_audit_admin ON audit_log(admin_email, timestamp);
CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_type, entity_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action, timestamp);

CREATE TRIGGER IF NOT EXISTS audit_log_no_update
BEFORE UPDATE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
BEFORE DELETE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;
";

/// Notification cooldown bookkeeping and the application log table.
const V5_NOTIFICATIONS_AND_APP_LOGS: &str = "
CREATE TABLE IF NOT EXISTS rule_last_sent (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id TEXT NOT NULL,
    email TEXT NOT NULL DEFAULT '',
    context TEXT NOT NULL DEFAULT '',
    last_sent_utc TEXT NOT NULL,
    UNIQUE (rule_id, email, context)
);

CREATE INDEX IF NOT EXISTS idx_rule_last_sent_user ON rule_last_sent(email);

CREATE TABLE IF NOT EXISTS app_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_app_logs_ts ON app_logs(ts);
";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Registry of every schema migration, in version order.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        self.add_migration(1, "create_users_and_sessions", V1_USERS_AND_SESSIONS);
        self.add_migration(2, "add_break_schedules", V2_BREAK_SCHEDULES);
        self.add_migration(3, "add_break_log_and_violations", V3_BREAK_LOG_AND_VIOLATIONS);
        self.add_migration(4, "add_audit_log", V4_AUDIT_LOG);
        self.add_migration(5, "add_notifications_and_app_logs", V5_NOTIFICATIONS_AND_APP_LOGS);
    }

    fn add_migration(&mut self, version: u32, name: &'static str, sql: &'static str) {
        self.migrations.push(Migration { version, name, sql });
    }

    /// Applies every pending migration in a single transaction.
    pub fn run_migrations(&self, conn: &mut Connection) -> TrackerResult<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!("Database is up to date");
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            if let Err(e) = tx.execute_batch(migration.sql) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(TrackerError::Migration(format!("v{} {}: {}", migration.version, migration.name, e)));
            }

            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
            msg_debug!(Message::MigrationCompleted(migration.version));
        }

        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    /// Highest applied version, 0 for an empty database.
    fn get_current_version(&self, conn: &Connection) -> TrackerResult<u32> {
        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap_or(Some(0));

        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> TrackerResult<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// `(version, name, applied_at)` for every applied migration.
    pub fn get_migration_history(&self, conn: &Connection) -> TrackerResult<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }

    /// The complete SQLite schema as one script, in migration order.
    pub fn sql_script(&self) -> String {
        self.migrations
            .iter()
            .map(|m| format!("-- v{}: {}\n{}", m.version, m.name, m.sql.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Forgets migration records above `target_version`.
    ///
    /// Schema objects are left in place; only the bookkeeping is rewound, so
    /// the next run re-applies the `IF NOT EXISTS` statements.
    pub fn rollback_to(&self, conn: &mut Connection, target_version: u32) -> TrackerResult<()> {
        let current_version = self.get_current_version(conn)?;

        if target_version >= current_version {
            msg_info!(Message::NothingToRollback);
            return Ok(());
        }

        msg_info!(Message::RollingBack(current_version, target_version));
        conn.execute("DELETE FROM migrations WHERE version > ?1", params![target_version])?;
        msg_success!(Message::RollbackCompleted(target_version));
        Ok(())
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> TrackerResult<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> TrackerResult<u32> {
    let manager = MigrationManager::new();
    conn.execute(MIGRATIONS_TABLE, [])?;
    manager.get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> TrackerResult<bool> {
    let manager = MigrationManager::new();
    let current = get_db_version(conn)?;
    Ok(current < manager.latest_version())
}
