use crate::db::migrations::init_with_migrations;
use crate::libs::config::{Config, DatabaseConfig};
use crate::libs::data_storage::DataStorage;
use crate::libs::error::TrackerResult;
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "breakwatch.db";

/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "BREAKWATCH_DB";

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the application database and applies pending migrations.
    pub fn new() -> TrackerResult<Db> {
        let settings = match Config::read() {
            Ok(config) => config.database_or_default(),
            Err(e) => {
                tracing::warn!("failed to read configuration, using database defaults: {}", e);
                DatabaseConfig::default()
            }
        };
        Self::open(&Self::path()?, &settings)
    }

    /// Opens a database file with the given settings and applies pending migrations.
    pub fn open(path: &Path, settings: &DatabaseConfig) -> TrackerResult<Db> {
        let mut conn = Connection::open(path)?;
        configure(&conn, settings, true)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    /// Fresh in-memory database with the full schema.
    pub fn open_in_memory() -> TrackerResult<Db> {
        let mut conn = Connection::open_in_memory()?;
        configure(&conn, &DatabaseConfig::default(), false)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    /// Connection to the application database without running migrations.
    ///
    /// Used by the `migrations` command to inspect the schema as it is.
    pub fn new_without_migrations() -> TrackerResult<Connection> {
        let conn = Connection::open(Self::path()?)?;
        configure(&conn, &DatabaseConfig::default(), true)?;
        Ok(conn)
    }

    /// Database location: `BREAKWATCH_DB` if set, otherwise the data directory.
    pub fn path() -> TrackerResult<PathBuf> {
        match env::var(DB_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(DataStorage::new().get_path(DB_FILE_NAME)?),
        }
    }
}

/// Per-connection pragmas. Foreign keys are off by default in SQLite and
/// the cascade rules depend on them.
fn configure(conn: &Connection, settings: &DatabaseConfig, file_backed: bool) -> TrackerResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
    if file_backed && settings.wal {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        tracing::debug!("journal mode: {}", mode);
    }
    Ok(())
}
