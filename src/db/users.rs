use crate::libs::error::{TrackerError, TrackerResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const UPSERT: &str = "INSERT INTO users (email, name, role, group_name, is_active) VALUES (?1, ?2, ?3, ?4, 1)
    ON CONFLICT(email) DO UPDATE SET name = excluded.name, role = excluded.role, group_name = excluded.group_name";
const SELECT_COLUMNS: &str = "SELECT id, email, name, role, group_name, is_active, created_at, updated_at FROM users";
const SET_ACTIVE: &str = "UPDATE users SET is_active = ?1 WHERE email = ?2";

pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub group_name: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role: row.get(3)?,
            group_name: row.get(4)?,
            is_active: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

/// Fields an administrator supplies when importing a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    pub group_name: Option<String>,
}

/// Lower-cases and trims an email, rejecting anything that is not `local@domain.tld`.
pub fn normalize_email(email: &str) -> TrackerResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(TrackerError::InvalidEmail(email))
    }
}

pub struct Users<'a> {
    conn: &'a Connection,
}

impl<'a> Users<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Users { conn }
    }

    /// Creates the user or refreshes name, role and group of an existing one.
    ///
    /// Re-importing never changes `is_active`; a deactivated user stays
    /// deactivated until explicitly reactivated.
    pub fn upsert(&self, user: &NewUser) -> TrackerResult<User> {
        let email = normalize_email(&user.email)?;
        let name = user.name.trim();
        if name.is_empty() {
            return Err(TrackerError::InvalidInput(format!("empty name for {}", email)));
        }
        let role = user.role.as_deref().map(str::trim).filter(|r| !r.is_empty()).unwrap_or(DEFAULT_ROLE);
        self.conn.execute(UPSERT, params![email, name, role, user.group_name])?;
        self.get_by_email(&email)?.ok_or(TrackerError::UserNotFound(email))
    }

    pub fn get_by_email(&self, email: &str) -> TrackerResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let user = self
            .conn
            .query_row(&format!("{} WHERE email = ?1", SELECT_COLUMNS), [&email], User::from_row)
            .optional()?;
        Ok(user)
    }

    /// Like [`get_by_email`](Self::get_by_email) but errors for unknown or
    /// deactivated users.
    pub fn require_active(&self, email: &str) -> TrackerResult<User> {
        match self.get_by_email(email)? {
            Some(user) if user.is_active => Ok(user),
            Some(user) => Err(TrackerError::UserInactive(user.email)),
            None => Err(TrackerError::UserNotFound(email.trim().to_lowercase())),
        }
    }

    pub fn list(&self, active_only: bool) -> TrackerResult<Vec<User>> {
        let sql = if active_only {
            format!("{} WHERE is_active = 1 ORDER BY email", SELECT_COLUMNS)
        } else {
            format!("{} ORDER BY email", SELECT_COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt.query_map([], User::from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn deactivate(&self, email: &str) -> TrackerResult<User> {
        self.set_active(email, false)
    }

    pub fn reactivate(&self, email: &str) -> TrackerResult<User> {
        self.set_active(email, true)
    }

    fn set_active(&self, email: &str, active: bool) -> TrackerResult<User> {
        let email = email.trim().to_lowercase();
        let updated = self.conn.execute(SET_ACTIVE, params![active, email])?;
        if updated == 0 {
            return Err(TrackerError::UserNotFound(email));
        }
        self.get_by_email(&email)?.ok_or(TrackerError::UserNotFound(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM ").unwrap(), "jane.doe@example.com");
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["", "jane", "@example.com", "jane@", "jane@example", "ja ne@example.com", "a@b@c.com"] {
            assert!(normalize_email(bad).is_err(), "{}", bad);
        }
    }
}
