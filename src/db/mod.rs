//! Database layer for breakwatch.
//!
//! One SQLite connection ([`db::Db`]) is shared by every repository; each
//! repository borrows it (`Users::new(&db.conn)`), so several repositories can
//! work inside the same transaction. The schema itself lives in
//! [`migrations`].
//!
//! ## Usage
//!
//! ```rust
//! use breakwatch::db::{db::Db, users::{NewUser, Users}, sessions::WorkSessions};
//! use chrono::NaiveDate;
//!
//! let db = Db::open_in_memory()?;
//! Users::new(&db.conn).upsert(&NewUser {
//!     email: "jane@example.com".into(),
//!     name: "Jane".into(),
//!     ..Default::default()
//! })?;
//! let login = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! WorkSessions::new(&db.conn).start("jane@example.com", "s-1", login, None)?;
//! # Ok::<(), breakwatch::libs::error::TrackerError>(())
//! ```
//!
//! ## Components
//!
//! - **Session store**: [`users`], [`sessions`]
//! - **Break store**: [`schedules`], [`assignments`], [`break_log`]
//! - **Violations**: [`violations`]
//! - **Audit and notifications**: [`audit`], [`notifications`]
//! - **Schema**: [`migrations`] for SQLite, [`schema`] for both backends

/// Connection setup and the data file location.
pub mod db;

/// Versioned SQLite schema.
pub mod migrations;

pub mod schema;

pub mod users;

pub mod sessions;

/// Break schedules with their limits and windows.
pub mod schedules;

pub mod assignments;

/// Opened and closed breaks.
pub mod break_log;

pub mod violations;

pub mod audit;

/// Notification cooldowns and the application log table.
pub mod notifications;
