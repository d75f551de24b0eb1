//! # breakwatch - work session and break lifecycle tracking
//!
//! The data model behind a desktop work-time tracker: users, login/logout
//! sessions, break schedules with limits and windows, a break log with
//! violation detection, and an append-only audit trail of administrative
//! changes.
//!
//! ## Features
//!
//! - **Sessions**: at most one open session per user, logout written once
//! - **Break schedules**: per-type limits, daily counts and time windows
//! - **Violations**: over limit, daily quota, out of window, no schedule
//! - **Audit**: every administrative change with before/after snapshots
//! - **Schema**: SQLite migrations and the equivalent PostgreSQL DDL
//!
//! ## Usage
//!
//! ```rust
//! use breakwatch::db::db::Db;
//! use breakwatch::db::users::{NewUser, Users};
//! use breakwatch::libs::config::TrackingConfig;
//! use breakwatch::libs::tracker::BreakTracker;
//! use chrono::NaiveDate;
//!
//! let db = Db::open_in_memory()?;
//! Users::new(&db.conn).upsert(&NewUser {
//!     email: "jane@example.com".into(),
//!     name: "Jane".into(),
//!     ..Default::default()
//! })?;
//!
//! let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//! let tracker = BreakTracker::new(&db.conn, TrackingConfig::default());
//! tracker.start_break("jane@example.com", "Break", None, day.and_hms_opt(10, 0, 0).unwrap())?;
//! let outcome = tracker.end_break("jane@example.com", day.and_hms_opt(10, 20, 0).unwrap())?;
//! assert_eq!(outcome.excess_minutes, Some(5));
//! # Ok::<(), breakwatch::libs::error::TrackerError>(())
//! ```

pub mod commands;
pub mod db;
pub mod libs;
