//! Services and shared infrastructure for breakwatch.
//!
//! ## Features
//!
//! - **Break lifecycle**: [`tracker`] combines the stores, [`rules`] holds the pure policy
//! - **Administration**: [`admin`] wraps every administrative change with an audit entry
//! - **Core infrastructure**: configuration, data storage, errors, logging, messages
//! - **User interface**: console tables, violation export, formatting

pub mod admin;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod export;
pub mod formatter;
pub mod logging;
pub mod messages;
pub mod rules;
pub mod tracker;
pub mod view;
