//! Human-readable text for every [`Message`] variant.
//!
//! All user-facing strings live here so that command handlers and services
//! only ever refer to message variants.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === CONFIG MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleTracking => "Break tracking settings".to_string(),
            Message::ConfigModuleDatabase => "Database settings".to_string(),
            Message::ConfigModuleNotifications => "Notification settings".to_string(),
            Message::PromptSelectModules => "Select the sections to configure".to_string(),
            Message::PromptUnassignedPolicy => "Policy for users without a schedule".to_string(),
            Message::PromptGraceMinutes => "Minutes allowed over a break limit before it counts as a violation".to_string(),
            Message::PromptDefaultBreakMinutes => "Default break length (minutes)".to_string(),
            Message::PromptDefaultBreakCount => "Default breaks per day".to_string(),
            Message::PromptDefaultLunchMinutes => "Default lunch length (minutes)".to_string(),
            Message::PromptDefaultLunchCount => "Default lunches per day".to_string(),
            Message::ValueMustBePositive => "Value must be greater than zero".to_string(),
            Message::InvalidDefaultLimit(break_type) => {
                format!("Default limit for '{}' needs a positive length and daily count", break_type)
            }
            Message::PromptBusyTimeout => "SQLite busy timeout (milliseconds)".to_string(),
            Message::PromptEnableWal => "Use write-ahead logging".to_string(),
            Message::PromptNotificationCooldown => "Default notification cooldown (seconds)".to_string(),

            // === USER MESSAGES ===
            Message::UserImported(email) => format!("User {} imported", email),
            Message::UsersImportedCount(count) => format!("Imported {} user(s)", count),
            Message::UserDeactivated(email) => format!("User {} deactivated", email),
            Message::UserReactivated(email) => format!("User {} reactivated", email),
            Message::UsersNotFound => "No users found".to_string(),

            // === SESSION MESSAGES ===
            Message::SessionStarted(session_id) => format!("Session {} started", session_id),
            Message::SessionEnded(session_id, minutes) => format!("Session {} ended after {} min", session_id, minutes),
            Message::SessionForcedLogout(session_id) => format!("Session {} was force-closed", session_id),
            Message::NoActiveSessions => "No active sessions".to_string(),
            Message::NoActiveSessionFor(email) => format!("No active session for {}", email),
            Message::NoSessionsFor(email, date) => format!("No sessions for {} on {}", email, date),

            // === SCHEDULE MESSAGES ===
            Message::ScheduleCreated(id, name) => format!("Break schedule '{}' created (ID: {})", name, id),
            Message::ScheduleDeleted(id) => format!("Break schedule {} deleted", id),
            Message::ScheduleUpdated(id, name) => format!("Break schedule {} '{}' updated", id, name),
            Message::ScheduleActivated(id) => format!("Break schedule {} activated", id),
            Message::ScheduleDeactivated(id) => format!("Break schedule {} deactivated; assigned users fall back to the defaults", id),
            Message::ScheduleAssigned(email, name) => format!("Schedule '{}' assigned to {}", name, email),
            Message::ScheduleUnassigned(email) => format!("Schedule unassigned from {}", email),
            Message::ScheduleNotAssigned(email) => format!("{} has no schedule assigned", email),
            Message::NoSchedules => "No break schedules defined".to_string(),
            Message::NoAssignments => "No schedule assignments".to_string(),
            Message::ScheduleNotFound(schedule) => format!("Break schedule '{}' not found", schedule),
            Message::InvalidShiftSpec(spec) => format!("Invalid shift '{}', expected HH:MM-HH:MM", spec),
            Message::ScheduleLimitsHeader => "Limits:".to_string(),
            Message::ScheduleWindowsHeader => "Windows:".to_string(),
            Message::InvalidLimitSpec(spec) => format!("Invalid limit '{}', expected TYPE:MINUTES[:COUNT]", spec),
            Message::InvalidWindowSpec(spec) => format!("Invalid window '{}', expected TYPE:HH:MM-HH:MM[:PRIORITY]", spec),

            // === BREAK MESSAGES ===
            Message::BreakStarted(break_type) => format!("{} started", break_type),
            Message::BreakEnded(break_type, minutes) => format!("{} ended, duration {} min", break_type, minutes),
            Message::BreakOverLimit(excess) => format!("Break limit exceeded by {} min", excess),
            Message::BreakAutoClosed(id) => format!("Open break {} closed together with the session", id),
            Message::NoBreaksForDate(date) => format!("No breaks recorded for {}", date),
            Message::NoActiveBreakFor(email) => format!("No active break for {}", email),
            Message::NoActiveBreaks => "Nobody is on a break".to_string(),
            Message::ActiveBreak(break_type, start, elapsed) => {
                format!("Active {} since {} ({} min)", break_type, start, elapsed)
            }
            Message::BreakUsage(break_type, used, count, minutes) => {
                format!("{}: {}/{} used today, {} min each", break_type, used, count, minutes)
            }

            // === VIOLATION MESSAGES ===
            Message::ViolationLogged(kind, email) => format!("Violation {} logged for {}", kind, email),
            Message::NoViolations => "No violations found".to_string(),
            Message::ViolationsExported(path, count) => format!("Exported {} violation(s) to {}", count, path),
            Message::UnassignedBreakAllowed(email) => {
                format!("{} has no schedule assigned, break allowed with default limits", email)
            }

            // === AUDIT MESSAGES ===
            Message::AuditWriteFailed(error) => format!("Failed to write audit log: {}", error),
            Message::NoAuditEntries => "No audit entries found".to_string(),
            Message::AuditStatsHeader => "Audit statistics".to_string(),
            Message::AuditTotal(total) => format!("Total actions: {}", total),

            // === NOTIFICATION MESSAGES ===
            Message::NotificationSuppressed(rule, email) => {
                format!("Notification '{}' for {} suppressed by cooldown", rule, email)
            }

            Message::NotificationSent(rule, email) => format!("Notification '{}' for {} may be sent", rule, email),
            Message::NoAppLogs => "Application log is empty".to_string(),

            // === DATABASE MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("✓ Migration v{} completed", version),
            Message::MigrationFailed(version, error) => format!("✗ Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DatabaseVersion(version) => format!("Current database version: {}", version),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database schema needs to be updated".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
            Message::NothingToRollback => "Nothing to rollback".to_string(),
            Message::RollingBack(from, to) => format!("Rolling back from v{} to v{}", from, to),
            Message::RollbackCompleted(version) => format!("Rollback to v{} completed", version),
        };

        write!(f, "{}", text)
    }
}
