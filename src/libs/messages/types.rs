#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIG MESSAGES ===
    ConfigSaved,
    ConfigModuleTracking,
    ConfigModuleDatabase,
    ConfigModuleNotifications,
    PromptSelectModules,
    PromptUnassignedPolicy,
    PromptGraceMinutes,
    PromptDefaultBreakMinutes,
    PromptDefaultBreakCount,
    PromptDefaultLunchMinutes,
    PromptDefaultLunchCount,
    ValueMustBePositive,
    InvalidDefaultLimit(String),
    PromptBusyTimeout,
    PromptEnableWal,
    PromptNotificationCooldown,

    // === USER MESSAGES ===
    UserImported(String),
    UsersImportedCount(usize),
    UserDeactivated(String),
    UserReactivated(String),
    UsersNotFound,

    // === SESSION MESSAGES ===
    SessionStarted(String),
    SessionEnded(String, i64),
    SessionForcedLogout(String),
    NoActiveSessions,
    NoActiveSessionFor(String),
    NoSessionsFor(String, String),

    // === SCHEDULE MESSAGES ===
    ScheduleCreated(i64, String),
    ScheduleDeleted(i64),
    ScheduleUpdated(i64, String),
    ScheduleActivated(i64),
    ScheduleDeactivated(i64),
    ScheduleAssigned(String, String),
    ScheduleUnassigned(String),
    ScheduleNotAssigned(String),
    NoSchedules,
    NoAssignments,
    ScheduleNotFound(String),
    InvalidShiftSpec(String),
    ScheduleLimitsHeader,
    ScheduleWindowsHeader,
    InvalidLimitSpec(String),
    InvalidWindowSpec(String),

    // === BREAK MESSAGES ===
    BreakStarted(String),
    BreakEnded(String, i64),
    BreakOverLimit(i64),
    BreakAutoClosed(i64),
    NoBreaksForDate(String),
    NoActiveBreakFor(String),
    NoActiveBreaks,
    ActiveBreak(String, String, i64),
    BreakUsage(String, i64, i64, i64),

    // === VIOLATION MESSAGES ===
    ViolationLogged(String, String),
    NoViolations,
    ViolationsExported(String, usize),
    UnassignedBreakAllowed(String),

    // === AUDIT MESSAGES ===
    AuditWriteFailed(String),
    NoAuditEntries,
    AuditStatsHeader,
    AuditTotal(i64),

    // === NOTIFICATION MESSAGES ===
    NotificationSuppressed(String, String),
    NotificationSent(String, String),
    NoAppLogs,

    // === DATABASE MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String),
    MigrationCompleted(u32),
    MigrationFailed(u32, String),
    AllMigrationsCompleted,
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory,
    NothingToRollback,
    RollingBack(u32, u32),
    RollbackCompleted(u32),
}
