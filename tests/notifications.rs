#[cfg(test)]
mod tests {
    use breakwatch::db::db::Db;
    use breakwatch::db::notifications::{AppLogs, LogLevel, RuleLastSent};
    use breakwatch::libs::config::DatabaseConfig;
    use breakwatch::libs::error::TrackerError;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct NotificationTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for NotificationTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            let db = Db::open(&temp_dir.path().join("notifications.db"), &DatabaseConfig::default()).unwrap();
            NotificationTestContext { _temp_dir: temp_dir, db }
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_first_notification_is_always_sent(ctx: &mut NotificationTestContext) {
        let rules = RuleLastSent::new(&ctx.db.conn);
        assert!(rules.last_sent("over_limit", "ann@example.com", "").unwrap().is_none());
        assert!(rules.should_send("over_limit", "ann@example.com", "", 600, noon()).unwrap());
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_cooldown_suppresses_repeats(ctx: &mut NotificationTestContext) {
        let rules = RuleLastSent::new(&ctx.db.conn);
        rules.touch("over_limit", "Ann@Example.com", "Break", noon()).unwrap();
        assert_eq!(rules.last_sent("over_limit", "ann@example.com", "Break").unwrap(), Some(noon()));

        let soon = noon() + Duration::seconds(599);
        let later = noon() + Duration::seconds(600);
        assert!(!rules.should_send("over_limit", "ann@example.com", "Break", 600, soon).unwrap());
        assert!(rules.should_send("over_limit", "ann@example.com", "Break", 600, later).unwrap());

        // Each (rule, user, context) key has its own clock.
        assert!(rules.should_send("over_limit", "ann@example.com", "Lunch", 600, soon).unwrap());
        assert!(rules.should_send("over_limit", "bob@example.com", "Break", 600, soon).unwrap());
        assert!(rules.should_send("quota", "ann@example.com", "Break", 600, soon).unwrap());
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_cooldown_is_at_least_one_second(ctx: &mut NotificationTestContext) {
        let rules = RuleLastSent::new(&ctx.db.conn);
        rules.touch("digest", "", "", noon()).unwrap();
        assert!(!rules.should_send("digest", "", "", 0, noon()).unwrap());
        assert!(!rules.should_send("digest", "", "", -5, noon()).unwrap());
        assert!(rules.should_send("digest", "", "", 0, noon() + Duration::seconds(1)).unwrap());
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_out_of_range_cooldown_is_an_error(ctx: &mut NotificationTestContext) {
        let rules = RuleLastSent::new(&ctx.db.conn);
        rules.touch("digest", "", "", noon()).unwrap();
        let result = rules.should_send("digest", "", "", i64::MAX, noon());
        assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_touch_moves_the_clock(ctx: &mut NotificationTestContext) {
        let rules = RuleLastSent::new(&ctx.db.conn);
        rules.touch("over_limit", "ann@example.com", "", noon()).unwrap();
        let next = noon() + Duration::hours(1);
        rules.touch("over_limit", "ann@example.com", "", next).unwrap();

        assert_eq!(rules.last_sent("over_limit", "ann@example.com", "").unwrap(), Some(next));
        let rows: i64 = ctx
            .db
            .conn
            .query_row("SELECT COUNT(*) FROM rule_last_sent", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test_context(NotificationTestContext)]
    #[test]
    fn test_app_logs_newest_first(ctx: &mut NotificationTestContext) {
        let logs = AppLogs::new(&ctx.db.conn);
        logs.write(LogLevel::Info, "first").unwrap();
        logs.write(LogLevel::Warning, "second").unwrap();
        logs.write(LogLevel::Error, "third").unwrap();

        let recent = logs.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "third");
        assert_eq!(recent[0].level, "ERROR");
        assert_eq!(recent[1].message, "second");
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" info ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
