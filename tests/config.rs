#[cfg(test)]
mod tests {
    use breakwatch::libs::config::{Config, DefaultLimit, NotificationConfig, TrackingConfig, UnassignedPolicy};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// Points the data directory at a fresh temporary home.
    struct ConfigTestContext {
        _temp_dir: TempDir,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            ConfigTestContext { _temp_dir: temp_dir }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_read_delete(_ctx: &mut ConfigTestContext) {
        let config = Config {
            tracking: Some(TrackingConfig {
                unassigned_policy: UnassignedPolicy::Deny,
                over_limit_grace_minutes: 2,
                ..TrackingConfig::default()
            }),
            database: None,
            notifications: Some(NotificationConfig { cooldown_secs: 30 }),
        };
        config.save().unwrap();

        let loaded = Config::read().unwrap();
        let tracking = loaded.tracking_or_default();
        assert_eq!(tracking.unassigned_policy, UnassignedPolicy::Deny);
        assert_eq!(tracking.over_limit_grace_minutes, 2);
        assert_eq!(loaded.notifications_or_default().cooldown_secs, 30);
        assert!(loaded.database.is_none());

        Config::delete().unwrap();
        assert!(Config::read().unwrap().tracking.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let tracking = config.tracking_or_default();
        assert_eq!(tracking.unassigned_policy, UnassignedPolicy::AllowAndFlag);
        assert_eq!(tracking.over_limit_grace_minutes, 0);
        assert!(tracking.check_daily_quota);
        assert!(tracking.check_windows);
        assert_eq!(tracking.default_limit("break").unwrap().duration_minutes, 15);
        assert_eq!(tracking.default_limit(" LUNCH ").unwrap().daily_count, 1);
        assert!(tracking.default_limit("nap").is_none());

        assert_eq!(config.notifications_or_default().cooldown_secs, 600);
        let database = config.database_or_default();
        assert_eq!(database.busy_timeout_ms, 5000);
        assert!(database.wal);
    }

    #[test]
    fn test_policy_serializes_snake_case() {
        let tracking = TrackingConfig {
            unassigned_policy: UnassignedPolicy::AllowWithDefaults,
            default_limits: vec![DefaultLimit {
                break_type: "Coffee".to_string(),
                duration_minutes: 5,
                daily_count: 4,
            }],
            ..TrackingConfig::default()
        };
        let json = serde_json::to_string(&tracking).unwrap();
        assert!(json.contains("\"allow_with_defaults\""));

        let parsed: TrackingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tracking);
        assert_eq!(UnassignedPolicy::AllowAndFlag.to_string(), "allow_and_flag");
    }

    #[test]
    fn test_missing_sections_fall_back() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.tracking_or_default(), TrackingConfig::default());
    }

    #[test]
    fn test_partial_section_fills_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{"tracking":{"unassigned_policy":"deny"},"database":{"wal":false}}"#).unwrap();
        let tracking = config.tracking_or_default();
        assert_eq!(tracking.unassigned_policy, UnassignedPolicy::Deny);
        assert_eq!(tracking.default_limits, TrackingConfig::default().default_limits);
        assert!(tracking.check_windows);

        let database = config.database_or_default();
        assert!(!database.wal);
        assert_eq!(database.busy_timeout_ms, 5000);

        let notifications: Config = serde_json::from_str(r#"{"notifications":{}}"#).unwrap();
        assert_eq!(notifications.notifications_or_default().cooldown_secs, 600);
    }

    #[test]
    fn test_set_default_limit_keeps_other_types() {
        let mut tracking = TrackingConfig::default();
        tracking.default_limits.push(DefaultLimit {
            break_type: "Coffee".to_string(),
            duration_minutes: 5,
            daily_count: 4,
        });

        tracking.set_default_limit(DefaultLimit {
            break_type: "lunch".to_string(),
            duration_minutes: 45,
            daily_count: 2,
        });
        assert_eq!(tracking.default_limits.len(), 3);
        let lunch = tracking.default_limit("Lunch").unwrap();
        assert_eq!(lunch.break_type, "Lunch");
        assert_eq!((lunch.duration_minutes, lunch.daily_count), (45, 2));
        assert_eq!(tracking.default_limit("coffee").unwrap().duration_minutes, 5);

        tracking.set_default_limit(DefaultLimit {
            break_type: "Nap".to_string(),
            duration_minutes: 20,
            daily_count: 1,
        });
        assert_eq!(tracking.default_limits.len(), 4);
    }

    #[test]
    fn test_validate_rejects_non_positive_limits() {
        assert!(TrackingConfig::default().validate().is_ok());

        let mut zero = TrackingConfig::default();
        zero.set_default_limit(DefaultLimit {
            break_type: "Break".to_string(),
            duration_minutes: 0,
            daily_count: 3,
        });
        assert!(zero.validate().unwrap_err().to_string().contains("Break"));

        let negative_grace = TrackingConfig {
            over_limit_grace_minutes: -1,
            ..TrackingConfig::default()
        };
        assert!(negative_grace.validate().is_err());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_refuses_invalid_tracking(_ctx: &mut ConfigTestContext) {
        let mut tracking = TrackingConfig::default();
        tracking.set_default_limit(DefaultLimit {
            break_type: "Lunch".to_string(),
            duration_minutes: 60,
            daily_count: -1,
        });
        let config = Config {
            tracking: Some(tracking),
            ..Config::default()
        };
        assert!(config.save().is_err());
        assert!(Config::read().unwrap().tracking.is_none());
    }
}
