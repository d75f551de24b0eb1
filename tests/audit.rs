#[cfg(test)]
mod tests {
    use breakwatch::db::audit::{AuditAction, AuditLog, AuditRecord, EntityType};
    use breakwatch::db::break_log::BreakLog;
    use breakwatch::db::db::Db;
    use breakwatch::db::schedules::{NewLimit, NewSchedule};
    use breakwatch::db::sessions::{SessionStatus, WorkSessions};
    use breakwatch::db::users::{NewUser, Users};
    use breakwatch::libs::admin::Admin;
    use breakwatch::libs::config::{DatabaseConfig, TrackingConfig, UnassignedPolicy};
    use breakwatch::libs::error::TrackerError;
    use breakwatch::libs::tracker::BreakTracker;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    const ADMIN: &str = "boss@example.com";

    struct AuditTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for AuditTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            let db = Db::open(&temp_dir.path().join("audit.db"), &DatabaseConfig::default()).unwrap();
            AuditTestContext { _temp_dir: temp_dir, db }
        }
    }

    impl AuditTestContext {
        fn admin(&self) -> Admin<'_> {
            Admin::new(&self.db.conn, ADMIN, TrackingConfig::default())
        }

        fn audit(&self) -> AuditLog<'_> {
            AuditLog::new(&self.db.conn, ADMIN)
        }
    }

    fn user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn schedule(name: &str) -> NewSchedule {
        NewSchedule {
            name: name.to_string(),
            description: None,
            shift_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            shift_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            limits: vec![NewLimit {
                break_type: "Break".to_string(),
                duration_minutes: 15,
                daily_count: 3,
            }],
            windows: Vec::new(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_import_writes_import_then_update(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin.import_users(&[user("kim@example.com", "Kim")]).unwrap();
        admin.import_users(&[user("kim@example.com", "Kim Lee")]).unwrap();

        let history = ctx.audit().entity_history("user", "kim@example.com", 10).unwrap();
        assert_eq!(history.len(), 2);
        // Newest first.
        assert_eq!(history[0].action, "UPDATE");
        assert_eq!(history[1].action, "IMPORT");
        assert!(history[1].before_state.is_none());
        assert_eq!(history[0].before_state.as_ref().unwrap()["name"], "Kim");
        assert_eq!(history[0].after_state.as_ref().unwrap()["name"], "Kim Lee");
        assert_eq!(history[0].admin_email, ADMIN);
        assert!(history.iter().all(|e| e.success));
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_failed_mutation_is_audited(ctx: &mut AuditTestContext) {
        let result = ctx.admin().deactivate_user("ghost@example.com");
        assert!(matches!(result, Err(TrackerError::UserNotFound(_))));

        let history = ctx.audit().entity_history("USER", "ghost@example.com", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert!(history[0].error_message.as_ref().unwrap().contains("ghost@example.com"));
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_schedule_changes_are_audited(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin.import_users(&[user("kim@example.com", "Kim")]).unwrap();
        let created = admin.create_schedule(&schedule("Day")).unwrap();
        admin.assign_schedule("kim@example.com", created.id).unwrap();
        assert!(admin.unassign_schedule("kim@example.com").unwrap());
        admin.delete_schedule(created.id).unwrap();

        let history = ctx.audit().entity_history("schedule", &created.id.to_string(), 10).unwrap();
        let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["DELETE", "CREATE"]);
        assert_eq!(history[0].before_state.as_ref().unwrap()["name"], "Day");

        let assignment = ctx.audit().entity_history("assignment", "kim@example.com", 10).unwrap();
        let actions: Vec<&str> = assignment.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["UNASSIGN", "ASSIGN"]);
        assert_eq!(assignment[1].after_state.as_ref().unwrap()["assigned_by"], ADMIN);
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_schedule_edits_are_audited(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin.import_users(&[user("kim@example.com", "Kim")]).unwrap();
        let created = admin.create_schedule(&schedule("Day")).unwrap();
        admin.assign_schedule("kim@example.com", created.id).unwrap();

        let paused = admin.set_schedule_active(created.id, false).unwrap();
        assert!(!paused.is_active);
        let mut changed = paused.to_new();
        changed.name = "Day shift".to_string();
        admin.update_schedule(created.id, &changed).unwrap();
        assert!(admin.set_schedule_active(created.id, true).unwrap().is_active);
        assert!(matches!(admin.set_schedule_active(404, false), Err(TrackerError::ScheduleNotFound(404))));

        let history = ctx.audit().entity_history("schedule", &created.id.to_string(), 10).unwrap();
        let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["UPDATE", "UPDATE", "UPDATE", "CREATE"]);
        assert_eq!(history[2].before_state.as_ref().unwrap()["is_active"], true);
        assert_eq!(history[2].after_state.as_ref().unwrap()["is_active"], false);
        assert_eq!(history[1].before_state.as_ref().unwrap()["name"], "Day");
        assert_eq!(history[1].after_state.as_ref().unwrap()["name"], "Day shift");

        let failed = ctx.audit().entity_history("schedule", "404", 10).unwrap();
        assert_eq!(failed.len(), 1);
        assert!(!failed[0].success);
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_deactivated_schedule_falls_back_to_policy(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin.import_users(&[user("kim@example.com", "Kim")]).unwrap();
        let created = admin.create_schedule(&schedule("Day")).unwrap();
        admin.assign_schedule("kim@example.com", created.id).unwrap();
        admin.set_schedule_active(created.id, false).unwrap();

        let tracking = TrackingConfig {
            unassigned_policy: UnassignedPolicy::Deny,
            ..TrackingConfig::default()
        };
        let result = BreakTracker::new(&ctx.db.conn, tracking.clone()).start_break("kim@example.com", "Break", None, at(10, 0));
        assert!(result.is_err());

        admin.set_schedule_active(created.id, true).unwrap();
        BreakTracker::new(&ctx.db.conn, tracking)
            .start_break("kim@example.com", "Break", None, at(10, 0))
            .unwrap();
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_force_logout_closes_break_and_audits(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin.import_users(&[user("kim@example.com", "Kim")]).unwrap();
        WorkSessions::new(&ctx.db.conn)
            .start("kim@example.com", "s-9", at(9, 0), None)
            .unwrap();
        BreakTracker::new(&ctx.db.conn, TrackingConfig::default())
            .start_break("kim@example.com", "Break", None, at(11, 0))
            .unwrap();

        let closed = admin.force_logout("s-9", at(11, 10), Some("left the building")).unwrap();
        assert_eq!(closed.session.status, SessionStatus::ForcedLogout);
        assert_eq!(closed.session.logout_reason.as_deref(), Some("left the building"));
        assert!(closed.closed_break.is_some());
        assert!(BreakLog::new(&ctx.db.conn).list_active().unwrap().is_empty());

        let history = ctx.audit().entity_history("session", "s-9", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "FORCE_LOGOUT");
        assert_eq!(history[0].before_state.as_ref().unwrap()["status"], "active");
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_audit_log_is_append_only(ctx: &mut AuditTestContext) {
        let id = ctx
            .audit()
            .log_action(&AuditRecord::new(AuditAction::ConfigChange, EntityType::Config, "config"))
            .unwrap();

        assert!(ctx
            .db
            .conn
            .execute("UPDATE audit_log SET admin_email = 'x@example.com' WHERE id = ?1", [id])
            .is_err());
        assert!(ctx.db.conn.execute("DELETE FROM audit_log WHERE id = ?1", [id]).is_err());
        assert_eq!(ctx.audit().recent(24, 10).unwrap().len(), 1);
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_recent_rejects_out_of_range_hours(ctx: &mut AuditTestContext) {
        assert!(matches!(ctx.audit().recent(i64::MAX, 10), Err(TrackerError::InvalidInput(_))));
        assert!(matches!(ctx.audit().recent(i64::MAX / 3600, 10), Err(TrackerError::InvalidInput(_))));
        assert!(ctx.audit().recent(24 * 365 * 100, 10).unwrap().is_empty());
    }

    #[test_context(AuditTestContext)]
    #[test]
    fn test_statistics_and_admin_queries(ctx: &mut AuditTestContext) {
        let admin = ctx.admin();
        admin
            .import_users(&[user("a@example.com", "A"), user("b@example.com", "B")])
            .unwrap();
        admin.deactivate_user("a@example.com").unwrap();
        Admin::new(&ctx.db.conn, "other.admin@example.com", TrackingConfig::default())
            .reactivate_user("a@example.com")
            .unwrap();

        let stats = ctx.audit().statistics(None, None).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_action.get("IMPORT"), Some(&2));
        assert_eq!(stats.by_action.get("UPDATE"), Some(&2));
        assert_eq!(stats.by_entity_type.get("USER"), Some(&4));

        assert_eq!(ctx.audit().by_admin(ADMIN, 100).unwrap().len(), 3);
        assert_eq!(ctx.audit().by_admin("Other.Admin@example.com", 100).unwrap().len(), 1);
        assert_eq!(ctx.audit().recent(1, 2).unwrap().len(), 2);

        let active = Users::new(&ctx.db.conn).get_by_email("a@example.com").unwrap().unwrap();
        assert!(active.is_active);
    }
}
