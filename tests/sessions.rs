#[cfg(test)]
mod tests {
    use breakwatch::db::db::Db;
    use breakwatch::db::sessions::{SessionStatus, WorkSessions};
    use breakwatch::db::users::{NewUser, Users};
    use breakwatch::libs::config::DatabaseConfig;
    use breakwatch::libs::error::TrackerError;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct SessionTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for SessionTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            let db = Db::open(&temp_dir.path().join("sessions.db"), &DatabaseConfig::default()).unwrap();
            Users::new(&db.conn)
                .upsert(&NewUser {
                    email: "Jane@Example.com".to_string(),
                    name: "Jane".to_string(),
                    ..Default::default()
                })
                .unwrap();
            SessionTestContext { _temp_dir: temp_dir, db }
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_upsert_normalizes_and_updates(ctx: &mut SessionTestContext) {
        let users = Users::new(&ctx.db.conn);
        let jane = users.get_by_email(" JANE@example.COM ").unwrap().unwrap();
        assert_eq!(jane.email, "jane@example.com");
        assert_eq!(jane.role, "user");

        let updated = users
            .upsert(&NewUser {
                email: "jane@example.com".to_string(),
                name: "Jane Doe".to_string(),
                role: Some("admin".to_string()),
                group_name: Some("Support".to_string()),
            })
            .unwrap();
        assert_eq!(updated.id, jane.id);
        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.role, "admin");
        assert_eq!(users.list(false).unwrap().len(), 1);
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_upsert_rejects_bad_input(ctx: &mut SessionTestContext) {
        let users = Users::new(&ctx.db.conn);
        let bad_email = users.upsert(&NewUser {
            email: "not-an-email".to_string(),
            name: "X".to_string(),
            ..Default::default()
        });
        assert!(matches!(bad_email, Err(TrackerError::InvalidEmail(_))));

        let no_name = users.upsert(&NewUser {
            email: "x@example.com".to_string(),
            name: "  ".to_string(),
            ..Default::default()
        });
        assert!(matches!(no_name, Err(TrackerError::InvalidInput(_))));
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_users_are_never_deleted(ctx: &mut SessionTestContext) {
        let result = ctx.db.conn.execute("DELETE FROM users WHERE email = 'jane@example.com'", []);
        assert!(result.is_err());

        let users = Users::new(&ctx.db.conn);
        let jane = users.deactivate("jane@example.com").unwrap();
        assert!(!jane.is_active);
        assert!(users.list(true).unwrap().is_empty());
        assert_eq!(users.list(false).unwrap().len(), 1);

        // Re-importing does not reactivate.
        let again = users
            .upsert(&NewUser {
                email: "jane@example.com".to_string(),
                name: "Jane".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(!again.is_active);

        assert!(users.reactivate("jane@example.com").unwrap().is_active);
        assert!(matches!(users.deactivate("nobody@example.com"), Err(TrackerError::UserNotFound(_))));
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_one_open_session_per_user(ctx: &mut SessionTestContext) {
        let sessions = WorkSessions::new(&ctx.db.conn);
        let session = sessions.start("jane@example.com", "s-1", at(9, 0, 0), None).unwrap();
        assert!(session.is_open());
        assert_eq!(session.status, SessionStatus::Active);

        let second = sessions.start("jane@example.com", "s-2", at(9, 5, 0), None);
        assert!(matches!(second, Err(TrackerError::SessionAlreadyOpen(_))));

        let active = sessions.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Jane");
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_second_open_session_rejected_by_schema(ctx: &mut SessionTestContext) {
        let insert = "INSERT INTO work_sessions (session_id, user_id, email, login_time)
            SELECT ?1, id, email, '2025-03-10 09:00:00' FROM users WHERE email = 'jane@example.com'";
        assert_eq!(ctx.db.conn.execute(insert, ["raw-1"]).unwrap(), 1);
        assert!(ctx.db.conn.execute(insert, ["raw-2"]).is_err());

        // Closing the first one frees the slot.
        WorkSessions::new(&ctx.db.conn)
            .close("raw-1", at(10, 0, 0), SessionStatus::Completed, None)
            .unwrap();
        assert_eq!(ctx.db.conn.execute(insert, ["raw-3"]).unwrap(), 1);
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_inactive_user_cannot_log_in(ctx: &mut SessionTestContext) {
        Users::new(&ctx.db.conn).deactivate("jane@example.com").unwrap();
        let result = WorkSessions::new(&ctx.db.conn).start("jane@example.com", "s-1", at(9, 0, 0), None);
        assert!(matches!(result, Err(TrackerError::UserInactive(_))));

        let unknown = WorkSessions::new(&ctx.db.conn).start("ghost@example.com", "s-2", at(9, 0, 0), None);
        assert!(matches!(unknown, Err(TrackerError::UserNotFound(_))));
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_close_computes_rounded_duration(ctx: &mut SessionTestContext) {
        let sessions = WorkSessions::new(&ctx.db.conn);
        sessions.start("jane@example.com", "s-1", at(9, 0, 0), Some("office")).unwrap();

        // 8h 0m 30s rounds half up to 481 minutes.
        let closed = sessions
            .close("s-1", at(17, 0, 30), SessionStatus::Completed, None)
            .unwrap();
        assert_eq!(closed.duration_minutes, Some(481));
        assert_eq!(closed.logout_time, Some(at(17, 0, 30)));
        assert_eq!(closed.status, SessionStatus::Completed);
        assert!(sessions.active_for("jane@example.com").unwrap().is_none());

        // A new session may start once the old one is closed.
        sessions.start("jane@example.com", "s-2", at(18, 0, 0), None).unwrap();
        let day = sessions
            .list_for_user("jane@example.com", NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .unwrap();
        assert_eq!(day.len(), 2);
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_logout_time_is_written_once(ctx: &mut SessionTestContext) {
        let sessions = WorkSessions::new(&ctx.db.conn);
        sessions.start("jane@example.com", "s-1", at(9, 0, 0), None).unwrap();
        sessions.close("s-1", at(12, 0, 0), SessionStatus::Completed, None).unwrap();

        let again = sessions.close("s-1", at(13, 0, 0), SessionStatus::ForcedLogout, None);
        assert!(matches!(again, Err(TrackerError::SessionAlreadyClosed(_))));

        let raw = ctx.db.conn.execute(
            "UPDATE work_sessions SET logout_time = '2025-03-10 13:00:00' WHERE session_id = 's-1'",
            [],
        );
        assert!(raw.is_err());

        let session = sessions.get("s-1").unwrap().unwrap();
        assert_eq!(session.logout_time, Some(at(12, 0, 0)));
        assert_eq!(session.duration_minutes, Some(180));
    }

    #[test_context(SessionTestContext)]
    #[test]
    fn test_close_rejects_bad_requests(ctx: &mut SessionTestContext) {
        let sessions = WorkSessions::new(&ctx.db.conn);
        sessions.start("jane@example.com", "s-1", at(9, 0, 0), None).unwrap();

        let active = sessions.close("s-1", at(10, 0, 0), SessionStatus::Active, None);
        assert!(matches!(active, Err(TrackerError::InvalidStatus(_))));

        let missing = sessions.close("nope", at(10, 0, 0), SessionStatus::Completed, None);
        assert!(matches!(missing, Err(TrackerError::SessionNotFound(_))));

        let backwards = sessions.close("s-1", at(8, 0, 0), SessionStatus::Completed, None);
        assert!(matches!(backwards, Err(TrackerError::NegativeSpan { .. })));
        assert!(sessions.get("s-1").unwrap().unwrap().is_open());
    }
}
