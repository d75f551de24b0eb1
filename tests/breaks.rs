#[cfg(test)]
mod tests {
    use breakwatch::db::break_log::{BreakLog, BreakStatus, NewBreak};
    use breakwatch::db::db::Db;
    use breakwatch::db::users::{NewUser, User, Users};
    use breakwatch::db::violations::{NewViolation, Severity, ViolationFilter, ViolationKind, Violations};
    use breakwatch::libs::config::DatabaseConfig;
    use breakwatch::libs::error::TrackerError;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct BreakTestContext {
        _temp_dir: TempDir,
        db: Db,
        user: User,
    }

    impl TestContext for BreakTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            let db = Db::open(&temp_dir.path().join("breaks.db"), &DatabaseConfig::default()).unwrap();
            let user = Users::new(&db.conn)
                .upsert(&NewUser {
                    email: "sam@example.com".to_string(),
                    name: "Sam".to_string(),
                    ..Default::default()
                })
                .unwrap();
            BreakTestContext {
                _temp_dir: temp_dir,
                db,
                user,
            }
        }
    }

    impl BreakTestContext {
        fn open_break(&self, break_type: &str, start: NaiveDateTime, limit: Option<i64>) -> i64 {
            BreakLog::new(&self.db.conn)
                .start(&NewBreak {
                    user_id: self.user.id,
                    email: &self.user.email,
                    session_id: None,
                    break_type,
                    start_time: start,
                    limit_minutes: limit,
                    in_window: true,
                })
                .unwrap()
                .id
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, s).unwrap()
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_duration_rounds_half_up(ctx: &mut BreakTestContext) {
        let breaks = BreakLog::new(&ctx.db.conn);

        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        let closed = breaks.close(id, at(10, 14, 29), 0).unwrap();
        assert_eq!(closed.duration_minutes, Some(14));
        assert_eq!(closed.status, BreakStatus::Completed);
        assert!(!closed.is_over_limit);

        let id = ctx.open_break("Break", at(11, 0, 0), Some(15));
        let closed = breaks.close(id, at(11, 15, 30), 0).unwrap();
        assert_eq!(closed.duration_minutes, Some(16));
        assert!(closed.is_over_limit);
        assert_eq!(closed.excess_minutes(), Some(1));
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_exact_limit_is_not_over(ctx: &mut BreakTestContext) {
        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        let closed = BreakLog::new(&ctx.db.conn).close(id, at(10, 15, 0), 0).unwrap();
        assert!(!closed.is_over_limit);
        assert_eq!(closed.excess_minutes(), None);
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_grace_absorbs_small_overruns(ctx: &mut BreakTestContext) {
        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        let closed = BreakLog::new(&ctx.db.conn).close(id, at(10, 17, 0), 2).unwrap();
        assert!(!closed.is_over_limit);
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_unlimited_break_is_never_over(ctx: &mut BreakTestContext) {
        let id = ctx.open_break("Stretch", at(10, 0, 0), None);
        let closed = BreakLog::new(&ctx.db.conn).close(id, at(12, 0, 0), 0).unwrap();
        assert_eq!(closed.duration_minutes, Some(120));
        assert!(!closed.is_over_limit);
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_one_active_break_per_user(ctx: &mut BreakTestContext) {
        ctx.open_break("Break", at(10, 0, 0), Some(15));
        let second = BreakLog::new(&ctx.db.conn).start(&NewBreak {
            user_id: ctx.user.id,
            email: &ctx.user.email,
            session_id: None,
            break_type: "Lunch",
            start_time: at(10, 5, 0),
            limit_minutes: Some(60),
            in_window: true,
        });
        assert!(matches!(second, Err(TrackerError::BreakAlreadyActive(_))));

        let active = BreakLog::new(&ctx.db.conn).list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].break_type, "Break");
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_closed_break_is_frozen(ctx: &mut BreakTestContext) {
        let breaks = BreakLog::new(&ctx.db.conn);
        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        breaks.close(id, at(10, 10, 0), 0).unwrap();

        assert!(matches!(breaks.close(id, at(10, 20, 0), 0), Err(TrackerError::BreakAlreadyClosed(_))));

        let raw = ctx
            .db
            .conn
            .execute("UPDATE break_log SET duration_minutes = 99 WHERE id = ?1", [id]);
        assert!(raw.is_err());
        let raw = ctx
            .db
            .conn
            .execute("UPDATE break_log SET status = 'Active' WHERE id = ?1", [id]);
        assert!(raw.is_err());

        let record = breaks.get(id).unwrap().unwrap();
        assert_eq!(record.duration_minutes, Some(10));
        assert_eq!(record.end_time, Some(at(10, 10, 0)));
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_database_fills_duration_on_raw_close(ctx: &mut BreakTestContext) {
        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        ctx.db
            .conn
            .execute("UPDATE break_log SET end_time = '2025-04-02 10:07:30' WHERE id = ?1", [id])
            .unwrap();

        let record = BreakLog::new(&ctx.db.conn).get(id).unwrap().unwrap();
        assert_eq!(record.duration_minutes, Some(8));
        assert_eq!(record.status, BreakStatus::Completed);
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_daily_counts_and_usage(ctx: &mut BreakTestContext) {
        let breaks = BreakLog::new(&ctx.db.conn);
        let first = ctx.open_break("Break", at(10, 0, 0), Some(15));
        breaks.close(first, at(10, 10, 0), 0).unwrap();
        let second = ctx.open_break("break", at(15, 0, 0), Some(15));
        breaks.close(second, at(15, 12, 0), 0).unwrap();
        ctx.open_break("Lunch", at(12, 0, 0), Some(60));

        assert_eq!(breaks.count_for_day(ctx.user.id, "BREAK", day()).unwrap(), 2);
        assert_eq!(breaks.count_for_day(ctx.user.id, "Lunch", day()).unwrap(), 1);
        let next_day = NaiveDate::from_ymd_opt(2025, 4, 3).unwrap();
        assert_eq!(breaks.count_for_day(ctx.user.id, "Break", next_day).unwrap(), 0);

        let usage = breaks.usage_for_day(ctx.user.id, day()).unwrap();
        let lunch = usage.iter().find(|u| u.break_type == "Lunch").unwrap();
        assert_eq!(lunch.count, 1);
        assert_eq!(lunch.minutes, 0);

        assert_eq!(breaks.list_for_date(day(), None).unwrap().len(), 3);
        assert_eq!(breaks.list_for_date(day(), Some("SAM@example.com")).unwrap().len(), 3);
        assert!(breaks.list_for_date(day(), Some("other@example.com")).unwrap().is_empty());
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_one_over_limit_violation_per_break(ctx: &mut BreakTestContext) {
        let id = ctx.open_break("Break", at(10, 0, 0), Some(15));
        BreakLog::new(&ctx.db.conn).close(id, at(10, 20, 0), 0).unwrap();

        let violations = Violations::new(&ctx.db.conn);
        let over = NewViolation {
            user_id: Some(ctx.user.id),
            break_id: Some(id),
            break_type: Some("Break".to_string()),
            expected_duration: Some(15),
            actual_duration: Some(20),
            excess_minutes: Some(5),
            ..NewViolation::new(ViolationKind::OverLimit, &ctx.user.email, at(10, 20, 0))
        };
        violations.insert(&over).unwrap();
        assert!(violations.insert(&over).is_err());

        // Other kinds may repeat for the same break.
        let window = NewViolation {
            break_id: Some(id),
            ..NewViolation::new(ViolationKind::OutOfWindow, &ctx.user.email, at(10, 0, 0))
        };
        violations.insert(&window).unwrap();
        violations.insert(&window).unwrap();

        let for_break = violations.for_break(id).unwrap();
        assert_eq!(for_break.len(), 3);
        let over_rows: Vec<_> = for_break.iter().filter(|v| v.kind == ViolationKind::OverLimit).collect();
        assert_eq!(over_rows.len(), 1);
        assert_eq!(over_rows[0].excess_minutes, Some(5));
        assert_eq!(over_rows[0].severity, Severity::Critical);
    }

    #[test_context(BreakTestContext)]
    #[test]
    fn test_violation_filters(ctx: &mut BreakTestContext) {
        let violations = Violations::new(&ctx.db.conn);
        violations
            .insert(&NewViolation::new(ViolationKind::NoSchedule, &ctx.user.email, at(9, 0, 0)))
            .unwrap();
        violations
            .insert(&NewViolation::new(
                ViolationKind::QuotaExceeded,
                &ctx.user.email,
                NaiveDate::from_ymd_opt(2025, 4, 5).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            ))
            .unwrap();
        violations
            .insert(&NewViolation::new(ViolationKind::NoSchedule, "other@example.com", at(9, 30, 0)))
            .unwrap();

        assert_eq!(violations.list(&ViolationFilter::default()).unwrap().len(), 3);

        let mine = violations
            .list(&ViolationFilter {
                email: Some("Sam@Example.com".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mine.len(), 2);

        let first_day = violations
            .list(&ViolationFilter {
                from: Some(day()),
                to: Some(day()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(first_day.len(), 2);

        let quota = violations
            .list(&ViolationFilter {
                kind: Some(ViolationKind::QuotaExceeded),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(quota.len(), 1);
        assert_eq!(quota[0].date, NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
    }
}
