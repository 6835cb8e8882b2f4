//! # coursegate-guard
//!
//! The access decision layer consumed by route and view code.
//!
//! ## Overview
//!
//! [`AccessDecisionService`] owns the audit log, role authority, session
//! auditor and session store for one storage namespace.  From it:
//!
//! - [`RouteGuard`] walks the `Validating → {Valid, NotAuthenticated,
//!   InvalidSession, Suspicious, Forbidden, Error}` state machine for a
//!   route and carries out the exits its notices offer.
//! - [`RoleGatedView`] resolves wrapped content to the content itself, a
//!   caller fallback, or a built-in "access denied" notice.
//!
//! Every failure inside a decision denies.  Audit failures never surface.

pub mod route;
pub mod service;
pub mod view;

pub use route::{ExitAction, RouteGuard};
pub use service::AccessDecisionService;
pub use view::{GatedView, RoleGatedView};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::BTreeSet, sync::Arc};

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use coursegate_contracts::{
        access::{AccessRequest, GuardExit, GuardState},
        audit::AuditQuery,
        config::CoursegateConfig,
        error::{CoursegateError, CoursegateResult},
        role::Role,
        session::SessionRecord,
    };
    use coursegate_core::{
        traits::{Clock, KeyValueStore},
        ChannelSink, ManualClock, MemoryStore,
    };
    use coursegate_session::ActivityContext;

    use super::{AccessDecisionService, ExitAction, GatedView};

    const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh) Safari/605.1.15";

    // ── Helpers ───────────────────────────────────────────────────────────────

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> CoursegateResult<Option<String>> {
            Err(CoursegateError::StorageFailed {
                reason: "storage disabled".to_string(),
            })
        }
        fn set(&self, _key: &str, _value: &str) -> CoursegateResult<()> {
            Err(CoursegateError::StorageFailed {
                reason: "storage disabled".to_string(),
            })
        }
        fn remove(&self, _key: &str) -> CoursegateResult<()> {
            Err(CoursegateError::StorageFailed {
                reason: "storage disabled".to_string(),
            })
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        service: AccessDecisionService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 4, 20, 14, 30, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new());
        let service =
            AccessDecisionService::new(store.clone(), clock.clone(), CoursegateConfig::default());
        Fixture {
            clock,
            store,
            service,
        }
    }

    fn nav(path: &str) -> ActivityContext {
        ActivityContext::new(path, BROWSER_UA)
    }

    fn roles(labels: &[&str]) -> BTreeSet<Role> {
        labels.iter().map(|l| Role::parse(l)).collect()
    }

    fn count(service: &AccessDecisionService, action: &str) -> usize {
        service
            .audit_log()
            .query(AuditQuery::new().action(action))
            .count()
    }

    // ── Route guard ───────────────────────────────────────────────────────────

    #[test]
    fn test_no_session_is_not_authenticated() {
        let f = fixture();
        let guard = f.service.route_guard();
        let state = guard.evaluate(&nav("/modules/1"));

        assert_eq!(state, GuardState::NotAuthenticated);
        assert_eq!(guard.state(), GuardState::NotAuthenticated);
        assert_eq!(state.exits(), &[GuardExit::Reauthenticate, GuardExit::GoHome]);
    }

    #[test]
    fn test_fresh_login_is_valid_and_touched() {
        let f = fixture();
        let record = f.service.sessions().login("learner-1", Role::Student).unwrap();
        let guard = f.service.route_guard();

        f.clock.advance(Duration::minutes(3));
        assert_eq!(guard.evaluate(&nav("/modules/1")), GuardState::Valid);
        assert!(guard.state().permits_content());

        let stored = f.service.sessions().load().unwrap().unwrap();
        assert_eq!(stored.login_timestamp, record.login_timestamp);
        assert_eq!(stored.last_activity_timestamp, f.clock.now());
    }

    #[test]
    fn test_expired_session_is_purged() {
        let f = fixture();
        f.service.sessions().login("learner-1", Role::Student).unwrap();
        f.clock.advance(Duration::hours(24) + Duration::seconds(1));

        let guard = f.service.route_guard();
        match guard.evaluate(&nav("/modules/1")) {
            GuardState::InvalidSession { reason } => assert!(reason.contains("expired")),
            other => panic!("expected InvalidSession, got {:?}", other),
        }
        assert_eq!(f.service.sessions().load().unwrap(), None);
        assert_eq!(count(&f.service, "session_invalid"), 1);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let f = fixture();
        let mut record = f.service.sessions().login("learner-1", Role::Admin).unwrap();
        record.session_token = "abc123".to_string();
        f.service.sessions().save(&record).unwrap();

        let state = f.service.route_guard().evaluate(&nav("/admin"));
        assert!(matches!(state, GuardState::InvalidSession { .. }));
    }

    #[test]
    fn test_corrupt_session_record_is_error_not_valid() {
        let f = fixture();
        f.store.set("user_data", "{\"subjectId\":").unwrap();

        let guard = f.service.route_guard();
        let state = guard.evaluate(&nav("/modules/1"));
        assert!(matches!(state, GuardState::Error { .. }), "got {:?}", state);
        assert_eq!(state.exits(), &[GuardExit::Reload, GuardExit::GoHome]);
        assert_eq!(count(&f.service, "validation_error"), 1);
        assert_eq!(guard.handle_exit(GuardExit::Reload).unwrap(), ExitAction::Reevaluate);
    }

    /// Unusable storage fails closed and the audit side never panics.
    #[test]
    fn test_storage_failure_fails_closed() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service =
            AccessDecisionService::new(Arc::new(FailingStore), clock, CoursegateConfig::default());
        let state = service.route_guard().evaluate(&nav("/"));
        match &state {
            GuardState::Error { reason } => {
                assert!(reason.starts_with("validation error: storage failed"), "{reason}")
            }
            other => panic!("expected Error, got {:?}", other),
        }
        assert!(!service.decide(&AccessRequest::new(None, ["student"])));
    }

    #[test]
    fn test_bot_agent_is_suspicious_and_reauth_destroys_session() {
        let f = fixture();
        f.service.sessions().login("learner-1", Role::Student).unwrap();
        let guard = f.service.route_guard();

        let state = guard.evaluate(&ActivityContext::new("/modules/1", "AcmeSpider/2.0"));
        assert_eq!(
            state,
            GuardState::Suspicious {
                flags: vec!["bot_user_agent".to_string()]
            }
        );
        assert_eq!(count(&f.service, "security_violation"), 1);

        assert_eq!(guard.handle_exit(GuardExit::Reauthenticate).unwrap(), ExitAction::Login);
        assert_eq!(f.service.sessions().load().unwrap(), None);
        assert_eq!(count(&f.service, "user_logout"), 1);
        assert_eq!(guard.evaluate(&nav("/modules/1")), GuardState::NotAuthenticated);
    }

    #[test]
    fn test_rapid_reevaluation_is_suspicious() {
        let f = fixture();
        f.service.sessions().login("learner-1", Role::User).unwrap();
        let guard = f.service.route_guard();

        assert_eq!(guard.evaluate(&nav("/a")), GuardState::Valid);
        f.clock.advance(Duration::milliseconds(50));
        assert!(matches!(guard.evaluate(&nav("/b")), GuardState::Suspicious { .. }));
        f.clock.advance(Duration::milliseconds(500));
        assert_eq!(guard.evaluate(&nav("/c")), GuardState::Valid);
    }

    #[test]
    fn test_role_restricted_route_is_forbidden_below_rank() {
        let f = fixture();
        f.service.sessions().login("instructor-1", Role::Instructor).unwrap();
        let guard = f.service.route_guard_for(roles(&["admin", "moderator"]));

        assert_eq!(guard.evaluate(&nav("/admin")), GuardState::Forbidden);
        assert_eq!(GuardState::Forbidden.exits(), &[GuardExit::GoHome]);
        assert_eq!(
            guard.handle_exit(GuardExit::GoHome).unwrap(),
            ExitAction::Navigate("/".to_string())
        );

        let checks: Vec<_> = f
            .service
            .audit_log()
            .query(AuditQuery::new().action("role_check"))
            .collect();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].payload["accessGranted"], json!(false));
        assert_eq!(checks[0].context_url, "/admin");
    }

    #[test]
    fn test_higher_role_passes_restricted_route() {
        let f = fixture();
        f.service.sessions().login("root", Role::Superadmin).unwrap();
        let guard = f.service.route_guard_for(roles(&["moderator"]));
        assert_eq!(guard.evaluate(&nav("/moderation")), GuardState::Valid);
    }

    #[test]
    fn test_entries_during_evaluation_carry_session_and_path() {
        let f = fixture();
        let record = f.service.sessions().login("learner-5", Role::Student).unwrap();
        f.service
            .route_guard()
            .evaluate(&ActivityContext::new("/quiz/2", "ScraperBot"));

        let violation = f
            .service
            .audit_log()
            .query(AuditQuery::new().action("security_violation"))
            .next()
            .unwrap();
        assert_eq!(violation.session_id, record.session_token);
        assert_eq!(violation.context_url, "/quiz/2");
    }

    // ── Gated view ────────────────────────────────────────────────────────────

    #[test]
    fn test_gated_view_renders_content_when_granted() {
        let f = fixture();
        let view = f.service.gated_view(["instructor"]);
        let out = view.render(Some(&Role::Admin), || "grades", None);
        assert_eq!(out, GatedView::Content("grades"));
        assert!(out.is_granted());
    }

    #[test]
    fn test_gated_view_never_renders_content_when_denied() {
        let f = fixture();
        let view = f.service.gated_view(["instructor"]);
        let rendered = Cell::new(false);

        let out = view.render(
            Some(&Role::Student),
            || {
                rendered.set(true);
                "grades"
            },
            Some("ask your instructor"),
        );
        assert_eq!(out, GatedView::Fallback("ask your instructor"));
        assert!(!rendered.get());

        match view.render(None, || "grades", None) {
            GatedView::AccessDenied(notice) => assert_eq!(notice.title, "Access denied"),
            other => panic!("expected AccessDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_unrestricted_gated_view_admits_anonymous() {
        let f = fixture();
        let view = f.service.gated_view(Vec::<Role>::new());
        assert!(view.render(None, || (), None).is_granted());
    }

    // ── Service ───────────────────────────────────────────────────────────────

    #[test]
    fn test_session_events_are_forwarded_to_sink() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (sink, rx) = ChannelSink::new();
        let service = AccessDecisionService::with_sink(
            Arc::new(MemoryStore::new()),
            clock,
            CoursegateConfig::default(),
            Arc::new(sink),
        );
        service.sessions().login("learner-1", Role::Student).unwrap();
        service.decide(&AccessRequest::new(Some(Role::Student), ["admin"]));
        service.sessions().logout().unwrap();

        let forwarded: Vec<String> = rx.try_iter().map(|e| e.action).collect();
        assert_eq!(forwarded, vec!["user_login", "user_logout"]);
    }

    #[test]
    fn test_stored_record_shape_is_readable_json() {
        let f = fixture();
        let record = f.service.sessions().login("learner-1", Role::Moderator).unwrap();
        let raw = f.store.get("user_data").unwrap().unwrap();
        let parsed: SessionRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, record);
        assert!(raw.contains("\"role\":\"moderator\""));
    }
}
