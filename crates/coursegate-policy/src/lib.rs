//! # coursegate-policy
//!
//! Role authorization over the fixed role hierarchy.
//!
//! ## Overview
//!
//! [`RoleAuthority`] answers "does this actor's role open a resource that
//! lists these roles?".  Higher roles inherit the access of lower ones:
//! `admin` satisfies a gate that only lists `student`.  An exact label match
//! always wins, which is the only way an unrecognized role can be satisfied.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use coursegate_contracts::access::AccessRequest;
//! use coursegate_policy::RoleAuthority;
//!
//! let authority = RoleAuthority::new(audit_log.clone());
//! let ok = authority.check(&AccessRequest::new(Some(Role::Admin), ["student"]));
//! ```

pub mod authority;

pub use authority::{decide, min_required_rank, RoleAuthority};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::{Arc, Mutex},
    };

    use chrono::Utc;
    use serde_json::json;

    use coursegate_audit::StoredAuditLog;
    use coursegate_contracts::{
        access::AccessRequest,
        audit::{AuditQuery, Payload},
        config::AuditConfig,
        role::Role,
    };
    use coursegate_core::{traits::AuditRecorder, ManualClock, MemoryStore};

    use crate::{decide, min_required_rank, RoleAuthority};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Captures every recorded entry in memory.
    #[derive(Default)]
    struct CapturingRecorder {
        entries: Mutex<Vec<(String, Payload)>>,
    }

    impl AuditRecorder for CapturingRecorder {
        fn record(&self, action: &str, payload: Payload) {
            self.entries
                .lock()
                .unwrap()
                .push((action.to_string(), payload));
        }
    }

    /// Drops every entry.
    struct SilentRecorder;

    impl AuditRecorder for SilentRecorder {
        fn record(&self, _action: &str, _payload: Payload) {}
    }

    fn roles(labels: &[&str]) -> BTreeSet<Role> {
        labels.iter().map(|l| Role::parse(l)).collect()
    }

    fn authority() -> (RoleAuthority, Arc<CapturingRecorder>) {
        let recorder = Arc::new(CapturingRecorder::default());
        (RoleAuthority::new(recorder.clone()), recorder)
    }

    // ── Decision rules ────────────────────────────────────────────────────────

    #[test]
    fn test_empty_allowed_set_is_open_access() {
        assert!(decide(None, &BTreeSet::new()));
        assert!(decide(Some(&Role::Student), &BTreeSet::new()));
        assert!(decide(Some(&Role::parse("guest")), &BTreeSet::new()));
    }

    #[test]
    fn test_absent_actor_is_denied_for_any_restriction() {
        for role in Role::RECOGNIZED.iter() {
            let allowed: BTreeSet<Role> = [role.clone()].into_iter().collect();
            assert!(!decide(None, &allowed), "absent actor passed {role}");
        }
        assert!(!decide(None, &roles(&["auditor"])));
    }

    #[test]
    fn test_higher_rank_inherits_lower_access() {
        assert!(decide(Some(&Role::Admin), &roles(&["student"])));
        assert!(!decide(Some(&Role::Student), &roles(&["admin"])));
        assert!(decide(Some(&Role::Superadmin), &roles(&["moderator", "admin"])));
    }

    #[test]
    fn test_minimum_of_allowed_ranks_applies() {
        // instructor (3) against {admin 5, moderator 4}: min is 4.
        assert!(!decide(Some(&Role::Instructor), &roles(&["admin", "moderator"])));
        // moderator (4) against the same set passes by rank.
        assert!(decide(Some(&Role::Moderator), &roles(&["admin", "moderator"])));
        // user (2) against {admin, student}: min is 1.
        assert!(decide(Some(&Role::User), &roles(&["admin", "student"])));
    }

    /// For every recognized pair the decision equals the rank comparison.
    #[test]
    fn test_rank_rule_over_all_recognized_pairs() {
        for actor in Role::RECOGNIZED.iter() {
            for required in Role::RECOGNIZED.iter() {
                let allowed: BTreeSet<Role> = [required.clone()].into_iter().collect();
                assert_eq!(
                    decide(Some(actor), &allowed),
                    actor.rank() >= required.rank(),
                    "{actor} against {required}"
                );
            }
        }
    }

    #[test]
    fn test_unrecognized_allowed_role_needs_exact_match() {
        let allowed = roles(&["auditor"]);
        assert_eq!(min_required_rank(&allowed), None);
        assert!(!decide(Some(&Role::Superadmin), &allowed));
        assert!(decide(Some(&Role::parse("auditor")), &allowed));
    }

    #[test]
    fn test_unrecognized_allowed_role_does_not_lower_minimum() {
        let allowed = roles(&["auditor", "admin"]);
        assert_eq!(min_required_rank(&allowed), Some(5));
        assert!(!decide(Some(&Role::Moderator), &allowed));
        assert!(decide(Some(&Role::Admin), &allowed));
    }

    #[test]
    fn test_unrecognized_actor_ranks_zero() {
        assert!(!decide(Some(&Role::parse("guest")), &roles(&["student"])));
        assert!(decide(Some(&Role::parse("guest")), &roles(&["guest", "admin"])));
    }

    // ── Audit side effect ─────────────────────────────────────────────────────

    #[test]
    fn test_every_call_records_one_entry() {
        let (authority, recorder) = authority();
        authority.is_authorized(Some(&Role::Admin), &roles(&["student"]));
        authority.is_authorized(None, &roles(&["student"]));
        authority.is_authorized(None, &BTreeSet::new());

        let entries = recorder.entries.lock().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|(action, _)| action == "role_check"));
        assert_eq!(entries[0].1["accessGranted"], json!(true));
        assert_eq!(entries[1].1["actorRole"], json!(null));
        assert_eq!(entries[1].1["accessGranted"], json!(false));
    }

    #[test]
    fn test_recorder_does_not_change_decision() {
        let quiet = RoleAuthority::new(Arc::new(SilentRecorder));
        let (loud, _) = authority();
        let allowed = roles(&["moderator"]);
        for actor in Role::RECOGNIZED.iter() {
            assert_eq!(
                quiet.is_authorized(Some(actor), &allowed),
                loud.is_authorized(Some(actor), &allowed)
            );
        }
    }

    /// instructor → {admin, moderator}: denied, one entry with accessGranted false.
    #[test]
    fn test_instructor_denied_admin_moderator_resource_end_to_end() {
        let log = Arc::new(StoredAuditLog::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
            AuditConfig::default(),
        ));
        let authority = RoleAuthority::new(log.clone());

        let request = AccessRequest::new(Some(Role::Instructor), ["admin", "moderator"]);
        assert!(!authority.check(&request));

        let entries: Vec<_> = log.query(AuditQuery::new().action("role_check")).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["accessGranted"], json!(false));
        assert_eq!(entries[0].payload["actorRole"], json!("instructor"));
        assert_eq!(
            entries[0].payload["allowedRoles"],
            json!(["moderator", "admin"])
        );
    }
}
