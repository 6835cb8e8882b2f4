//! In-memory walkthrough of the access layer.
//!
//! Uses a manual clock so expiry and rapid navigation can be shown without
//! waiting.

use std::{collections::BTreeSet, sync::Arc};

use chrono::{Duration, Utc};

use coursegate_contracts::{
    access::{AccessRequest, GuardExit},
    audit::AuditQuery,
    config::CoursegateConfig,
    error::CoursegateResult,
    role::Role,
};
use coursegate_core::{ManualClock, MemoryStore};
use coursegate_guard::AccessDecisionService;
use coursegate_session::ActivityContext;

use crate::{describe_request, print_state};

const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

pub fn run_scenario(config: CoursegateConfig) -> CoursegateResult<()> {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = AccessDecisionService::new(Arc::new(MemoryStore::new()), clock.clone(), config);

    println!();
    println!("coursegate: access layer walkthrough");
    println!("====================================");

    println!();
    println!("[1] Role checks");
    for request in [
        AccessRequest::new(Some(Role::Admin), ["student"]),
        AccessRequest::new(Some(Role::Student), ["admin"]),
        AccessRequest::new(Some(Role::Instructor), ["admin", "moderator"]),
        AccessRequest::new(None, ["student"]),
        AccessRequest::new(None, Vec::<Role>::new()),
    ] {
        let granted = service.decide(&request);
        println!(
            "  {:<40} {}",
            describe_request(&request),
            if granted { "GRANTED" } else { "DENIED" }
        );
    }

    println!();
    println!("[2] Route guard, fresh session");
    service.sessions().login("learner-1", Role::Student)?;
    let guard = service.route_guard();
    print_state(&guard.evaluate(&ActivityContext::new("/modules/intro", BROWSER)));

    println!();
    println!("[3] Two navigations 50ms apart");
    clock.advance(Duration::milliseconds(50));
    let state = guard.evaluate(&ActivityContext::new("/modules/next", BROWSER));
    print_state(&state);
    guard.handle_exit(GuardExit::Reauthenticate)?;

    println!();
    println!("[4] Bot user agent");
    service.sessions().login("learner-1", Role::Student)?;
    clock.advance(Duration::seconds(1));
    print_state(&guard.evaluate(&ActivityContext::new("/modules/intro", "ExampleCrawler/1.0")));
    guard.handle_exit(GuardExit::Reauthenticate)?;

    println!();
    println!("[5] Session older than the max age");
    service.sessions().login("learner-1", Role::Student)?;
    clock.advance(service.config().session.max_age() + Duration::seconds(1));
    print_state(&guard.evaluate(&ActivityContext::new("/modules/intro", BROWSER)));

    println!();
    println!("[6] Instructor on an admin/moderator route");
    service.sessions().login("instructor-1", Role::Instructor)?;
    clock.advance(Duration::seconds(1));
    let restricted: BTreeSet<Role> = [Role::Admin, Role::Moderator].into_iter().collect();
    let admin_guard = service.route_guard_for(restricted);
    print_state(&admin_guard.evaluate(&ActivityContext::new("/admin/reports", BROWSER)));

    println!();
    println!("[7] Audit log");
    let log = service.audit_log();
    for (action, n) in log.counts_by_action() {
        println!("  {:<24} {}", action, n);
    }
    let violations = log
        .query(AuditQuery::new().action("security_violation"))
        .count();
    println!("  security violations recorded: {}", violations);
    println!();
    Ok(())
}
