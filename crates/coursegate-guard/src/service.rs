//! The access decision service: one place that wires the audit log, role
//! authority, session auditor, and session store over a shared store.

use std::{collections::BTreeSet, sync::Arc};

use coursegate_audit::StoredAuditLog;
use coursegate_contracts::{access::AccessRequest, config::CoursegateConfig, role::Role};
use coursegate_core::traits::{Clock, KeyValueStore, RemoteAuditSink};
use coursegate_policy::RoleAuthority;
use coursegate_session::{SessionAuditor, SessionStore};

use crate::{route::RouteGuard, view::RoleGatedView};

/// Owns every access-control component for one storage namespace.
///
/// Construct once at startup and hand out guards and gated views from it.
/// Dropping the service tears the components down; nothing is global.
pub struct AccessDecisionService {
    config: CoursegateConfig,
    audit: Arc<StoredAuditLog>,
    authority: Arc<RoleAuthority>,
    auditor: Arc<SessionAuditor>,
    sessions: Arc<SessionStore>,
}

impl AccessDecisionService {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: CoursegateConfig) -> Self {
        let audit = Arc::new(StoredAuditLog::new(
            store.clone(),
            clock.clone(),
            config.audit.clone(),
        ));
        Self::assemble(store, clock, config, audit)
    }

    /// Like [`AccessDecisionService::new`], forwarding selected entries to `sink`.
    pub fn with_sink(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: CoursegateConfig,
        sink: Arc<dyn RemoteAuditSink>,
    ) -> Self {
        let audit = Arc::new(
            StoredAuditLog::new(store.clone(), clock.clone(), config.audit.clone()).with_sink(sink),
        );
        Self::assemble(store, clock, config, audit)
    }

    fn assemble(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: CoursegateConfig,
        audit: Arc<StoredAuditLog>,
    ) -> Self {
        let authority = Arc::new(RoleAuthority::new(audit.clone()));
        let auditor = Arc::new(SessionAuditor::new(
            audit.clone(),
            clock.clone(),
            config.session.clone(),
        ));
        let sessions = Arc::new(SessionStore::new(
            store,
            audit.clone(),
            clock,
            config.session.clone(),
        ));
        Self {
            config,
            audit,
            authority,
            auditor,
            sessions,
        }
    }

    pub fn config(&self) -> &CoursegateConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &Arc<StoredAuditLog> {
        &self.audit
    }

    pub fn authority(&self) -> &Arc<RoleAuthority> {
        &self.authority
    }

    pub fn auditor(&self) -> &Arc<SessionAuditor> {
        &self.auditor
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// A single role check.  Recorded as one `role_check` entry.
    pub fn decide(&self, request: &AccessRequest) -> bool {
        self.authority.check(request)
    }

    /// A route guard for a route open to any valid session.
    pub fn route_guard(&self) -> RouteGuard {
        self.route_guard_for(BTreeSet::new())
    }

    /// A route guard that additionally requires one of `required_roles`.
    pub fn route_guard_for(&self, required_roles: BTreeSet<Role>) -> RouteGuard {
        RouteGuard::new(
            self.authority.clone(),
            self.auditor.clone(),
            self.sessions.clone(),
            self.audit.clone(),
            required_roles,
            self.config.session.home_path.clone(),
        )
    }

    /// A gated view guarded by `allowed_roles`.
    pub fn gated_view<I, R>(&self, allowed_roles: I) -> RoleGatedView
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        RoleGatedView::new(
            self.authority.clone(),
            allowed_roles.into_iter().map(Into::into).collect(),
        )
    }
}
