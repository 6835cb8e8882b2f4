//! The route guard state machine.
//!
//! Each evaluation enters `Validating` and runs, in order:
//!
//!   load session → validate → triage → role check → touch
//!
//! The first failing step picks the terminal state.  A failing step never
//! falls through to `Valid`: storage or decode failures land in `Error`.
//! Nothing re-evaluates on its own; the caller re-runs `evaluate` when the
//! identity or route changes, or after the user picks an exit.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use serde_json::json;
use tracing::{debug, info, warn};

use coursegate_audit::StoredAuditLog;
use coursegate_contracts::{
    access::{GuardExit, GuardState},
    audit::{AuditAction, Payload},
    error::{CoursegateError, CoursegateResult},
    role::Role,
};
use coursegate_policy::RoleAuthority;
use coursegate_session::{ActivityContext, SessionAuditor, SessionStore};

/// What the caller should do after an exit was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    /// The session is gone; start the login flow.
    Login,
    /// Navigate to this path.
    Navigate(String),
    /// Evaluate again.
    Reevaluate,
}

/// Guards one route.
pub struct RouteGuard {
    authority: Arc<RoleAuthority>,
    auditor: Arc<SessionAuditor>,
    sessions: Arc<SessionStore>,
    audit: Arc<StoredAuditLog>,
    required_roles: BTreeSet<Role>,
    home_path: String,
    state: Mutex<GuardState>,
}

impl RouteGuard {
    pub fn new(
        authority: Arc<RoleAuthority>,
        auditor: Arc<SessionAuditor>,
        sessions: Arc<SessionStore>,
        audit: Arc<StoredAuditLog>,
        required_roles: BTreeSet<Role>,
        home_path: String,
    ) -> Self {
        Self {
            authority,
            auditor,
            sessions,
            audit,
            required_roles,
            home_path,
            state: Mutex::new(GuardState::Validating),
        }
    }

    /// The state of the most recent evaluation.
    pub fn state(&self) -> GuardState {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn required_roles(&self) -> &BTreeSet<Role> {
        &self.required_roles
    }

    /// Run the check sequence for one navigation and settle on a terminal state.
    pub fn evaluate(&self, ctx: &ActivityContext) -> GuardState {
        self.set_state(GuardState::Validating);
        self.audit.set_location(ctx.path.clone());

        let state = match self.run_checks(ctx) {
            Ok(state) => state,
            Err(cause) => {
                let e = CoursegateError::ValidationFailed {
                    reason: cause.to_string(),
                };
                warn!(path = %ctx.path, error = %e, "route validation failed");
                let mut payload = Payload::new();
                payload.insert("path".to_string(), json!(ctx.path));
                payload.insert("error".to_string(), json!(e.to_string()));
                self.audit.append(AuditAction::VALIDATION_ERROR, payload);
                GuardState::Error {
                    reason: e.to_string(),
                }
            }
        };

        debug!(path = %ctx.path, state = ?state, "route evaluated");
        self.set_state(state.clone());
        state
    }

    /// Carry out an exit offered by the current state's notice.
    pub fn handle_exit(&self, exit: GuardExit) -> CoursegateResult<ExitAction> {
        match exit {
            GuardExit::Reauthenticate => {
                info!("re-authentication requested");
                self.sessions.logout()?;
                self.auditor.reset_navigation();
                self.set_state(GuardState::NotAuthenticated);
                Ok(ExitAction::Login)
            }
            GuardExit::GoHome => Ok(ExitAction::Navigate(self.home_path.clone())),
            GuardExit::Reload => Ok(ExitAction::Reevaluate),
        }
    }

    fn run_checks(&self, ctx: &ActivityContext) -> CoursegateResult<GuardState> {
        let Some(mut session) = self.sessions.load()? else {
            return Ok(GuardState::NotAuthenticated);
        };

        match self.auditor.check(Some(&session)) {
            Ok(()) => {}
            Err(CoursegateError::SessionInvalid { reason }) => {
                let mut payload = Payload::new();
                payload.insert("subjectId".to_string(), json!(session.subject_id));
                payload.insert("reason".to_string(), json!(reason));
                self.audit.append(AuditAction::SESSION_INVALID, payload);
                self.sessions.purge()?;
                return Ok(GuardState::InvalidSession { reason });
            }
            Err(CoursegateError::NotAuthenticated) => return Ok(GuardState::NotAuthenticated),
            Err(other) => return Err(other),
        }

        let report = self.auditor.classify(Some(&session), ctx);
        if report.is_suspicious() {
            return Ok(GuardState::Suspicious {
                flags: report.labels(),
            });
        }

        if !self.required_roles.is_empty()
            && !self
                .authority
                .is_authorized(Some(&session.role), &self.required_roles)
        {
            return Ok(GuardState::Forbidden);
        }

        self.sessions.touch(&mut session)?;
        Ok(GuardState::Valid)
    }

    fn set_state(&self, next: GuardState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = next;
    }
}
