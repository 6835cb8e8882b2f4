//! Rank-inheriting role authorization.
//!
//! Decision algorithm for `(actor, allowed)`:
//!
//! 1. `allowed` empty → grant (no restriction).
//! 2. No actor → deny.
//! 3. Actor's role listed verbatim in `allowed` → grant, whatever its rank.
//! 4. Otherwise grant iff `rank(actor) >= min(required_rank(r) for r in allowed)`,
//!    where unrecognized allowed roles can never be reached by rank.
//!
//! Every decision is written to the audit recorder.  The recorder cannot
//! fail the call, so the decision is the same whether or not it was logged.

use std::{collections::BTreeSet, sync::Arc};

use serde_json::{json, Value};
use tracing::debug;

use coursegate_contracts::{
    access::AccessRequest,
    audit::{AuditAction, Payload},
    role::Role,
};
use coursegate_core::traits::AuditRecorder;

/// The lowest rank that satisfies `allowed`, or `None` when no listed role
/// is reachable by rank.
pub fn min_required_rank(allowed: &BTreeSet<Role>) -> Option<u8> {
    allowed.iter().filter_map(Role::required_rank).min()
}

/// The pure decision, without the audit side effect.
pub fn decide(actor_role: Option<&Role>, allowed_roles: &BTreeSet<Role>) -> bool {
    if allowed_roles.is_empty() {
        return true;
    }
    let Some(actor) = actor_role else {
        return false;
    };
    if allowed_roles.contains(actor) {
        return true;
    }
    match min_required_rank(allowed_roles) {
        Some(required) => actor.rank() >= required,
        None => false,
    }
}

/// Decides whether an actor's role grants access to a guarded resource.
pub struct RoleAuthority {
    audit: Arc<dyn AuditRecorder>,
}

impl RoleAuthority {
    pub fn new(audit: Arc<dyn AuditRecorder>) -> Self {
        Self { audit }
    }

    /// Decide and record one `role_check` entry.
    pub fn is_authorized(&self, actor_role: Option<&Role>, allowed_roles: &BTreeSet<Role>) -> bool {
        let granted = decide(actor_role, allowed_roles);

        debug!(
            actor_role = %actor_role.map(Role::as_str).unwrap_or("none"),
            allowed = allowed_roles.len(),
            granted,
            "role check"
        );

        let mut payload = Payload::new();
        payload.insert(
            "actorRole".to_string(),
            actor_role.map_or(Value::Null, |r| json!(r.as_str())),
        );
        payload.insert(
            "allowedRoles".to_string(),
            json!(allowed_roles.iter().map(Role::as_str).collect::<Vec<_>>()),
        );
        payload.insert("accessGranted".to_string(), json!(granted));
        self.audit.record(AuditAction::ROLE_CHECK, payload);

        granted
    }

    /// [`RoleAuthority::is_authorized`] over an [`AccessRequest`].
    pub fn check(&self, request: &AccessRequest) -> bool {
        self.is_authorized(request.actor_role.as_ref(), &request.allowed_roles)
    }
}
