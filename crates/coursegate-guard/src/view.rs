//! Role-gated views.

use std::{collections::BTreeSet, sync::Arc};

use coursegate_contracts::{access::Notice, role::Role};
use coursegate_policy::RoleAuthority;

/// What a gated view resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatedView<T> {
    /// Access granted; the guarded content.
    Content(T),
    /// Access denied; the caller-supplied fallback.
    Fallback(T),
    /// Access denied and no fallback was supplied.
    AccessDenied(Notice),
}

impl<T> GatedView<T> {
    pub fn is_granted(&self) -> bool {
        matches!(self, GatedView::Content(_))
    }
}

/// Wraps content that only some roles may see.
pub struct RoleGatedView {
    authority: Arc<RoleAuthority>,
    allowed_roles: BTreeSet<Role>,
}

impl RoleGatedView {
    pub fn new(authority: Arc<RoleAuthority>, allowed_roles: BTreeSet<Role>) -> Self {
        Self {
            authority,
            allowed_roles,
        }
    }

    /// Resolve the view for `actor`.
    ///
    /// `content` is only invoked when access is granted.
    pub fn render<T>(
        &self,
        actor: Option<&Role>,
        content: impl FnOnce() -> T,
        fallback: Option<T>,
    ) -> GatedView<T> {
        if self.authority.is_authorized(actor, &self.allowed_roles) {
            return GatedView::Content(content());
        }
        match fallback {
            Some(f) => GatedView::Fallback(f),
            None => GatedView::AccessDenied(Notice {
                title: "Access denied".to_string(),
                message: "You do not have permission to view this content.".to_string(),
            }),
        }
    }
}
