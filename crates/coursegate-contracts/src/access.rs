//! Access requests and route-guard outcomes.
//!
//! `AccessRequest` is the input to a role check.  `GuardState` is the
//! state machine a route guard walks on every (re-)evaluation:
//!
//! ```text
//! Validating ──→ Valid
//!            ├─→ NotAuthenticated
//!            ├─→ InvalidSession
//!            ├─→ Suspicious
//!            ├─→ Forbidden
//!            └─→ Error
//! ```
//!
//! Every state other than `Validating` is terminal.  A non-`Valid` state
//! offers only the exits listed by [`GuardState::exits`]; nothing retries
//! automatically.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// One role check.  An empty `allowed_roles` means no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub actor_role: Option<Role>,
    pub allowed_roles: BTreeSet<Role>,
}

impl AccessRequest {
    pub fn new<I, R>(actor_role: Option<Role>, allowed_roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self {
            actor_role,
            allowed_roles: allowed_roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// A user-facing way out of a terminal guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardExit {
    /// Destroy the session and start the login flow.
    Reauthenticate,
    /// Navigate to the home route.
    GoHome,
    /// Reload and re-run validation by hand.
    Reload,
}

/// The full-screen notice shown for a terminal, non-`Valid` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of a route-guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    /// Checks are running.  The only non-terminal state.
    Validating,
    /// Protected content may render.
    Valid,
    /// No actor identity is present.
    NotAuthenticated,
    /// The stored session failed validation and has been purged.
    InvalidSession { reason: String },
    /// One or more suspicious-activity heuristics fired.
    Suspicious { flags: Vec<String> },
    /// The session is valid but its role does not satisfy the route.
    Forbidden,
    /// An unexpected failure inside the check sequence.
    Error { reason: String },
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuardState::Validating)
    }

    pub fn permits_content(&self) -> bool {
        matches!(self, GuardState::Valid)
    }

    /// The exits a notice for this state offers.
    pub fn exits(&self) -> &'static [GuardExit] {
        match self {
            GuardState::Validating | GuardState::Valid => &[],
            GuardState::NotAuthenticated
            | GuardState::InvalidSession { .. }
            | GuardState::Suspicious { .. } => &[GuardExit::Reauthenticate, GuardExit::GoHome],
            GuardState::Forbidden => &[GuardExit::GoHome],
            GuardState::Error { .. } => &[GuardExit::Reload, GuardExit::GoHome],
        }
    }

    /// The notice to render, or `None` when nothing should block the view.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            GuardState::Validating | GuardState::Valid => None,
            GuardState::NotAuthenticated => Some(Notice::new(
                "Sign in required",
                "You need to sign in before you can open this page.",
            )),
            GuardState::InvalidSession { reason } => Some(Notice::new(
                "Session expired",
                format!("Your session is no longer valid ({reason}). Please sign in again."),
            )),
            GuardState::Suspicious { flags } => Some(Notice::new(
                "Unusual activity detected",
                format!(
                    "For your security, please sign in again. Detected: {}.",
                    flags.join(", ")
                ),
            )),
            GuardState::Forbidden => Some(Notice::new(
                "Access denied",
                "Your role does not grant access to this page.",
            )),
            GuardState::Error { .. } => Some(Notice::new(
                "System error",
                "Something went wrong while checking your access. Reload to try again.",
            )),
        }
    }
}
