//! Audit log entry and query types.
//!
//! `AuditLogEntry` is one stored record.  `AuditQuery` is the filter the
//! audit log applies lazily when entries are read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form structured detail attached to an entry.
pub type Payload = Map<String, Value>;

/// Well-known action names.
///
/// Actions are plain strings so callers may log their own; these are the
/// ones the access layer itself emits or routes specially.
pub struct AuditAction;

impl AuditAction {
    pub const USER_LOGIN: &'static str = "user_login";
    pub const USER_LOGOUT: &'static str = "user_logout";
    pub const MODULE_COMPLETED: &'static str = "module_completed";
    pub const QUIZ_COMPLETED: &'static str = "quiz_completed";
    pub const CERTIFICATE_GENERATED: &'static str = "certificate_generated";
    pub const SECURITY_VIOLATION: &'static str = "security_violation";
    pub const ROLE_CHECK: &'static str = "role_check";
    pub const SESSION_INVALID: &'static str = "session_invalid";
    pub const VALIDATION_ERROR: &'static str = "validation_error";

    /// True for actions that must be delivered out of band.
    pub fn is_urgent(action: &str) -> bool {
        action == Self::SECURITY_VIOLATION
    }
}

/// A single append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// `<unix-millis>_<random suffix>`.  Unique on a best-effort basis.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub payload: Payload,
    /// The bound session token, or [`AuditLogEntry::NO_SESSION`].
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub context_url: String,
    #[serde(default)]
    pub urgent: bool,
}

impl AuditLogEntry {
    /// Session id recorded when no session is bound.
    pub const NO_SESSION: &'static str = "no_session";
}

/// Criteria for reading entries back.  Unset fields match everything.
///
/// The timestamp range is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Return true if `entry` satisfies every set criterion.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(subject) = &self.subject_id {
            if entry.subject_id.as_deref() != Some(subject.as_str()) {
                return false;
            }
        }
        if let Some(session) = &self.session_id {
            if &entry.session_id != session {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.timestamp > to {
                return false;
            }
        }
        true
    }
}
