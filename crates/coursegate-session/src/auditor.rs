//! Session validation and suspicious-activity triage.
//!
//! `SessionAuditor::validate` is a pure predicate over a session record.
//! `SessionAuditor::classify` runs three independent heuristics and writes a
//! `security_violation` entry for each one that fires:
//!
//! | heuristic          | fires when                                        |
//! |--------------------|---------------------------------------------------|
//! | `stale_session`    | the session is older than the max age             |
//! | `rapid_navigation` | the previous navigation was under the window ago  |
//! | `bot_user_agent`   | the user agent contains a bot marker (any case)   |
//!
//! The stale check repeats the expiry rule of `validate` on purpose: the two
//! are evaluated separately and must stay that way.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, warn};

use coursegate_contracts::{
    audit::{AuditAction, Payload},
    config::SessionConfig,
    error::{CoursegateError, CoursegateResult},
    session::SessionRecord,
};
use coursegate_core::traits::{AuditRecorder, Clock};

use crate::token;

/// Where the actor is and what client they use, for one navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityContext {
    pub path: String,
    pub user_agent: String,
}

impl ActivityContext {
    pub fn new(path: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// One suspicious-activity heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuspicionFlag {
    StaleSession,
    RapidNavigation,
    BotUserAgent,
}

impl SuspicionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuspicionFlag::StaleSession => "stale_session",
            SuspicionFlag::RapidNavigation => "rapid_navigation",
            SuspicionFlag::BotUserAgent => "bot_user_agent",
        }
    }
}

/// The heuristics that fired for one navigation, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspicionReport {
    pub flags: Vec<SuspicionFlag>,
}

impl SuspicionReport {
    pub fn is_suspicious(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn contains(&self, flag: SuspicionFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn labels(&self) -> Vec<String> {
        self.flags.iter().map(|f| f.as_str().to_string()).collect()
    }
}

/// Validates sessions and triages navigations.
///
/// Holds the rapid-navigation baseline: the timestamp of the last
/// [`SessionAuditor::classify`] call.
pub struct SessionAuditor {
    audit: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    last_navigation: Mutex<Option<DateTime<Utc>>>,
}

impl SessionAuditor {
    pub fn new(audit: Arc<dyn AuditRecorder>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            audit,
            clock,
            config,
            last_navigation: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Validation ───────────────────────────────────────────────────────────

    /// Return true if `session` may still be used.
    pub fn validate(&self, session: Option<&SessionRecord>) -> bool {
        self.check(session).is_ok()
    }

    /// Like [`SessionAuditor::validate`], naming the first failed rule.
    ///
    /// Returns `NotAuthenticated` for a missing session and
    /// `SessionInvalid` for every other failure.
    pub fn check(&self, session: Option<&SessionRecord>) -> CoursegateResult<()> {
        let session = session.ok_or(CoursegateError::NotAuthenticated)?;

        if session.subject_id.is_empty() || session.session_token.is_empty() {
            return Err(invalid("missing subject id or session token"));
        }
        if session.is_expired(self.clock.now(), self.config.max_age()) {
            return Err(invalid("session expired"));
        }
        if !token::is_well_formed(&session.session_token) {
            return Err(invalid("malformed session token"));
        }
        if !session.role.is_recognized() {
            return Err(invalid(&format!("unrecognized role '{}'", session.role)));
        }
        Ok(())
    }

    // ── Triage ───────────────────────────────────────────────────────────────

    /// Run every heuristic and record a violation for each that fires.
    ///
    /// Always moves the rapid-navigation baseline to now.
    pub fn classify(&self, session: Option<&SessionRecord>, ctx: &ActivityContext) -> SuspicionReport {
        let now = self.clock.now();
        let mut report = SuspicionReport::default();

        if let Some(s) = session {
            if s.is_expired(now, self.config.max_age()) {
                let mut payload = self.violation_payload(SuspicionFlag::StaleSession, session, ctx);
                payload.insert("loginTimestamp".to_string(), json!(s.login_timestamp));
                self.flag(&mut report, SuspicionFlag::StaleSession, payload);
            }
        }

        if let Some(delta) = self.swap_navigation_baseline(now) {
            if delta >= Duration::zero() && delta < self.config.rapid_navigation_window() {
                let mut payload = self.violation_payload(SuspicionFlag::RapidNavigation, session, ctx);
                payload.insert("deltaMs".to_string(), json!(delta.num_milliseconds()));
                self.flag(&mut report, SuspicionFlag::RapidNavigation, payload);
            }
        }

        if self.is_bot_user_agent(&ctx.user_agent) {
            let mut payload = self.violation_payload(SuspicionFlag::BotUserAgent, session, ctx);
            payload.insert("userAgent".to_string(), json!(ctx.user_agent));
            self.flag(&mut report, SuspicionFlag::BotUserAgent, payload);
        }

        debug!(path = %ctx.path, flags = ?report.labels(), "navigation classified");
        report
    }

    /// True if any heuristic fires.  See [`SessionAuditor::classify`].
    pub fn classify_suspicious(&self, session: Option<&SessionRecord>, ctx: &ActivityContext) -> bool {
        self.classify(session, ctx).is_suspicious()
    }

    /// Case-insensitive substring match against the configured bot markers.
    pub fn is_bot_user_agent(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_lowercase();
        self.config
            .bot_markers
            .iter()
            .any(|marker| !marker.is_empty() && ua.contains(&marker.to_lowercase()))
    }

    /// Forget the rapid-navigation baseline.
    pub fn reset_navigation(&self) {
        *self.last_navigation.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Store `now` as the baseline and return the time since the old one.
    fn swap_navigation_baseline(&self, now: DateTime<Utc>) -> Option<Duration> {
        let mut last = self.last_navigation.lock().unwrap_or_else(|p| p.into_inner());
        last.replace(now).map(|prev| now - prev)
    }

    fn violation_payload(
        &self,
        flag: SuspicionFlag,
        session: Option<&SessionRecord>,
        ctx: &ActivityContext,
    ) -> Payload {
        let mut payload = Payload::new();
        payload.insert("type".to_string(), json!(flag.as_str()));
        payload.insert(
            "subjectId".to_string(),
            json!(session.map(|s| s.subject_id.as_str())),
        );
        payload.insert("path".to_string(), json!(ctx.path));
        payload
    }

    fn flag(&self, report: &mut SuspicionReport, flag: SuspicionFlag, payload: Payload) {
        warn!(heuristic = %flag.as_str(), "suspicious activity");
        self.audit.record(AuditAction::SECURITY_VIOLATION, payload);
        report.flags.push(flag);
    }
}

fn invalid(reason: &str) -> CoursegateError {
    CoursegateError::SessionInvalid {
        reason: reason.to_string(),
    }
}
