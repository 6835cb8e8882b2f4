//! The persisted session record and its lifecycle.
//!
//! One `SessionRecord` lives under the session storage key.  `login` creates
//! it, `touch` is its only mutator, and `logout` / `purge` destroy it.  The
//! store keeps the audit log's session binding in step with the record.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use coursegate_audit::StoredAuditLog;
use coursegate_contracts::{
    audit::{AuditAction, Payload},
    config::SessionConfig,
    error::CoursegateResult,
    role::Role,
    session::SessionRecord,
};
use coursegate_core::{
    read_json, write_json,
    traits::{Clock, KeyValueStore},
};

use crate::token;

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    audit: Arc<StoredAuditLog>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        audit: Arc<StoredAuditLog>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            audit,
            clock,
            config,
        }
    }

    /// Start a session: mint a token, persist the record, bind the audit
    /// context, and record `user_login`.
    pub fn login(&self, subject_id: impl Into<String>, role: Role) -> CoursegateResult<SessionRecord> {
        let now = self.clock.now();
        let record = SessionRecord {
            subject_id: subject_id.into(),
            session_token: token::mint(now),
            role,
            login_timestamp: now,
            last_activity_timestamp: now,
        };
        self.save(&record)?;
        self.audit
            .bind_session(record.subject_id.clone(), record.session_token.clone());

        let mut payload = Payload::new();
        payload.insert("subjectId".to_string(), json!(record.subject_id));
        payload.insert("role".to_string(), json!(record.role.as_str()));
        self.audit.append(AuditAction::USER_LOGIN, payload);

        info!(subject_id = %record.subject_id, role = %record.role, "session started");
        Ok(record)
    }

    /// End the current session, if any: record `user_logout` and purge.
    pub fn logout(&self) -> CoursegateResult<()> {
        let current = self.load().ok().flatten();
        let mut payload = Payload::new();
        payload.insert(
            "subjectId".to_string(),
            json!(current.as_ref().map(|s| s.subject_id.as_str())),
        );
        self.audit.append(AuditAction::USER_LOGOUT, payload);
        self.purge()
    }

    /// Read the persisted record.
    pub fn load(&self) -> CoursegateResult<Option<SessionRecord>> {
        read_json(self.store.as_ref(), &self.config.storage_key)
    }

    /// Read the persisted record and rebind the audit context to it.
    ///
    /// Used once at startup, when a previous process left a session behind.
    pub fn resume(&self) -> CoursegateResult<Option<SessionRecord>> {
        let record = self.load()?;
        match &record {
            Some(r) => self
                .audit
                .bind_session(r.subject_id.clone(), r.session_token.clone()),
            None => self.audit.clear_session(),
        }
        Ok(record)
    }

    pub fn save(&self, record: &SessionRecord) -> CoursegateResult<()> {
        write_json(self.store.as_ref(), &self.config.storage_key, record)
    }

    /// Delete the persisted record and unbind the audit context.
    pub fn purge(&self) -> CoursegateResult<()> {
        debug!(key = %self.config.storage_key, "purging session");
        self.audit.clear_session();
        self.store.remove(&self.config.storage_key)
    }

    /// Set `last_activity_timestamp` to now and persist the record.
    pub fn touch(&self, session: &mut SessionRecord) -> CoursegateResult<()> {
        session.last_activity_timestamp = self.clock.now();
        self.save(session)
    }
}
