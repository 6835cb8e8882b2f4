//! The persisted audit log.
//!
//! `StoredAuditLog` keeps every entry as one JSON array under a single
//! storage key.  Each append is a read-modify-write of that key followed by
//! FIFO trimming to the configured capacity.  Nothing coordinates two
//! handles over the same backing store; the last writer wins.
//!
//! Failures never reach the caller.  They are reported through `tracing`
//! and the triggering operation continues.

use std::{collections::BTreeMap, sync::Arc, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use coursegate_contracts::{
    audit::{AuditAction, AuditLogEntry, AuditQuery, Payload},
    config::AuditConfig,
    error::{CoursegateError, CoursegateResult},
};
use coursegate_core::{
    read_json, write_json,
    traits::{AuditRecorder, Clock, KeyValueStore, RemoteAuditSink},
    NullSink,
};

use crate::id::entry_id;

/// Who and where, stamped on each new entry.
#[derive(Debug, Default)]
struct EntryContext {
    session_id: Option<String>,
    subject_id: Option<String>,
    location: String,
}

/// A size-bounded, append-only audit log over a `KeyValueStore`.
pub struct StoredAuditLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn RemoteAuditSink>,
    config: AuditConfig,
    context: Mutex<EntryContext>,
}

impl StoredAuditLog {
    /// Create a log with no remote sink.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: AuditConfig) -> Self {
        Self {
            store,
            clock,
            sink: Arc::new(NullSink),
            config,
            context: Mutex::new(EntryContext::default()),
        }
    }

    /// Forward urgent and allow-listed entries to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn RemoteAuditSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    // ── Context ──────────────────────────────────────────────────────────────

    /// Stamp subsequent entries with this subject and session.
    pub fn bind_session(&self, subject_id: impl Into<String>, session_id: impl Into<String>) {
        let mut ctx = self.context.lock().unwrap_or_else(|p| p.into_inner());
        ctx.subject_id = Some(subject_id.into());
        ctx.session_id = Some(session_id.into());
    }

    /// Subsequent entries carry `no_session` and no subject.
    pub fn clear_session(&self) {
        let mut ctx = self.context.lock().unwrap_or_else(|p| p.into_inner());
        ctx.subject_id = None;
        ctx.session_id = None;
    }

    /// Set the context URL stamped on subsequent entries.
    pub fn set_location(&self, url: impl Into<String>) {
        let mut ctx = self.context.lock().unwrap_or_else(|p| p.into_inner());
        ctx.location = url.into();
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// Append one entry.  Never fails from the caller's point of view.
    ///
    /// The entry is persisted (trimming the oldest entries past capacity)
    /// and then, when urgent or allow-listed, handed to the remote sink.
    pub fn append(&self, action: &str, payload: Payload) {
        let entry = self.build_entry(action, payload);

        if entry.urgent {
            warn!(
                action = %entry.action,
                session_id = %entry.session_id,
                payload = %serde_json::Value::Object(entry.payload.clone()),
                "security event recorded"
            );
        } else {
            debug!(action = %entry.action, id = %entry.id, "audit entry recorded");
        }

        if let Err(e) = self.persist(&entry) {
            warn!(action = %entry.action, error = %e, "failed to persist audit entry");
        }

        self.forward(&entry);
    }

    /// Remove every entry older than `days` days.  Returns how many went.
    ///
    /// Pruning the same cutoff twice removes nothing the second time.
    pub fn prune_older_than(&self, days: u32) -> usize {
        let Some(cutoff) = Duration::try_days(i64::from(days))
            .and_then(|age| self.clock.now().checked_sub_signed(age))
        else {
            debug!(days, "prune cutoff precedes every representable time");
            return 0;
        };
        match self.remove_before(cutoff) {
            Ok(removed) => {
                debug!(days, removed, "pruned audit log");
                removed
            }
            Err(e) => {
                warn!(days, error = %e, "failed to prune audit log");
                0
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Lazily filter the stored entries, oldest first.
    ///
    /// Every call re-reads storage; no cursor is kept between calls.  An
    /// unreadable log yields an empty sequence.
    pub fn query(&self, criteria: AuditQuery) -> impl Iterator<Item = AuditLogEntry> {
        self.load_or_empty()
            .into_iter()
            .filter(move |e| criteria.matches(e))
    }

    /// Every stored entry, oldest first.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.load_or_empty()
    }

    pub fn len(&self) -> usize {
        self.load_or_empty().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries per action name.
    pub fn counts_by_action(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.load_or_empty() {
            *counts.entry(entry.action).or_insert(0) += 1;
        }
        counts
    }

    /// Pretty-printed JSON of the whole log.
    pub fn export_json(&self) -> CoursegateResult<String> {
        let entries = self.load()?;
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn build_entry(&self, action: &str, payload: Payload) -> AuditLogEntry {
        let now = self.clock.now();
        let ctx = self.context.lock().unwrap_or_else(|p| p.into_inner());
        AuditLogEntry {
            id: entry_id(now),
            timestamp: now,
            action: action.to_string(),
            payload,
            session_id: ctx
                .session_id
                .clone()
                .unwrap_or_else(|| AuditLogEntry::NO_SESSION.to_string()),
            subject_id: ctx.subject_id.clone(),
            context_url: ctx.location.clone(),
            urgent: AuditAction::is_urgent(action),
        }
    }

    fn load(&self) -> CoursegateResult<Vec<AuditLogEntry>> {
        let stored = read_json::<Vec<AuditLogEntry>>(self.store.as_ref(), &self.config.storage_key)?;
        Ok(stored.unwrap_or_default())
    }

    fn remove_before(&self, cutoff: DateTime<Utc>) -> CoursegateResult<usize> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            write_json(self.store.as_ref(), &self.config.storage_key, &entries)?;
        }
        Ok(removed)
    }

    fn load_or_empty(&self) -> Vec<AuditLogEntry> {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read audit log");
            Vec::new()
        })
    }

    /// Like `load`, but an undecodable slot is moved to `<storage_key>_corrupt`
    /// and replaced by an empty list so appends keep landing.
    fn load_for_write(&self) -> CoursegateResult<Vec<AuditLogEntry>> {
        match self.load() {
            Err(CoursegateError::Serialization { reason }) => {
                self.set_aside_corrupt(&reason)?;
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn set_aside_corrupt(&self, reason: &str) -> CoursegateResult<()> {
        let key = &self.config.storage_key;
        let corrupt_key = format!("{key}_corrupt");
        if let Some(raw) = self.store.get(key)? {
            self.store.set(&corrupt_key, &raw)?;
        }
        warn!(
            key = %key,
            corrupt_key = %corrupt_key,
            reason,
            "audit log undecodable, moved aside and restarted"
        );
        Ok(())
    }

    fn persist(&self, entry: &AuditLogEntry) -> CoursegateResult<()> {
        let mut entries = self.load_for_write()?;
        entries.push(entry.clone());
        if entries.len() > self.config.capacity {
            let excess = entries.len() - self.config.capacity;
            entries.drain(..excess);
        }
        write_json(self.store.as_ref(), &self.config.storage_key, &entries)
    }

    fn should_forward(&self, entry: &AuditLogEntry) -> bool {
        entry.urgent || self.config.remote_actions.iter().any(|a| a == &entry.action)
    }

    fn forward(&self, entry: &AuditLogEntry) {
        if !self.should_forward(entry) {
            return;
        }
        if let Err(e) = self.sink.deliver(entry) {
            debug!(action = %entry.action, error = %e, "remote audit delivery dropped");
        }
    }
}

impl AuditRecorder for StoredAuditLog {
    fn record(&self, action: &str, payload: Payload) {
        self.append(action, payload);
    }
}
