//! Remote audit sink implementations.
//!
//! The wire protocol to an audit backend is out of scope; `ChannelSink`
//! hands entries to whatever consumer owns the receiving end.

use std::sync::{mpsc, Mutex};

use coursegate_contracts::{
    audit::AuditLogEntry,
    error::{CoursegateError, CoursegateResult},
};

use crate::traits::RemoteAuditSink;

/// Drops every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RemoteAuditSink for NullSink {
    fn deliver(&self, _entry: &AuditLogEntry) -> CoursegateResult<()> {
        Ok(())
    }
}

/// Pushes entries onto an mpsc channel.  Sending never blocks.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<AuditLogEntry>>,
}

impl ChannelSink {
    /// Create a sink and the receiver its entries arrive on.
    pub fn new() -> (Self, mpsc::Receiver<AuditLogEntry>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl RemoteAuditSink for ChannelSink {
    fn deliver(&self, entry: &AuditLogEntry) -> CoursegateResult<()> {
        let tx = self.tx.lock().map_err(|e| CoursegateError::StorageFailed {
            reason: format!("sink lock poisoned: {}", e),
        })?;
        tx.send(entry.clone()).map_err(|_| CoursegateError::StorageFailed {
            reason: "remote audit receiver disconnected".to_string(),
        })
    }
}
