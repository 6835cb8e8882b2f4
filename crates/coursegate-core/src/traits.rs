//! Core trait definitions for the coursegate access layer.
//!
//! These four traits are the seams every service is wired through:
//!
//! - `KeyValueStore`   : local persisted storage (JSON-string values)
//! - `Clock`           : the source of "now"
//! - `AuditRecorder`   : the audit side channel decision code writes to
//! - `RemoteAuditSink` : best-effort out-of-band delivery of entries
//!
//! Services receive these as injected handles; nothing reaches for a global.

use chrono::{DateTime, Utc};

use coursegate_contracts::{
    audit::{AuditLogEntry, Payload},
    error::CoursegateResult,
};

/// A string-keyed store of JSON-encoded values.
///
/// Reads and writes are treated as instantaneous.  Writers are not
/// coordinated: two handles over the same backing storage race
/// last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Return the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> CoursegateResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> CoursegateResult<()>;

    /// Delete `key`.  Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoursegateResult<()>;
}

/// The time source.  Injected so expiry and rate checks are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The audit side channel used by decision code.
///
/// `record` is infallible by signature: an audit write can never block or
/// alter the decision that triggered it.  Implementations swallow their own
/// failures.
pub trait AuditRecorder: Send + Sync {
    fn record(&self, action: &str, payload: Payload);
}

/// Out-of-band delivery of selected audit entries.
///
/// Called fire-and-forget: the caller never waits on, retries, or reports
/// an error from `deliver`.
pub trait RemoteAuditSink: Send + Sync {
    fn deliver(&self, entry: &AuditLogEntry) -> CoursegateResult<()>;
}
