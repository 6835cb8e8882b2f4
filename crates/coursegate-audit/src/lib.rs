//! # coursegate-audit
//!
//! Size-bounded, append-only audit log for the coursegate access layer.
//!
//! ## Overview
//!
//! [`StoredAuditLog`] persists entries as one JSON array in a
//! [`KeyValueStore`](coursegate_core::traits::KeyValueStore).  Once the
//! configured capacity (1000 by default) is exceeded the oldest entries are
//! evicted.  Urgent entries (`security_violation`) and a fixed allow-list of
//! learning and session actions are also handed to a
//! [`RemoteAuditSink`](coursegate_core::traits::RemoteAuditSink),
//! fire-and-forget.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coursegate_audit::StoredAuditLog;
//! use coursegate_contracts::audit::AuditQuery;
//!
//! let log = StoredAuditLog::new(store, clock, config.audit.clone());
//! log.append("module_completed", payload);
//! let completions: Vec<_> = log.query(AuditQuery::new().action("module_completed")).collect();
//! ```

pub mod id;
pub mod log;

pub use id::entry_id;
pub use log::StoredAuditLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
