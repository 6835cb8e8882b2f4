//! # coursegate-session
//!
//! Session validation, suspicious-activity triage, and session persistence.
//!
//! ## Overview
//!
//! - [`SessionAuditor`] decides whether a [`SessionRecord`] is still live
//!   (shape, age, role) and flags anomalous navigations.
//! - [`SessionStore`] owns the persisted record: login, logout, touch.
//!
//! [`SessionRecord`]: coursegate_contracts::session::SessionRecord

pub mod auditor;
pub mod store;
pub mod token;

pub use auditor::{ActivityContext, SessionAuditor, SuspicionFlag, SuspicionReport};
pub use store::SessionStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
