//! # coursegate-core
//!
//! The seams of the coursegate access layer.
//!
//! This crate provides:
//! - The four core traits (`KeyValueStore`, `Clock`, `AuditRecorder`,
//!   `RemoteAuditSink`)
//! - Reference implementations: `MemoryStore`, `JsonFileStore`,
//!   `SystemClock`, `ManualClock`, `NullSink`, `ChannelSink`
//! - `DisplayPreferences`, the reader for the standalone display flags
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coursegate_core::{MemoryStore, SystemClock, traits::KeyValueStore};
//!
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! ```

pub mod clock;
pub mod display;
pub mod sink;
pub mod store;
pub mod traits;

pub use clock::{ManualClock, SystemClock};
pub use display::DisplayPreferences;
pub use sink::{ChannelSink, NullSink};
pub use store::{read_json, write_json, JsonFileStore, MemoryStore};

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use coursegate_contracts::{
        audit::AuditLogEntry, config::DisplayConfig, error::CoursegateError,
    };

    use super::*;
    use crate::traits::{Clock, KeyValueStore, RemoteAuditSink};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "coursegate-core-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    // ── MemoryStore ──────────────────────────────────────────────────────────

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "\"v\"").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("\"v\""));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        // Removing again is fine.
        store.remove("k").unwrap();
    }

    #[test]
    fn json_helpers_round_trip_through_store() {
        let store = MemoryStore::new();
        write_json(&store, "list", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = read_json(&store, "list").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = read_json(&store, "nothing").unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn corrupt_json_surfaces_serialization_error() {
        let store = MemoryStore::new();
        store.set("bad", "{not json").unwrap();
        let result: Result<Option<Vec<i32>>, _> = read_json(&store, "bad");
        assert!(matches!(result, Err(CoursegateError::Serialization { .. })));
    }

    // ── JsonFileStore ────────────────────────────────────────────────────────

    #[test]
    fn file_store_persists_across_handles() {
        let dir = temp_dir("persist");
        {
            let store = JsonFileStore::open(&dir).unwrap();
            store.set("user_data", "{\"a\":1}").unwrap();
        }
        let reopened = JsonFileStore::open(&dir).unwrap();
        assert_eq!(
            reopened.get("user_data").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        reopened.remove("user_data").unwrap();
        assert_eq!(reopened.get("user_data").unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = temp_dir("keys");
        let store = JsonFileStore::open(&dir).unwrap();
        match store.set("../escape", "1") {
            Err(CoursegateError::StorageFailed { reason }) => {
                assert!(reason.contains("invalid storage key"));
            }
            other => panic!("expected StorageFailed, got {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    // ── Clocks ───────────────────────────────────────────────────────────────

    #[test]
    fn manual_clock_moves_only_when_told() {
        let start = Utc.timestamp_opt(1_000, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::milliseconds(250));
        assert_eq!(clock.now(), start + Duration::milliseconds(250));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    // ── Sinks ────────────────────────────────────────────────────────────────

    #[test]
    fn channel_sink_forwards_entries() {
        let (sink, rx) = ChannelSink::new();
        let entry = AuditLogEntry {
            id: "1_x".to_string(),
            timestamp: Utc::now(),
            action: "user_login".to_string(),
            payload: Default::default(),
            session_id: AuditLogEntry::NO_SESSION.to_string(),
            subject_id: None,
            context_url: String::new(),
            urgent: false,
        };
        sink.deliver(&entry).unwrap();
        assert_eq!(rx.try_recv().unwrap().id, "1_x");

        drop(rx);
        assert!(sink.deliver(&entry).is_err());
    }

    // ── DisplayPreferences ───────────────────────────────────────────────────

    #[test]
    fn display_preferences_default_when_unset() {
        let store = MemoryStore::new();
        let prefs = DisplayPreferences::load(&store, &DisplayConfig::default()).unwrap();
        assert_eq!(prefs, DisplayPreferences::default());
    }

    #[test]
    fn display_preferences_read_back_saved_flags() {
        let store = MemoryStore::new();
        let keys = DisplayConfig::default();
        let prefs = DisplayPreferences {
            theme: "light".to_string(),
            animations_enabled: false,
            sound_enabled: true,
        };
        prefs.save(&store, &keys).unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("\"light\""));
        assert_eq!(DisplayPreferences::load(&store, &keys).unwrap(), prefs);
    }
}
