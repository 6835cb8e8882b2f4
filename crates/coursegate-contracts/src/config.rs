//! Configuration for the access layer.
//!
//! Every recognized option is listed here with its default.  A TOML file
//! only needs the keys it overrides:
//!
//! ```toml
//! [audit]
//! capacity = 500
//!
//! [session]
//! max_age_secs = 3600
//! ```

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    audit::AuditAction,
    error::{CoursegateError, CoursegateResult},
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoursegateConfig {
    pub audit: AuditConfig,
    pub session: SessionConfig,
    pub display: DisplayConfig,
}

impl CoursegateConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `CoursegateError::ConfigError` on malformed TOML, unknown
    /// keys, or values that fail [`CoursegateConfig::validate`].
    pub fn from_toml_str(s: &str) -> CoursegateResult<Self> {
        let config: CoursegateConfig =
            toml::from_str(s).map_err(|e| CoursegateError::ConfigError {
                reason: format!("failed to parse config TOML: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> CoursegateResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| CoursegateError::ConfigError {
                reason: format!("failed to read config file '{}': {}", path.display(), e),
            })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> CoursegateResult<()> {
        if self.audit.capacity == 0 {
            return Err(CoursegateError::ConfigError {
                reason: "audit.capacity must be at least 1".to_string(),
            });
        }
        if self.audit.storage_key.is_empty() || self.session.storage_key.is_empty() {
            return Err(CoursegateError::ConfigError {
                reason: "storage keys must not be empty".to_string(),
            });
        }
        if self.audit.storage_key == self.session.storage_key {
            return Err(CoursegateError::ConfigError {
                reason: format!(
                    "audit and session share storage key '{}'",
                    self.audit.storage_key
                ),
            });
        }
        if self.session.max_age_secs <= 0 {
            return Err(CoursegateError::ConfigError {
                reason: "session.max_age_secs must be positive".to_string(),
            });
        }
        if self.session.max_age_secs > SessionConfig::MAX_AGE_SECS_LIMIT {
            return Err(CoursegateError::ConfigError {
                reason: format!(
                    "session.max_age_secs must be at most {}",
                    SessionConfig::MAX_AGE_SECS_LIMIT
                ),
            });
        }
        if self.session.rapid_navigation_ms < 0 {
            return Err(CoursegateError::ConfigError {
                reason: "session.rapid_navigation_ms must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Audit log options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Maximum number of stored entries.  Oldest are evicted first.
    pub capacity: usize,
    /// Storage key holding the JSON-encoded entry list.
    pub storage_key: String,
    /// Actions forwarded to the remote sink in addition to urgent ones.
    pub remote_actions: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            storage_key: "audit_logs".to_string(),
            remote_actions: [
                AuditAction::USER_LOGIN,
                AuditAction::USER_LOGOUT,
                AuditAction::MODULE_COMPLETED,
                AuditAction::QUIZ_COMPLETED,
                AuditAction::CERTIFICATE_GENERATED,
                AuditAction::SECURITY_VIOLATION,
            ]
            .iter()
            .map(|a| a.to_string())
            .collect(),
        }
    }
}

/// Session validation and triage options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Storage key holding the JSON-encoded session record.
    pub storage_key: String,
    /// Session lifetime measured from login.
    pub max_age_secs: i64,
    /// Navigations closer together than this are flagged.
    pub rapid_navigation_ms: i64,
    /// Case-insensitive user-agent substrings that mark automated clients.
    pub bot_markers: Vec<String>,
    /// Route the `GoHome` exit navigates to.
    pub home_path: String,
}

impl SessionConfig {
    /// Largest lifetime a `Duration` can hold, in whole seconds.
    pub const MAX_AGE_SECS_LIMIT: i64 = i64::MAX / 1000;

    /// Session lifetime, clamped into the range a `Duration` can hold.
    pub fn max_age(&self) -> Duration {
        Duration::seconds(self.max_age_secs.clamp(0, Self::MAX_AGE_SECS_LIMIT))
    }

    /// Rapid-navigation window.  Negative values count as zero.
    pub fn rapid_navigation_window(&self) -> Duration {
        Duration::milliseconds(self.rapid_navigation_ms.max(0))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "user_data".to_string(),
            max_age_secs: 24 * 60 * 60,
            rapid_navigation_ms: 100,
            bot_markers: ["bot", "crawler", "spider", "scraper"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            home_path: "/".to_string(),
        }
    }
}

/// Keys of the standalone display flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub theme_key: String,
    pub animations_key: String,
    pub sound_key: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme_key: "theme".to_string(),
            animations_key: "animations_enabled".to_string(),
            sound_key: "sound_enabled".to_string(),
        }
    }
}
