//! The persisted session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The authenticated-session record for one logged-in actor.
///
/// Stored JSON-encoded under the session storage key.  Only
/// `last_activity_timestamp` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub subject_id: String,
    pub session_token: String,
    pub role: Role,
    pub login_timestamp: DateTime<Utc>,
    pub last_activity_timestamp: DateTime<Utc>,
}

impl SessionRecord {
    /// Time elapsed since login, as seen at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.login_timestamp
    }

    /// True once the session is strictly older than `max_age`.
    ///
    /// A session exactly `max_age` old is still live.
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}
