//! Entry id generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Length of the random part of an entry id.
pub const SUFFIX_LEN: usize = 9;

/// Build an id of the form `<unix-millis>_<9 lowercase hex chars>`.
///
/// Uniqueness is best-effort.  Ids are never used as external identifiers.
pub fn entry_id(at: DateTime<Utc>) -> String {
    format!("{}_{}", at.timestamp_millis(), random_suffix())
}

/// A short lowercase alphanumeric string.
pub fn random_suffix() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(SUFFIX_LEN);
    simple
}
