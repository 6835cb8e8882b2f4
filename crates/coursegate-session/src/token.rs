//! Session token shape.
//!
//! A well-formed token is `session_<digits>_<lowercase alphanumerics>`.
//! Tokens are checked by shape only; they are not signed.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use coursegate_audit::id::random_suffix;

const TOKEN_PREFIX: &str = "session";

/// Return true if `token` has the `session_<digits>_<lowercase-alnum>` shape.
pub fn is_well_formed(token: &str) -> bool {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TOKEN_REGEX
        .get_or_init(|| Regex::new(r"^session_[0-9]+_[a-z0-9]+$").expect("token regex is valid"));
    regex.is_match(token)
}

/// Mint a token for a login at `at`.
pub fn mint(at: DateTime<Utc>) -> String {
    format!("{}_{}_{}", TOKEN_PREFIX, at.timestamp_millis(), random_suffix())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn minted_tokens_are_well_formed() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let token = mint(at);
        assert!(is_well_formed(&token), "minted token {token} fails its own shape");
        assert!(token.starts_with(&format!("session_{}_", at.timestamp_millis())));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for bad in [
            "abc123",
            "",
            "session_",
            "session_123_",
            "session__abc",
            "session_12a_abc",
            "session_123_ABC",
            "session_123_abc-def",
            "Session_123_abc",
            "xsession_123_abc",
            "session_123_abc\n",
        ] {
            assert!(!is_well_formed(bad), "{bad:?} should be malformed");
        }
    }

    #[test]
    fn minimal_token_is_accepted() {
        assert!(is_well_formed("session_0_a"));
        assert!(is_well_formed("session_1700000000000_k3j9x0q2z"));
    }
}
