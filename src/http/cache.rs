//! HTTP cache validators
//!
//! `ETag`s come from file metadata (modification time and size), so a
//! conditional request can be answered without reading the file.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Strong `ETag` from modification time and size, e.g. `"65e1f0a1-1a4"`
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let secs = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("\"{secs:x}-{len:x}\"")
}

/// Whether `If-None-Match` matches `etag`
///
/// Accepts a comma-separated list, `*`, and weak (`W/`) validators.
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
    })
}

/// IMF-fixdate for `Last-Modified`, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generate_etag() {
        let modified = UNIX_EPOCH + Duration::from_secs(0x65e1_f0a1);
        assert_eq!(generate_etag(420, Some(modified)), "\"65e1f0a1-1a4\"");
        assert_eq!(generate_etag(0, None), "\"0-0\"");
    }

    #[test]
    fn test_etag_changes_with_size() {
        let modified = Some(UNIX_EPOCH + Duration::from_secs(1000));
        assert_ne!(generate_etag(1, modified), generate_etag(2, modified));
    }

    #[test]
    fn test_etag_matches() {
        let etag = "\"abc-12\"";
        assert!(etag_matches(Some("\"abc-12\""), etag));
        assert!(etag_matches(Some("\"xyz\", \"abc-12\""), etag));
        assert!(etag_matches(Some("W/\"abc-12\""), etag));
        assert!(etag_matches(Some("*"), etag));
        assert!(!etag_matches(Some("\"different\""), etag));
        assert!(!etag_matches(None, etag));
    }

    #[test]
    fn test_http_date() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
