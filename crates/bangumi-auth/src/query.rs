//! Redirect URL query parsing
//!
//! The authorization flow asks the user to paste back the full URL they
//! landed on after consenting. This module pulls the query string out of
//! that URL and decodes it into a name → value map. Duplicate parameter
//! names keep the last occurrence.

use std::collections::HashMap;

/// Parse the query string of a pasted-back redirect URL.
///
/// Accepts a full URL (`https://host/cb?code=x&state=y`), a bare query
/// string (`code=x&state=y`), or anything in between; a trailing
/// `#fragment` is dropped. Returns an empty map when there is no query.
pub fn parse_redirect_url(url: &str) -> HashMap<String, String> {
    let after_path = match url.split_once('?') {
        Some((_, query)) => query,
        // No '?': a bare query string pastes fine too, but a URL without
        // a query has nothing to parse.
        None if url.contains('=') && !url.contains('/') => url,
        None => return HashMap::new(),
    };
    let query = after_path
        .split_once('#')
        .map(|(q, _)| q)
        .unwrap_or(after_path);

    // HashMap deserialization inserts pairs in order, so a duplicated
    // name resolves to its last occurrence.
    serde_urlencoded::from_str(query).unwrap_or_default()
}
