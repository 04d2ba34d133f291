//! XML entity escaping for omnibox description markup.
//!
//! Upstream text may or may not already carry entities, so anything that ends
//! up in markup goes through [`reescape_xml`]: unescape first, then escape once.

const SPECIAL: [char; 5] = ['"', '\'', '<', '>', '&'];

/// Escape `& " ' < >`.
pub fn escape_xml(s: &str) -> String {
    if !s.contains(SPECIAL) {
        return s.to_string();
    }
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inverse of [`escape_xml`]. `&amp;` is decoded last so `&amp;lt;` yields `&lt;`.
pub fn unescape_xml(s: &str) -> String {
    if !s.contains(SPECIAL) {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Normalize possibly-escaped text to exactly one level of escaping.
pub fn reescape_xml(s: &str) -> String {
    escape_xml(&unescape_xml(s))
}
