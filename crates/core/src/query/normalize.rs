//! Raw omnibox text to a normalized [`Query`].
//!
//! Input grammar: `<text>[/<category letter>][!]`. The trailing `!` forces a
//! fresh request even when the cache holds a live entry.

use regex::Regex;

use crate::Error;
use crate::config::SiteProfile;

/// A parsed keystroke state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Input as typed, trimmed.
    pub raw_text: String,
    /// Text with edge punctuation stripped and whitespace runs collapsed.
    pub text: String,
    /// Percent-encoded `text` for request URLs.
    pub text_for_url: String,
    /// Full category name; the site's default category when none was typed.
    pub category: String,
    /// The typed `/x` suffix, lowercased, or empty.
    pub category_key: String,
    /// Trailing `!` was typed.
    pub force: bool,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Key suffix shared by the canonical entry and every alias pointing at it.
    pub fn cache_suffix(&self) -> String {
        format!("{}{}", self.text.to_lowercase(), self.category_key)
    }

    /// Full cache key: `prefix + lowercase(text) + category suffix`.
    pub fn cache_key(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.cache_suffix())
    }

    /// Prefix-search API URL for this query.
    pub fn api_url(&self, site: &SiteProfile) -> String {
        format!("{}{}", site.api_url.replace("%t", &self.category), self.text_for_url)
    }

    /// Destination opened when the user commits the input.
    ///
    /// Text that already looks like a URL is opened as is, empty input opens
    /// the site root, anything else opens the full search page.
    pub fn destination_url(&self, site: &SiteProfile) -> String {
        if self.raw_text.starts_with("http:") || self.raw_text.starts_with("https:") {
            return self.raw_text.clone();
        }
        if self.text.trim().is_empty() {
            return site.site_url.clone();
        }
        let base = if self.category == site.default_category {
            site.search_all_url.clone()
        } else {
            site.search_url.replace("%c", &self.category)
        };
        format!("{base}{}", self.text_for_url)
    }
}

/// Stateless parser bound to one site's category table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    splitter: Regex,
    site: SiteProfile,
}

impl Normalizer {
    pub fn new(site: &SiteProfile) -> Result<Self, Error> {
        let letters = site.category_letters();
        let pattern = if letters.is_empty() {
            r"(?is)^(.*?)()!?$".to_string()
        } else {
            format!(r"(?is)^(.*?)(/[{}])?!?$", regex::escape(&letters))
        };
        let splitter = Regex::new(&pattern).map_err(|e| Error::InvalidInput(format!("category table: {e}")))?;
        Ok(Self { splitter, site: site.clone() })
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    /// Parse raw input into a [`Query`].
    pub fn parse(&self, raw: &str) -> Query {
        let raw_text = raw.trim().to_string();
        let force = raw_text.ends_with('!');

        let (body, category_key) = match self.splitter.captures(&raw_text) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or(String::new(), |m| m.as_str().to_lowercase()),
            ),
            None => (raw_text.as_str(), String::new()),
        };

        let category = category_key
            .strip_prefix('/')
            .and_then(|letter| self.site.category_for(letter))
            .unwrap_or(&self.site.default_category)
            .to_string();

        let text = sanitize_input(body);
        let text_for_url = urlencoding::encode(&text).into_owned();

        Query { text, text_for_url, category, category_key, force, raw_text }
    }
}

fn is_edge_noise(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_whitespace()
}

/// Trim punctuation and whitespace at both ends, collapse whitespace runs of two
/// or more characters into one space.
pub fn sanitize_input(s: &str) -> String {
    let trimmed = s.trim_start_matches(is_edge_noise).trim_end_matches(is_edge_noise);

    let mut out = String::with_capacity(trimmed.len());
    let mut run = String::new();
    for c in trimmed.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        match run.chars().count() {
            0 => {}
            1 => out.push_str(&run),
            _ => out.push(' '),
        }
        run.clear();
        out.push(c);
    }
    out
}
