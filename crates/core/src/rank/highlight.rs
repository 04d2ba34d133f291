//! Query word matching, match weights and highlight markup.
//!
//! Matching produces a list of [`Segment`]s. The sentinel form (`\r` before a
//! match, `\n` after it) only exists at the formatting boundary in
//! [`to_markup`].

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::escape::reescape_xml;

pub const MATCH_START: char = '\r';
pub const MATCH_END: char = '\n';

/// Match starting the name, or immediately following another match.
pub const ANCHORED_POINTS: i64 = 10;
/// Match at a word start: after a space or at the start of the name.
pub const WORD_START_POINTS: i64 = 4;
/// Match anywhere else.
pub const SUBSTRING_POINTS: i64 = 1;

/// A run of name text that either matched a query word or did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub is_match: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self { text: text.to_string(), is_match: false }
    }

    fn matched(text: &str) -> Self {
        Self { text: text.to_string(), is_match: true }
    }
}

/// Case-insensitive disjunction of the query's words.
///
/// A query without word characters yields a pattern that matches nothing.
#[derive(Debug, Clone)]
pub struct WordPattern {
    regex: Option<Regex>,
}

impl WordPattern {
    pub fn new(text: &str) -> Self {
        let words: Vec<String> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        if words.is_empty() {
            return Self { regex: None };
        }

        let regex = Regex::new(&format!("(?i)(?:{})", words.join("|")))
            .inspect_err(|e| tracing::warn!("query pattern rejected: {e}"))
            .ok();
        Self { regex }
    }

    pub fn matches_nothing(&self) -> bool {
        self.regex.is_none()
    }

    /// Split `name` into matched and unmatched segments.
    ///
    /// Adjacent matches stay separate segments so each one is weighed.
    pub fn mark(&self, name: &str) -> Vec<Segment> {
        let Some(regex) = &self.regex else {
            return if name.is_empty() { Vec::new() } else { vec![Segment::plain(name)] };
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in regex.find_iter(name) {
            if m.start() > last {
                segments.push(Segment::plain(&name[last..m.start()]));
            }
            segments.push(Segment::matched(m.as_str()));
            last = m.end();
        }
        if last < name.len() {
            segments.push(Segment::plain(&name[last..]));
        }
        segments
    }
}

/// Score the matches in a marked name.
///
/// Each match scores by what precedes it:
/// - start of the name: `ANCHORED_POINTS + WORD_START_POINTS`
/// - another match: `ANCHORED_POINTS`
/// - a literal space: `WORD_START_POINTS`
/// - other whitespace (tab, newline, no-break space): nothing
/// - any other character: `SUBSTRING_POINTS`
pub fn match_weight(segments: &[Segment]) -> i64 {
    let mut weight = 0;
    let mut prev: Option<&Segment> = None;
    for seg in segments {
        if seg.is_match {
            weight += match prev {
                None => ANCHORED_POINTS + WORD_START_POINTS,
                Some(p) if p.is_match => ANCHORED_POINTS,
                Some(p) if p.text.ends_with(' ') => WORD_START_POINTS,
                Some(p) if p.text.ends_with(char::is_whitespace) => 0,
                Some(_) => SUBSTRING_POINTS,
            };
        }
        prev = Some(seg);
    }
    weight
}

/// Serialize segments with sentinel characters around each match.
///
/// Literal sentinel characters in the text are dropped so the output stays
/// unambiguous.
pub fn to_sentinels(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        let text = seg.text.replace([MATCH_START, MATCH_END], "");
        if seg.is_match {
            out.push(MATCH_START);
            out.push_str(&text);
            out.push(MATCH_END);
        } else {
            out.push_str(&text);
        }
    }
    out
}

/// Escaped description markup with `<match>` tags around each match.
pub fn to_markup(segments: &[Segment]) -> String {
    reescape_xml(&to_sentinels(segments))
        .replace(MATCH_START, "<match>")
        .replace(MATCH_END, "</match>")
}
