//! Prefix chain tracking for one typing burst.
//!
//! While the user types `o, on, oni, ..., onizuka` the chain grows one entry
//! per keystroke. Once the longest entry is fetched, every shorter entry is
//! written as an alias of it instead of getting its own request.

/// Successively typed lowercase prefixes, newest last.
///
/// Every entry except the last is a strict prefix of the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixChain {
    entries: Vec<String>,
}

impl PrefixChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record newly typed text, dropping tail entries it no longer extends.
    pub fn observe(&mut self, text: &str) {
        let lower = text.to_lowercase();
        while let Some(last) = self.entries.last() {
            if last.is_empty() || !lower.starts_with(last.as_str()) || *last == lower {
                self.entries.pop();
            } else {
                break;
            }
        }
        self.entries.push(lower);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the chain, returning the entries that should alias `canonical`.
    ///
    /// The canonical text itself is excluded; the chain is empty afterwards.
    pub fn take_collapsed(&mut self, canonical: &str) -> Vec<String> {
        let canonical = canonical.to_lowercase();
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|p| !p.is_empty() && *p != canonical && canonical.starts_with(p.as_str()))
            .collect()
    }
}
