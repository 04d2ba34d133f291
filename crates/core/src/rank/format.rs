//! Omnibox description markup and the result object handed to displays.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::escape::{escape_xml, reescape_xml};
use super::highlight::to_markup;
use super::item::RankedItem;

/// One omnibox row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    /// URL opened when the row is picked.
    pub content: String,
    /// Description markup (`<match>`, `<dim>`, `<url>`).
    pub description: String,
}

/// The top result, promoted to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BestMatch {
    pub title: String,
    pub text: String,
    pub note: String,
    /// Canonical image URL without resize segment or query string.
    pub image: String,
}

/// What a display surface receives for one keystroke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestResult {
    pub site_link: String,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<BestMatch>,
}

/// Wrap non-blank text in `<dim>`; blank text renders as nothing.
pub fn dim(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() { String::new() } else { format!("<dim>{s}</dim>") }
}

/// Default row shown while typing.
pub fn search_on_site(text: &str) -> String {
    format!("<dim>Search for <match>{}</match> on site.</dim>", escape_xml(text))
}

/// Default row for empty input.
pub fn open_site(site_url: &str) -> String {
    format!("Open <url>{}</url>", escape_xml(site_url))
}

/// Description markup for one ranked item:
/// `dim(year score) + &#x20; + <url>name</url> + dim(type (status))`.
pub fn describe(item: &RankedItem) -> String {
    let status = if item.status.is_empty() { String::new() } else { format!(" ({})", item.status) };
    format!(
        "{}&#x20;<url>{}</url> {}",
        dim(&reescape_xml(&format!("{} {}", item.year, item.score))),
        to_markup(&item.segments),
        dim(&reescape_xml(&format!("{}{status}", item.item_type))),
    )
}

pub fn suggestion(item: &RankedItem) -> Suggestion {
    Suggestion { content: item.url.clone(), description: describe(item) }
}
