//! Ranking and highlighting of prefix-search results.
//!
//! [`cook`] flattens every category's items, weighs each against the query
//! words, sorts them and picks the best match:
//!
//! - 50 points when the item's own category is the requested one
//! - match points per [`highlight::match_weight`]
//! - ties broken by ascending name

pub mod escape;
pub mod format;
pub mod highlight;
pub mod item;

use std::sync::LazyLock;

use regex::Regex;

pub use escape::{escape_xml, reescape_xml, unescape_xml};
pub use format::{BestMatch, SuggestResult, Suggestion};
pub use highlight::{Segment, WordPattern};
pub use item::{Found, FoundCategory, FoundItem, RankedItem};

use crate::cache::ResolvedEntry;
use crate::query::Query;

/// Bonus for an item in the category the user asked for.
pub const CATEGORY_POINTS: i64 = 50;

static STATUS_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Finished.*|Currently\s*").expect("static pattern"));

static IMAGE_RESIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/r/\d+x\d+|\?.*").expect("static pattern"));

/// Drop a trailing `\s+{media_type}` from a name.
fn strip_type_suffix<'a>(name: &'a str, media_type: &str) -> &'a str {
    let Some(head) = name.strip_suffix(media_type) else {
        return name;
    };
    let trimmed = head.trim_end();
    if trimmed.len() < head.len() { trimmed } else { name }
}

/// Status with "Finished ..." removed and "Currently " stripped.
fn clean_status(status: &str) -> String {
    STATUS_NOISE.replace(status, "").into_owned()
}

/// Image URL without the resize path segment or query string.
pub fn canonical_image_url(url: &str) -> String {
    IMAGE_RESIZE.replace_all(url, "").into_owned()
}

/// Weigh one raw item against the query.
pub fn rank_item(item: FoundItem, pattern: &WordPattern, requested_category: &str) -> RankedItem {
    let in_category = item.kind.to_lowercase() == requested_category.to_lowercase();
    let payload = &item.payload;

    let media_type = item::scalar_text(payload.media_type.as_ref());
    let item_type = if media_type.is_empty() { item.kind.clone() } else { media_type };
    let name = strip_type_suffix(&item.name, &item_type).to_string();

    let segments = pattern.mark(&name);
    let weight = if in_category { CATEGORY_POINTS } else { 0 } + highlight::match_weight(&segments);

    let status = clean_status(&item::scalar_text(payload.status.as_ref()));
    let status = [status, item::joined_text(payload.related_works.as_ref()), item::scalar_text(payload.alternative_name.as_ref())]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    let dates = [item::scalar_text(payload.aired.as_ref()), item::scalar_text(payload.published.as_ref())]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    RankedItem {
        year: item::scalar_text(payload.start_year.as_ref()),
        score: item::scalar_text(payload.score.as_ref()),
        url: item.url,
        image_url: item.image_url,
        name,
        item_type,
        status,
        weight,
        dates,
        segments,
    }
}

/// Order items by descending weight, then ascending name.
pub fn sort_ranked(items: &mut [RankedItem]) {
    items.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
}

fn best_of(item: &RankedItem) -> BestMatch {
    BestMatch {
        title: format!("{} ({})", item.name, item.item_type),
        text: item.dates.clone(),
        note: item.status.clone(),
        image: canonical_image_url(&item.image_url),
    }
}

/// Turn a prefix-search response into a cache entry expiring at `expires_at`
/// (epoch milliseconds).
///
/// Malformed items are skipped with a warning; the rest are still ranked.
pub fn cook(found: Found, query: &Query, expires_at: i64) -> ResolvedEntry {
    let pattern = WordPattern::new(&query.text);

    let summary = found
        .categories
        .iter()
        .map(|cat| format!("{} ({})", escape_xml(&cat.kind), cat.items.len()))
        .collect::<Vec<_>>()
        .join(", ");
    let site_link = format!("{} Found in categories: {summary}", format::search_on_site(&query.text));

    let mut items: Vec<RankedItem> = found
        .categories
        .into_iter()
        .flat_map(|cat| cat.items)
        .filter_map(|raw| match serde_json::from_value::<FoundItem>(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("skipping malformed result item: {e}");
                None
            }
        })
        .map(|item| rank_item(item, &pattern, &query.category))
        .collect();

    sort_ranked(&mut items);
    let best = items.first().map(best_of);

    tracing::debug!(query = %query.text, items = items.len(), "ranked suggestions");

    ResolvedEntry { expires_at, site_link, items, best }
}
