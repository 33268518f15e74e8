//! Selection Engine: random sampling, weighted ranking and keyword-driven
//! persona replies over a [`Catalog`].
//!
//! Every function here is pure apart from the caller-supplied RNG.

use std::collections::HashMap;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use regex::Regex;

use crate::catalog::{Catalog, ContentItem};
use crate::category::{Category, Intensity, PersonaStyle};
use crate::constants::{DEFAULT_WEIGHT, WEIGHT_PORN, WEIGHT_SOCIAL_MEDIA, WEIGHT_SUBSTANCE};
use crate::error::{CoreError, Result};

const SOCIAL_MEDIA_KEYWORDS: &[&str] = &["tiktok", "instagram", "social", "scrolling"];
const PORN_KEYWORDS: &[&str] = &["porn", "masturbat", "watch", "video"];
const SUBSTANCE_KEYWORDS: &[&str] = &["smoke", "drink", "cigarette", "alcohol"];

/// Keyword matchers in priority order. Substring match, case-insensitive.
static KEYWORD_MATCHERS: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    [
        (Category::SocialMedia, SOCIAL_MEDIA_KEYWORDS),
        (Category::Porn, PORN_KEYWORDS),
        (Category::Substance, SUBSTANCE_KEYWORDS),
    ]
    .into_iter()
    .map(|(category, words)| {
        let alternation: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        let pattern = format!("(?i){}", alternation.join("|"));
        (category, Regex::new(&pattern).unwrap())
    })
    .collect()
});

/// Per-category ranking weights.
#[derive(Clone, Debug, PartialEq)]
pub struct Weights {
    by_category: HashMap<Category, f64>,
}

impl Weights {
    pub fn new(by_category: HashMap<Category, f64>) -> Self {
        Self { by_category }
    }

    /// social_media=0.3, porn=0.5, substance=0.2.
    pub fn reference() -> Self {
        Self::new(HashMap::from([
            (Category::SocialMedia, WEIGHT_SOCIAL_MEDIA),
            (Category::Porn, WEIGHT_PORN),
            (Category::Substance, WEIGHT_SUBSTANCE),
        ]))
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.by_category.get(&category).copied().unwrap_or(DEFAULT_WEIGHT)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::reference()
    }
}

/// Uniformly shuffled sample of quotes in `categories`.
///
/// When fewer than `count` quotes match, the pool widens to the whole
/// catalog, so returned items may fall outside `categories`.
pub fn sample_quotes<'a>(
    catalog: &'a Catalog,
    categories: &[Category],
    count: usize,
    rng: &mut impl Rng,
) -> Vec<&'a ContentItem> {
    if categories.is_empty() {
        return Vec::new();
    }

    let quotes = catalog.list_quotes();
    let mut pool: Vec<&ContentItem> = quotes
        .iter()
        .filter(|q| categories.contains(&q.category))
        .collect();

    if pool.len() < count {
        pool = quotes.iter().collect();
    }

    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Quotes in `categories` (and exactly `intensity`, if given), heaviest
/// category first. Ties keep catalog order.
pub fn rank_by_preference<'a>(
    catalog: &'a Catalog,
    categories: &[Category],
    count: usize,
    intensity: Option<Intensity>,
) -> Vec<&'a ContentItem> {
    rank_with_weights(catalog, categories, count, intensity, &Weights::reference())
}

pub fn rank_with_weights<'a>(
    catalog: &'a Catalog,
    categories: &[Category],
    count: usize,
    intensity: Option<Intensity>,
    weights: &Weights,
) -> Vec<&'a ContentItem> {
    if categories.is_empty() {
        return Vec::new();
    }

    let mut weighted: Vec<(&ContentItem, f64)> = catalog
        .list_quotes()
        .iter()
        .filter(|q| intensity.is_none_or(|i| q.intensity == i))
        .filter(|q| categories.contains(&q.category))
        .map(|q| (q, weights.weight(q.category)))
        .collect();

    // sort_by is stable
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));

    weighted.into_iter().take(count).map(|(q, _)| q).collect()
}

/// First category whose keywords appear in `message`, in priority order.
pub fn detect_category(message: &str) -> Option<Category> {
    KEYWORD_MATCHERS
        .iter()
        .find(|(_, re)| re.is_match(message))
        .map(|(category, _)| *category)
}

/// Category a reply should be themed on: the detected keyword category if
/// the user opted into it, otherwise their first category.
pub fn target_category(message: &str, member_categories: &[Category]) -> Result<Category> {
    let first = member_categories
        .first()
        .copied()
        .ok_or_else(|| CoreError::Validation("member categories must not be empty".into()))?;

    Ok(detect_category(message)
        .filter(|c| member_categories.contains(c))
        .unwrap_or(first))
}

/// Pick a scripted reply for `message` in the given persona style.
pub fn select_response<'a>(
    catalog: &'a Catalog,
    message: &str,
    style: PersonaStyle,
    member_categories: &[Category],
    rng: &mut impl Rng,
) -> Result<&'a str> {
    let category = target_category(message, member_categories)?;
    let responses = catalog.lookup_responses(style, category)?;
    responses
        .choose(rng)
        .map(String::as_str)
        .ok_or(CoreError::NotFound { style, category })
}

/// One random quote for a category; the first catalog item if none match.
pub fn random_quote_for<'a>(
    catalog: &'a Catalog,
    category: Category,
    rng: &mut impl Rng,
) -> Option<&'a ContentItem> {
    let matching: Vec<&ContentItem> = catalog
        .list_quotes()
        .iter()
        .filter(|q| q.category == category)
        .collect();

    matching
        .choose(rng)
        .copied()
        .or_else(|| catalog.list_quotes().first())
}
