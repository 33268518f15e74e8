use rand::Rng;

use crate::catalog::{Catalog, ContentItem};
use crate::category::Category;
use crate::constants::FEED_SIZE;
use crate::selection::sample_quotes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Less of this.
    Left,
    /// More of this.
    Right,
}

impl SwipeDirection {
    pub fn feedback(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "Less of this, huh?",
            SwipeDirection::Right => "More? You asked for it.",
        }
    }
}

/// Home-feed cards. A swiped card is replaced by one fresh sample, which
/// may repeat a card already on screen.
#[derive(Clone, Debug)]
pub struct QuoteFeed {
    categories: Vec<Category>,
    cards: Vec<ContentItem>,
}

impl QuoteFeed {
    pub fn new(catalog: &Catalog, categories: &[Category], rng: &mut impl Rng) -> Self {
        let cards = sample_quotes(catalog, categories, FEED_SIZE, rng)
            .into_iter()
            .cloned()
            .collect();
        Self {
            categories: categories.to_vec(),
            cards,
        }
    }

    pub fn cards(&self) -> &[ContentItem] {
        &self.cards
    }

    /// Remove the card with `id` and top the feed up. `None` if no such card.
    pub fn swipe(
        &mut self,
        catalog: &Catalog,
        id: u32,
        direction: SwipeDirection,
        rng: &mut impl Rng,
    ) -> Option<&'static str> {
        let pos = self.cards.iter().position(|c| c.id == id)?;
        self.cards.remove(pos);

        if let Some(fresh) = sample_quotes(catalog, &self.categories, 1, rng).first() {
            self.cards.push((*fresh).clone());
        }
        Some(direction.feedback())
    }
}
