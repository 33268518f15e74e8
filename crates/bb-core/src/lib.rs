//! BullyBros core: a quote catalog, the selection engine over it, and the
//! single-owner user-profile container.
//!
//! Zero I/O. Persistence and notification delivery are the
//! [`KeyValueStore`] and [`Notifier`] traits, implemented by the caller.

pub mod catalog;
pub mod category;
pub mod chat;
pub mod constants;
pub mod container;
pub mod error;
pub mod feed;
pub mod notification;
pub mod profile;
pub mod selection;

pub use catalog::{Catalog, ContentItem, Persona, ResponseBank};
pub use category::{Category, Intensity, PersonaStyle};
pub use chat::{ChatMessage, ChatSession, Sender};
pub use constants::{FALLBACK_RESPONSE, PROFILE_KEY, RESPONSE_DELAY_MS};
pub use container::{KeyValueStore, MemoryStore, ProfileContainer, SubscriptionId};
pub use error::{CoreError, Result};
pub use feed::{QuoteFeed, SwipeDirection};
pub use notification::{
    NoopNotifier, Notifier, RecordingNotifier, Reminder, ScheduledNotification, SubstanceKind,
    Trigger,
};
pub use profile::{Goal, PremiumTier, SettingsPatch, Stats, Theme, UserProfile};
pub use selection::{
    Weights, detect_category, random_quote_for, rank_by_preference, rank_with_weights,
    sample_quotes, select_response, target_category,
};
