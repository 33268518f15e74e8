/// Key the whole profile blob is persisted under.
pub const PROFILE_KEY: &str = "bullybros:userData";

/// Reference ranking weights per category.
pub const WEIGHT_SOCIAL_MEDIA: f64 = 0.3;
pub const WEIGHT_PORN: f64 = 0.5;
pub const WEIGHT_SUBSTANCE: f64 = 0.2;

/// Weight for a category absent from a weight table.
pub const DEFAULT_WEIGHT: f64 = 0.1;

/// Cards shown on the home feed.
pub const FEED_SIZE: usize = 5;

/// Pause between a user chat message and the persona reply.
pub const RESPONSE_DELAY_MS: u64 = 1500;

/// Delay before the post-onboarding scrolling reminder fires.
pub const ONBOARDING_REMINDER_SECS: u64 = 60;

/// Step and floor for goal target adjustments.
pub const GOAL_STEP: f64 = 5.0;
pub const GOAL_MIN_TARGET: f64 = 5.0;

/// Reply used when a response bucket is missing in release builds.
pub const FALLBACK_RESPONSE: &str = "Whatever you're doing, stop it and do something useful.";
