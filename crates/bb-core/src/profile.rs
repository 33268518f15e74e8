//! The user-profile record and its JSON shape.
//!
//! The wire shape uses camelCase keys. Every field has a default, so a
//! partially-shaped stored record is spread onto the defaults at load time
//! and unknown keys are ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::{Category, Intensity};
use crate::constants::{GOAL_MIN_TARGET, GOAL_STEP};
use crate::error::{CoreError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl FromStr for Theme {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(CoreError::Validation(format!("unknown theme '{other}'"))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumTier {
    #[default]
    None,
    Basic,
    Pro,
    Ultimate,
}

impl FromStr for PremiumTier {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(PremiumTier::None),
            "basic" => Ok(PremiumTier::Basic),
            "pro" => Ok(PremiumTier::Pro),
            "ultimate" => Ok(PremiumTier::Ultimate),
            other => Err(CoreError::Validation(format!("unknown premium tier '{other}'"))),
        }
    }
}

impl fmt::Display for PremiumTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PremiumTier::None => "none",
            PremiumTier::Basic => "basic",
            PremiumTier::Pro => "pro",
            PremiumTier::Ultimate => "ultimate",
        })
    }
}

/// A reduction goal: stay at or under `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "type")]
    pub category: Category,
    pub target: f64,
    pub current: f64,
}

impl Goal {
    pub fn new(category: Category, target: f64, current: f64) -> Self {
        Self {
            category,
            target,
            current,
        }
    }

    pub fn is_on_track(&self) -> bool {
        self.current <= self.target
    }

    /// `current / target`, capped at 1.
    pub fn progress(&self) -> f64 {
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.current / self.target).min(1.0)
    }

    pub fn raise_target(&self) -> Goal {
        Goal {
            target: self.target + GOAL_STEP,
            ..self.clone()
        }
    }

    pub fn lower_target(&self) -> Goal {
        Goal {
            target: (self.target - GOAL_STEP).max(GOAL_MIN_TARGET),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        // non-finite values serialize as null and would not load back
        if !self.target.is_finite() || !self.current.is_finite() {
            return Err(CoreError::Validation(format!(
                "goal values must be finite, got target {} and current {}",
                self.target, self.current
            )));
        }
        if !(self.target > 0.0) {
            return Err(CoreError::Validation(format!(
                "goal target must be positive, got {}",
                self.target
            )));
        }
        if !(self.current >= 0.0) {
            return Err(CoreError::Validation(format!(
                "goal current must not be negative, got {}",
                self.current
            )));
        }
        Ok(())
    }
}

/// Usage counters, one per category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    #[serde(rename = "tiktok_minutes")]
    pub social_media: u64,
    #[serde(rename = "porn_sessions")]
    pub porn: u64,
    #[serde(rename = "cigarettes")]
    pub substance: u64,
}

impl Stats {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::SocialMedia => self.social_media,
            Category::Porn => self.porn,
            Category::Substance => self.substance,
        }
    }

    pub fn record(&mut self, category: Category, amount: u64) {
        let slot = match category {
            Category::SocialMedia => &mut self.social_media,
            Category::Porn => &mut self.porn,
            Category::Substance => &mut self.substance,
        };
        *slot = slot.saturating_add(amount);
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            social_media: 120,
            porn: 3,
            substance: 5,
        }
    }
}

/// The single root record for an installation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub is_logged_in: bool,
    pub is_onboarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(alias = "addictions")]
    pub categories: Vec<Category>,
    pub theme: Theme,
    pub notifications: bool,
    #[serde(alias = "premium")]
    pub premium_tier: PremiumTier,
    pub intensity: Intensity,
    #[serde(alias = "stopBullying", skip_serializing_if = "Option::is_none")]
    pub paused_until: Option<bool>,
    pub stats: Stats,
    pub goals: Vec<Goal>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            is_logged_in: false,
            is_onboarded: false,
            username: None,
            categories: Vec::new(),
            theme: Theme::Light,
            notifications: true,
            premium_tier: PremiumTier::None,
            intensity: Intensity::Extreme,
            paused_until: None,
            stats: Stats::default(),
            goals: vec![Goal::new(Category::SocialMedia, 30.0, 45.0)],
        }
    }
}

impl UserProfile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::Persistence(format!("failed to serialize profile: {e}")))
    }

    pub fn is_paused(&self) -> bool {
        self.paused_until.unwrap_or(false)
    }

    /// Every goal valid; an onboarded profile keeps at least one category.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_onboarded && self.categories.is_empty() {
            return Err(CoreError::Validation(
                "an onboarded profile needs at least one category".into(),
            ));
        }
        for goal in &self.goals {
            goal.validate()?;
        }
        Ok(())
    }
}

/// Shallow patch for [`UserProfile`]: each present field replaces the whole
/// prior value. Nested records (`stats`, `goals`) are not merged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub is_logged_in: Option<bool>,
    pub is_onboarded: Option<bool>,
    pub username: Option<String>,
    #[serde(alias = "addictions")]
    pub categories: Option<Vec<Category>>,
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    #[serde(alias = "premium")]
    pub premium_tier: Option<PremiumTier>,
    pub intensity: Option<Intensity>,
    #[serde(alias = "stopBullying")]
    pub paused_until: Option<bool>,
    pub stats: Option<Stats>,
    pub goals: Option<Vec<Goal>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(v) = self.is_logged_in {
            profile.is_logged_in = v;
        }
        if let Some(v) = self.is_onboarded {
            profile.is_onboarded = v;
        }
        if let Some(v) = self.username {
            profile.username = Some(v);
        }
        if let Some(v) = self.categories {
            profile.categories = v;
        }
        if let Some(v) = self.theme {
            profile.theme = v;
        }
        if let Some(v) = self.notifications {
            profile.notifications = v;
        }
        if let Some(v) = self.premium_tier {
            profile.premium_tier = v;
        }
        if let Some(v) = self.intensity {
            profile.intensity = v;
        }
        if let Some(v) = self.paused_until {
            profile.paused_until = Some(v);
        }
        if let Some(v) = self.stats {
            profile.stats = v;
        }
        if let Some(v) = self.goals {
            profile.goals = v;
        }
    }
}
