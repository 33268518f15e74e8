use std::collections::HashMap;
use std::sync::Arc;

use bb_core::constants::FEED_SIZE;
use bb_core::{
    Catalog, Category, ChatSession, CoreError, Intensity, PremiumTier, ProfileContainer,
    QuoteFeed, Reminder, SettingsPatch, SubstanceKind, SwipeDirection, rank_by_preference,
    sample_quotes,
};
use bb_store::Store;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::persona_reply;

#[derive(Clone)]
pub struct BbServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    container: ProfileContainer<Store>,
    catalog: Catalog,
    rng: SmallRng,
    /// One running chat per persona id (process lifetime).
    sessions: HashMap<String, ChatSession>,
    feed: Option<QuoteFeed>,
}

impl BbServer {
    pub fn new(container: ProfileContainer<Store>) -> std::result::Result<Self, String> {
        let catalog = Catalog::reference();
        catalog
            .validate()
            .map_err(|e| format!("invalid catalog: {e}"))?;
        Ok(Self {
            state: Arc::new(Mutex::new(ServerState {
                container,
                catalog,
                rng: SmallRng::from_os_rng(),
                sessions: HashMap::new(),
                feed: None,
            })),
            tool_router: Self::tool_router(),
        })
    }

    fn profile_json(container: &ProfileContainer<Store>) -> serde_json::Value {
        serde_json::to_value(container.profile()).unwrap_or_default()
    }
}

fn core_err(e: CoreError) -> McpError {
    match e {
        CoreError::Validation(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn parse<T>(field: &str, value: &str) -> Result<T, McpError>
where
    T: std::str::FromStr<Err = CoreError>,
{
    value
        .parse()
        .map_err(|e: CoreError| McpError::invalid_params(format!("{field}: {e}"), None))
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct LoginRequest {
    username: String,
    /// Accepted for compatibility; the profile is always persisted
    remember: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct OnboardRequest {
    /// Categories: "social_media", "porn", "substance"
    categories: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PremiumRequest {
    /// "none", "basic", "pro" or "ultimate"
    tier: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SettingsRequest {
    /// Partial profile in camelCase, e.g. {"theme": "dark", "pausedUntil": true}.
    /// Each present field replaces the stored value.
    patch: serde_json::Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GoalRequest {
    /// Position in the goals list
    index: usize,
    target: Option<f64>,
    current: Option<f64>,
    /// "raise" or "lower" the target by one step
    adjust: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TrackRequest {
    category: String,
    amount: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct QuotesRequest {
    /// Number of quotes (default 5)
    count: Option<usize>,
    /// Order by category weight instead of random sampling
    ranked: Option<bool>,
    /// Only quotes of this intensity (ranked mode)
    intensity: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SwipeRequest {
    /// Card id from bb_feed
    id: u32,
    /// "left" (less of this) or "right" (more of this)
    direction: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ChatRequest {
    /// Persona id: bully_mom, bully_dad, bully_ex, bully_coach
    persona: String,
    message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RemindRequest {
    /// "scrolling", "explicit" or "substance"
    kind: String,
    /// Minutes scrolled (scrolling)
    minutes: Option<u64>,
    /// Site name (explicit)
    site: Option<String>,
    /// "cigarette" or "drink" (substance)
    substance: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ImportRequest {
    /// Full or partial profile JSON. Replaces the stored profile.
    profile: serde_json::Value,
}

#[tool_router]
impl BbServer {
    #[tool(description = "Return the current user profile.")]
    async fn bb_profile(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(description = "Log the user in and register for push notifications.")]
    async fn bb_login(
        &self,
        Parameters(req): Parameters<LoginRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.username.trim().is_empty() {
            return Err(McpError::invalid_params(
                "username must not be empty".to_string(),
                None,
            ));
        }
        let mut state = self.state.lock().await;
        state
            .container
            .login(&req.username, req.remember.unwrap_or(false));
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(description = "Log out. Resets the profile to defaults but keeps the theme.")]
    async fn bb_logout(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.container.logout();
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(
        description = "Complete onboarding with at least one category. Selecting social_media arms a reminder 60 seconds out."
    )]
    async fn bb_onboard(
        &self,
        Parameters(req): Parameters<OnboardRequest>,
    ) -> Result<CallToolResult, McpError> {
        let categories = req
            .categories
            .iter()
            .map(|c| parse::<Category>("categories", c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state.lock().await;
        state
            .container
            .complete_onboarding(&categories)
            .map_err(core_err)?;
        state.feed = None;
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(description = "Change the premium tier. Ultimate forces extreme intensity.")]
    async fn bb_premium(
        &self,
        Parameters(req): Parameters<PremiumRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tier: PremiumTier = parse("tier", &req.tier)?;
        let mut state = self.state.lock().await;
        state.container.upgrade_premium(tier);
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(description = "Shallow-merge a partial profile into the stored profile.")]
    async fn bb_settings(
        &self,
        Parameters(req): Parameters<SettingsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let patch: SettingsPatch = serde_json::from_value(req.patch)
            .map_err(|e| McpError::invalid_params(format!("invalid patch: {e}"), None))?;
        let mut state = self.state.lock().await;
        state
            .container
            .update_settings(patch)
            .map_err(core_err)?;
        Ok(json_result(&Self::profile_json(&state.container)))
    }

    #[tool(description = "Replace or adjust the goal at a position.")]
    async fn bb_goal(
        &self,
        Parameters(req): Parameters<GoalRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let Some(mut goal) = state.container.profile().goals.get(req.index).cloned() else {
            return Err(McpError::invalid_params(
                format!("goal index {} out of range", req.index),
                None,
            ));
        };

        if let Some(t) = req.target {
            goal.target = t;
        }
        if let Some(c) = req.current {
            goal.current = c;
        }
        goal = match req.adjust.as_deref() {
            None => goal,
            Some("raise") => goal.raise_target(),
            Some("lower") => goal.lower_target(),
            Some(other) => {
                return Err(McpError::invalid_params(
                    format!("adjust must be 'raise' or 'lower', got '{other}'"),
                    None,
                ));
            }
        };

        state
            .container
            .update_goal(req.index, goal.clone())
            .map_err(core_err)?;

        let result = serde_json::json!({
            "goal": goal,
            "progress": goal.progress(),
            "on_track": goal.is_on_track(),
        });
        Ok(json_result(&result))
    }

    #[tool(description = "Add to the activity counter for a category.")]
    async fn bb_track(
        &self,
        Parameters(req): Parameters<TrackRequest>,
    ) -> Result<CallToolResult, McpError> {
        let category: Category = parse("category", &req.category)?;
        let mut state = self.state.lock().await;
        state.container.track_activity(category, req.amount);

        let result = serde_json::json!({
            "category": category,
            "total": state.container.profile().stats.get(category),
            "unit": category.unit(),
        });
        Ok(json_result(&result))
    }

    #[tool(
        description = "Quotes for the user's categories. Random by default; ranked orders by category weight and may filter by intensity."
    )]
    async fn bb_quotes(
        &self,
        Parameters(req): Parameters<QuotesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let intensity = req
            .intensity
            .as_deref()
            .map(|i| parse::<Intensity>("intensity", i))
            .transpose()?;
        let count = req.count.unwrap_or(FEED_SIZE);

        let mut state = self.state.lock().await;
        let ServerState {
            container,
            catalog,
            rng,
            ..
        } = &mut *state;
        let categories = &container.profile().categories;

        let quotes = if req.ranked.unwrap_or(false) {
            rank_by_preference(catalog, categories, count, intensity)
        } else {
            sample_quotes(catalog, categories, count, rng)
        };

        let result = serde_json::json!({ "quotes": quotes });
        Ok(json_result(&result))
    }

    #[tool(description = "Current home-feed cards. Built on first use from the user's categories.")]
    async fn bb_feed(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let ServerState {
            container,
            catalog,
            rng,
            feed,
            ..
        } = &mut *state;
        let feed = feed
            .get_or_insert_with(|| QuoteFeed::new(catalog, &container.profile().categories, rng));

        let result = serde_json::json!({ "cards": feed.cards() });
        Ok(json_result(&result))
    }

    #[tool(description = "Swipe a feed card away and get a fresh one in its place.")]
    async fn bb_swipe(
        &self,
        Parameters(req): Parameters<SwipeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let direction = match req.direction.to_lowercase().as_str() {
            "left" => SwipeDirection::Left,
            "right" => SwipeDirection::Right,
            other => {
                return Err(McpError::invalid_params(
                    format!("direction must be 'left' or 'right', got '{other}'"),
                    None,
                ));
            }
        };

        let mut state = self.state.lock().await;
        let ServerState {
            container,
            catalog,
            rng,
            feed,
            ..
        } = &mut *state;
        let feed = feed
            .get_or_insert_with(|| QuoteFeed::new(catalog, &container.profile().categories, rng));

        let Some(feedback) = feed.swipe(catalog, req.id, direction, rng) else {
            return Err(McpError::invalid_params(
                format!("no card with id {} in the feed", req.id),
                None,
            ));
        };

        let result = serde_json::json!({
            "feedback": feedback,
            "cards": feed.cards(),
        });
        Ok(json_result(&result))
    }

    #[tool(
        description = "Send a message to a persona and get its reply. Each persona keeps its own running conversation."
    )]
    async fn bb_chat(
        &self,
        Parameters(req): Parameters<ChatRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let ServerState {
            container,
            catalog,
            rng,
            sessions,
            ..
        } = &mut *state;

        let Some(persona) = catalog.persona(&req.persona).cloned() else {
            return Err(McpError::internal_error(
                "catalog has no personas".to_string(),
                None,
            ));
        };
        let session = sessions
            .entry(persona.id.clone())
            .or_insert_with(|| ChatSession::new(persona));

        let Some(sent) = session.send(&req.message).map(|m| m.text.clone()) else {
            return Err(McpError::invalid_params(
                "message must not be empty".to_string(),
                None,
            ));
        };
        let reply = persona_reply(session, catalog, &sent, &container.profile().categories, rng)
            .map_err(core_err)?;

        let result = serde_json::json!({
            "persona": session.persona().id,
            "reply": reply,
            "messages": session.messages().len(),
        });
        Ok(json_result(&result))
    }

    #[tool(description = "List the available chat personas.")]
    async fn bb_personas(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let result = serde_json::json!({ "personas": state.catalog.personas() });
        Ok(json_result(&result))
    }

    #[tool(description = "Send an immediate reminder notification.")]
    async fn bb_remind(
        &self,
        Parameters(req): Parameters<RemindRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reminder = match req.kind.to_lowercase().as_str() {
            "scrolling" => Reminder::ScrollingWarning {
                minutes: req.minutes.unwrap_or(10),
            },
            "explicit" => Reminder::ExplicitContentWarning { site: req.site },
            "substance" => Reminder::SubstanceReminder {
                kind: match req.substance.as_deref().unwrap_or("cigarette") {
                    "cigarette" => SubstanceKind::Cigarette,
                    "drink" => SubstanceKind::Drink,
                    other => {
                        return Err(McpError::invalid_params(
                            format!("substance must be 'cigarette' or 'drink', got '{other}'"),
                            None,
                        ));
                    }
                },
            },
            other => {
                return Err(McpError::invalid_params(
                    format!("unknown reminder kind '{other}'"),
                    None,
                ));
            }
        };

        let mut state = self.state.lock().await;
        let id = reminder.send(state.container.notifier_mut());

        let result = serde_json::json!({
            "id": id,
            "title": reminder.title(),
            "body": reminder.body(),
        });
        Ok(json_result(&result))
    }

    #[tool(description = "Export the stored profile as JSON.")]
    async fn bb_export(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let json = state
            .container
            .storage()
            .export_profile_string()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Import a profile from JSON. Replaces the stored profile.")]
    async fn bb_import(
        &self,
        Parameters(req): Parameters<ImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let json_str = serde_json::to_string(&req.profile)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        state
            .container
            .storage()
            .import_profile_str(&json_str)
            .map_err(|e| McpError::invalid_params(format!("invalid profile JSON: {e}"), None))?;
        state.container.reload();
        state.feed = None;

        let result = serde_json::json!({
            "imported": true,
            "profile": Self::profile_json(&state.container),
        });
        Ok(json_result(&result))
    }

    #[tool(description = "Delete the stored profile and start over from defaults.")]
    async fn bb_reset(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.container.reset();
        state.sessions.clear();
        state.feed = None;
        Ok(json_result(&Self::profile_json(&state.container)))
    }
}

#[tool_handler]
impl ServerHandler for BbServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "BullyBros: tough-love motivation against social media, porn and substance habits.\n\n\
                 FLOW:\n\
                 1. bb_login, then bb_onboard with the user's categories.\n\
                 2. bb_feed / bb_swipe for the home feed, bb_quotes for ad-hoc lists.\n\
                 3. bb_chat with a persona (bb_personas lists them). Replies target the category \
                    the message mentions if the user selected it.\n\
                 4. bb_track, bb_goal and bb_settings keep the profile current.\n\n\
                 Every change is persisted immediately. bb_profile returns the current record."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
