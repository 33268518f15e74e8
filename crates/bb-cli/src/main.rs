mod server;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bb_core::constants::FEED_SIZE;
use bb_core::{
    Catalog, Category, ChatSession, CoreError, FALLBACK_RESPONSE, Intensity, NoopNotifier,
    Notifier, PremiumTier, ProfileContainer, RESPONSE_DELAY_MS, Reminder, SettingsPatch,
    SubstanceKind, Theme, rank_by_preference, sample_quotes,
};
use bb_store::Store;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rmcp::{ServiceExt, transport::stdio};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "bb", about = "BullyBros profile, quotes and persona chat")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    /// Target platform; web has no notification support
    #[arg(long, global = true, value_enum, default_value_t = Platform::Native)]
    platform: Platform,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Platform {
    Native,
    Web,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Print the stored profile as JSON
    Profile,

    /// Log in as a user
    Login {
        username: String,

        /// Keep the session (profile is always persisted)
        #[arg(long)]
        remember: bool,
    },

    /// Log out, keeping only the theme
    Logout,

    /// Finish onboarding with the selected categories
    Onboard {
        /// social_media, porn, substance
        #[arg(required = true)]
        categories: Vec<Category>,
    },

    /// Change premium tier (none, basic, pro, ultimate)
    Premium { tier: PremiumTier },

    /// Update profile settings
    Settings {
        #[arg(long)]
        theme: Option<Theme>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        intensity: Option<Intensity>,

        /// Pause the bullying
        #[arg(long)]
        paused: Option<bool>,

        #[arg(long)]
        username: Option<String>,
    },

    /// Show or update a goal by position
    Goal {
        index: usize,

        #[arg(long)]
        target: Option<f64>,

        #[arg(long)]
        current: Option<f64>,

        /// Raise the target by one step
        #[arg(long, conflicts_with = "lower")]
        raise: bool,

        /// Lower the target by one step
        #[arg(long)]
        lower: bool,
    },

    /// Record activity against a category
    Track { category: Category, amount: u64 },

    /// Show quotes for the profile's categories
    Quotes {
        #[arg(long, default_value_t = FEED_SIZE)]
        count: usize,

        /// Order by category weight instead of sampling
        #[arg(long)]
        ranked: bool,

        /// Only this intensity (ranked mode)
        #[arg(long, requires = "ranked")]
        intensity: Option<Intensity>,
    },

    /// Chat with a persona (interactive when no message is given)
    Chat {
        /// bully_mom, bully_dad, bully_ex, bully_coach
        persona: String,

        message: Vec<String>,

        /// Delay before the persona answers
        #[arg(long, default_value_t = RESPONSE_DELAY_MS)]
        delay_ms: u64,
    },

    /// Send a reminder notification now
    Remind {
        #[command(subcommand)]
        kind: RemindKind,
    },

    /// List pending notifications
    Reminders,

    /// Delete the stored profile
    Reset,

    /// Export the profile to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import the profile from a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum RemindKind {
    /// Too much scrolling
    Scrolling {
        #[arg(long, default_value_t = 10)]
        minutes: u64,
    },
    /// Explicit-content warning
    Explicit {
        #[arg(long)]
        site: Option<String>,
    },
    /// Another cigarette or drink
    Substance {
        #[arg(value_enum, default_value_t = SubstanceArg::Cigarette)]
        kind: SubstanceArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SubstanceArg {
    Cigarette,
    Drink,
}

impl From<SubstanceArg> for SubstanceKind {
    fn from(arg: SubstanceArg) -> Self {
        match arg {
            SubstanceArg::Cigarette => SubstanceKind::Cigarette,
            SubstanceArg::Drink => SubstanceKind::Drink,
        }
    }
}

fn data_dir() -> Option<PathBuf> {
    std::env::var("BB_DATA_DIR").ok().map(PathBuf::from)
}

fn open_store() -> Result<Store> {
    Store::open_profile(data_dir().as_deref()).context("failed to open profile store")
}

fn open_notifier(cli: &Cli) -> Result<Box<dyn Notifier + Send>> {
    Ok(match cli.platform {
        Platform::Web => Box::new(NoopNotifier),
        Platform::Native => Box::new(open_store()?),
    })
}

fn open_container(cli: &Cli) -> Result<ProfileContainer<Store>> {
    Ok(ProfileContainer::load(open_store()?, open_notifier(cli)?))
}

/// Write-through failures are swallowed by the container; the CLI reports them.
fn ensure_saved(container: &ProfileContainer<Store>) -> Result<()> {
    match container.last_persistence_error() {
        Some(e) => anyhow::bail!("failed to save profile: {e}"),
        None => Ok(()),
    }
}

/// Compute and append the persona reply. A missing response bucket is a
/// data error: surfaced in debug builds, replaced by the fallback line in
/// release builds.
pub(crate) fn persona_reply(
    session: &mut ChatSession,
    catalog: &Catalog,
    message: &str,
    member_categories: &[Category],
    rng: &mut impl Rng,
) -> bb_core::Result<String> {
    reply_with_policy(
        session,
        catalog,
        message,
        member_categories,
        rng,
        cfg!(debug_assertions),
    )
}

fn reply_with_policy(
    session: &mut ChatSession,
    catalog: &Catalog,
    message: &str,
    member_categories: &[Category],
    rng: &mut impl Rng,
    surface_missing: bool,
) -> bb_core::Result<String> {
    let outcome = session
        .reply_to(catalog, message, member_categories, rng)
        .map(|m| m.text.clone());
    match outcome {
        Err(e @ CoreError::NotFound { .. }) if !surface_missing => {
            tracing::error!("response lookup failed, using fallback: {e}");
            Ok(session.push_reply(FALLBACK_RESPONSE).text.clone())
        }
        other => other,
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Profile => cmd_profile(&cli),
        Commands::Login { username, remember } => cmd_login(&cli, username, *remember),
        Commands::Logout => cmd_logout(&cli),
        Commands::Onboard { categories } => cmd_onboard(&cli, categories),
        Commands::Premium { tier } => cmd_premium(&cli, *tier),
        Commands::Settings {
            theme,
            notifications,
            intensity,
            paused,
            username,
        } => cmd_settings(
            &cli,
            SettingsPatch {
                theme: *theme,
                notifications: *notifications,
                intensity: *intensity,
                paused_until: *paused,
                username: username.clone(),
                ..Default::default()
            },
        ),
        Commands::Goal {
            index,
            target,
            current,
            raise,
            lower,
        } => cmd_goal(&cli, *index, *target, *current, *raise, *lower),
        Commands::Track { category, amount } => cmd_track(&cli, *category, *amount),
        Commands::Quotes {
            count,
            ranked,
            intensity,
        } => cmd_quotes(&cli, *count, *ranked, *intensity),
        Commands::Chat {
            persona,
            message,
            delay_ms,
        } => cmd_chat(&cli, persona, message, *delay_ms).await,
        Commands::Remind { kind } => cmd_remind(&cli, kind),
        Commands::Reminders => cmd_reminders(),
        Commands::Reset => cmd_reset(&cli),
        Commands::Export { path } => cmd_export(path),
        Commands::Import { path } => cmd_import(path),
    }
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let container = open_container(cli)?;
    tracing::info!("starting MCP server ({:?})", cli.platform);

    let server = server::BbServer::new(container).map_err(|e| anyhow::anyhow!("{e}"))?;
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_profile(cli: &Cli) -> Result<()> {
    let container = open_container(cli)?;
    let json = serde_json::to_string_pretty(container.profile())
        .context("failed to serialize profile")?;
    println!("{json}");
    Ok(())
}

fn cmd_login(cli: &Cli, username: &str, remember: bool) -> Result<()> {
    let mut container = open_container(cli)?;
    container.login(username, remember);
    ensure_saved(&container)?;
    println!("logged in as {username}");
    Ok(())
}

fn cmd_logout(cli: &Cli) -> Result<()> {
    let mut container = open_container(cli)?;
    container.logout();
    ensure_saved(&container)?;
    println!("logged out");
    Ok(())
}

fn cmd_onboard(cli: &Cli, categories: &[Category]) -> Result<()> {
    let mut container = open_container(cli)?;
    container
        .complete_onboarding(categories)
        .context("onboarding failed")?;
    ensure_saved(&container)?;

    let names: Vec<&str> = container
        .profile()
        .categories
        .iter()
        .map(|c| c.as_str())
        .collect();
    println!("onboarded: {}", names.join(", "));
    Ok(())
}

fn cmd_premium(cli: &Cli, tier: PremiumTier) -> Result<()> {
    let mut container = open_container(cli)?;
    container.upgrade_premium(tier);
    ensure_saved(&container)?;
    let profile = container.profile();
    println!(
        "premium: {} (intensity {})",
        profile.premium_tier, profile.intensity
    );
    Ok(())
}

fn cmd_settings(cli: &Cli, patch: SettingsPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("nothing to update; pass at least one setting");
    }
    let mut container = open_container(cli)?;
    container
        .update_settings(patch)
        .context("failed to update settings")?;
    ensure_saved(&container)?;

    let p = container.profile();
    println!("theme:         {}", p.theme);
    println!("notifications: {}", p.notifications);
    println!("intensity:     {}", p.intensity);
    println!("paused:        {}", p.is_paused());
    if let Some(name) = &p.username {
        println!("username:      {name}");
    }
    Ok(())
}

fn cmd_goal(
    cli: &Cli,
    index: usize,
    target: Option<f64>,
    current: Option<f64>,
    raise: bool,
    lower: bool,
) -> Result<()> {
    let mut container = open_container(cli)?;
    let Some(existing) = container.profile().goals.get(index).cloned() else {
        anyhow::bail!(
            "goal index {index} out of range (have {})",
            container.profile().goals.len()
        );
    };

    let mut goal = existing.clone();
    if let Some(t) = target {
        goal.target = t;
    }
    if let Some(c) = current {
        goal.current = c;
    }
    if raise {
        goal = goal.raise_target();
    } else if lower {
        goal = goal.lower_target();
    }

    if goal != existing {
        container
            .update_goal(index, goal.clone())
            .context("failed to update goal")?;
        ensure_saved(&container)?;
    }

    println!(
        "goal {index}: {} {}/{} {} ({:.0}%, {})",
        goal.category,
        goal.current,
        goal.target,
        goal.category.unit(),
        goal.progress() * 100.0,
        if goal.is_on_track() { "on track" } else { "off track" }
    );
    Ok(())
}

fn cmd_track(cli: &Cli, category: Category, amount: u64) -> Result<()> {
    let mut container = open_container(cli)?;
    container.track_activity(category, amount);
    ensure_saved(&container)?;
    println!(
        "{category}: {} {}",
        container.profile().stats.get(category),
        category.unit()
    );
    Ok(())
}

fn cmd_quotes(cli: &Cli, count: usize, ranked: bool, intensity: Option<Intensity>) -> Result<()> {
    let container = open_container(cli)?;
    let catalog = Catalog::reference();
    let categories = &container.profile().categories;

    let quotes = if ranked {
        rank_by_preference(&catalog, categories, count, intensity)
    } else {
        let mut rng = SmallRng::from_os_rng();
        sample_quotes(&catalog, categories, count, &mut rng)
    };

    if quotes.is_empty() {
        println!("(no quotes)");
    }
    for q in quotes {
        println!("[{}/{}] {}", q.category, q.intensity, q.text);
    }
    Ok(())
}

async fn cmd_chat(cli: &Cli, persona_id: &str, message: &[String], delay_ms: u64) -> Result<()> {
    let container = open_container(cli)?;
    let catalog = Catalog::reference();
    let persona = catalog
        .persona(persona_id)
        .context("catalog has no personas")?
        .clone();
    if persona.id != persona_id {
        tracing::warn!("unknown persona '{persona_id}', using {}", persona.id);
    }

    let categories = container.profile().categories.clone();
    let delay = Duration::from_millis(delay_ms);
    let mut rng = SmallRng::from_os_rng();
    let mut session = ChatSession::new(persona);
    let name = session.persona().name.clone();

    println!("{name}: {}", session.messages()[0].text);

    if !message.is_empty() {
        let text = message.join(" ");
        return chat_turn(&mut session, &catalog, &text, &categories, delay, &mut rng).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }
        chat_turn(&mut session, &catalog, &line, &categories, delay, &mut rng).await?;
    }
    Ok(())
}

async fn chat_turn(
    session: &mut ChatSession,
    catalog: &Catalog,
    text: &str,
    categories: &[Category],
    delay: Duration,
    rng: &mut SmallRng,
) -> Result<()> {
    let Some(sent) = session.send(text).map(|m| m.text.clone()) else {
        return Ok(());
    };
    tokio::time::sleep(delay).await;

    let reply = persona_reply(session, catalog, &sent, categories, rng)
        .context("failed to pick a reply")?;
    println!("{}: {reply}", session.persona().name);
    Ok(())
}

fn cmd_remind(cli: &Cli, kind: &RemindKind) -> Result<()> {
    let reminder = match kind {
        RemindKind::Scrolling { minutes } => Reminder::ScrollingWarning { minutes: *minutes },
        RemindKind::Explicit { site } => Reminder::ExplicitContentWarning { site: site.clone() },
        RemindKind::Substance { kind } => Reminder::SubstanceReminder {
            kind: (*kind).into(),
        },
    };

    let mut notifier = open_notifier(cli)?;
    match reminder.send(notifier.as_mut()) {
        Some(id) => println!("sent {id}: {} - {}", reminder.title(), reminder.body()),
        None => println!("notifications unavailable on this platform"),
    }
    Ok(())
}

fn cmd_reminders() -> Result<()> {
    let store = open_store()?;
    let pending = store
        .pending_notifications()
        .context("failed to list notifications")?;

    if pending.is_empty() {
        println!("(no pending notifications)");
    }
    for n in pending {
        let when = match n.trigger_secs {
            Some(secs) => format!("in {secs}s"),
            None => "now".to_string(),
        };
        println!("{} [{when}] {}: {}", n.id, n.title, n.body);
    }
    Ok(())
}

fn cmd_reset(cli: &Cli) -> Result<()> {
    let mut container = open_container(cli)?;
    container.reset();
    ensure_saved(&container)?;
    println!("profile reset");
    Ok(())
}

fn cmd_export(path: &Path) -> Result<()> {
    let store = open_store()?;
    store
        .export_profile_file(path)
        .context("failed to export profile")?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(path: &Path) -> Result<()> {
    let store = open_store()?;
    store
        .import_profile_file(path)
        .context("failed to import profile")?;

    let profile = ProfileContainer::load(store, Box::new(NoopNotifier)).snapshot();
    println!(
        "imported from {}. logged_in={}, onboarded={}, categories={}",
        path.display(),
        profile.is_logged_in,
        profile.is_onboarded,
        profile.categories.len()
    );
    Ok(())
}
