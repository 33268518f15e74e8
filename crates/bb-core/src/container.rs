//! Profile State Container: single owner of the [`UserProfile`].
//!
//! Every mutation goes through a named operation which (1) replaces the
//! in-memory record, (2) writes the full record through to the key-value
//! store, (3) notifies every subscriber synchronously. Write-through failures
//! are logged and swallowed; memory stays authoritative until the next load.

use std::collections::HashMap;

use crate::category::{Category, Intensity};
use crate::constants::{ONBOARDING_REMINDER_SECS, PROFILE_KEY};
use crate::error::{CoreError, Result};
use crate::notification::{Notifier, Trigger, onboarding_reminder};
use crate::profile::{Goal, PremiumTier, SettingsPatch, UserProfile};

/// Persistence collaborator: one text value per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// HashMap-backed store. Writes can be made to fail for testing.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(CoreError::Persistence("memory store is read-only".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&UserProfile) + Send>;

pub struct ProfileContainer<S: KeyValueStore> {
    profile: UserProfile,
    storage: S,
    notifier: Box<dyn Notifier + Send>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    last_persistence_error: Option<CoreError>,
}

impl<S: KeyValueStore> ProfileContainer<S> {
    /// Materialize the profile from storage, or defaults if absent or unreadable.
    pub fn load(storage: S, notifier: Box<dyn Notifier + Send>) -> Self {
        let profile = read_profile(&storage);
        let mut container = Self {
            profile,
            storage,
            notifier,
            listeners: Vec::new(),
            next_subscription: 0,
            last_persistence_error: None,
        };
        if container.profile.is_logged_in {
            container.register_push();
        }
        container
    }

    /// Re-read the persisted record, replacing the in-memory one.
    pub fn reload(&mut self) {
        self.profile = read_profile(&self.storage);
        self.notify();
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn snapshot(&self) -> UserProfile {
        self.profile.clone()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn notifier_mut(&mut self) -> &mut (dyn Notifier + Send + 'static) {
        self.notifier.as_mut()
    }

    /// Error from the most recent write-through, cleared on the next success.
    pub fn last_persistence_error(&self) -> Option<&CoreError> {
        self.last_persistence_error.as_ref()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&UserProfile) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // --- Named operations ---

    /// `remember` is accepted and ignored: the record is always persisted.
    pub fn login(&mut self, username: &str, remember: bool) {
        tracing::debug!(remember, "login for '{username}'");
        let mut next = self.profile.clone();
        next.is_logged_in = true;
        next.username = Some(username.to_string());
        self.commit(next, "login");
        self.register_push();
    }

    /// Reset to defaults, keeping only the theme.
    pub fn logout(&mut self) {
        let next = UserProfile {
            theme: self.profile.theme,
            ..UserProfile::default()
        };
        self.commit(next, "logout");
    }

    pub fn complete_onboarding(&mut self, categories: &[Category]) -> Result<()> {
        if categories.is_empty() {
            return Err(CoreError::Validation(
                "onboarding needs at least one category".into(),
            ));
        }

        let mut selected: Vec<Category> = Vec::with_capacity(categories.len());
        for c in categories {
            if !selected.contains(c) {
                selected.push(*c);
            }
        }

        let mut next = self.profile.clone();
        next.is_onboarded = true;
        next.categories = selected;
        self.commit(next, "complete_onboarding");

        if self.profile.categories.contains(&Category::SocialMedia) {
            let (title, body) = onboarding_reminder();
            let id = self.notifier.schedule(
                title,
                body,
                Trigger::after_secs(ONBOARDING_REMINDER_SECS),
            );
            tracing::info!("onboarding reminder scheduled: {id:?}");
        }
        Ok(())
    }

    /// Ultimate also forces extreme intensity.
    pub fn upgrade_premium(&mut self, tier: PremiumTier) {
        let mut next = self.profile.clone();
        next.premium_tier = tier;
        if tier == PremiumTier::Ultimate {
            next.intensity = Intensity::Extreme;
        }
        self.commit(next, "upgrade_premium");
    }

    /// Shallow merge. A patch that would break a profile invariant is
    /// rejected whole and state is left untouched.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<()> {
        let mut next = self.profile.clone();
        patch.apply(&mut next);
        next.validate()?;
        self.commit(next, "update_settings");
        Ok(())
    }

    /// Goals are addressed by position only.
    pub fn update_goal(&mut self, index: usize, goal: Goal) -> Result<()> {
        let len = self.profile.goals.len();
        if index >= len {
            return Err(CoreError::Validation(format!(
                "goal index {index} out of range (have {len})"
            )));
        }
        goal.validate()?;

        let mut next = self.profile.clone();
        next.goals[index] = goal;
        self.commit(next, "update_goal");
        Ok(())
    }

    pub fn track_activity(&mut self, category: Category, amount: u64) {
        let mut next = self.profile.clone();
        next.stats.record(category, amount);
        self.commit(next, "track_activity");
    }

    /// Drop the stored record entirely and fall back to defaults.
    pub fn reset(&mut self) {
        match self.storage.remove(PROFILE_KEY) {
            Ok(()) => self.last_persistence_error = None,
            Err(e) => {
                tracing::error!("failed to remove stored profile: {e}");
                self.last_persistence_error = Some(e);
            }
        }
        self.profile = UserProfile::default();
        self.notify();
    }

    fn commit(&mut self, next: UserProfile, op: &str) {
        self.profile = next;

        let written = self
            .profile
            .to_json()
            .and_then(|json| self.storage.set(PROFILE_KEY, &json));
        match written {
            Ok(()) => self.last_persistence_error = None,
            Err(e) => {
                tracing::error!("failed to persist after {op}: {e}");
                self.last_persistence_error = Some(e);
            }
        }

        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.profile);
        }
    }

    fn register_push(&mut self) {
        match self.notifier.register_for_push() {
            Some(token) => tracing::info!("push token: {token}"),
            None => tracing::debug!("push registration unavailable"),
        }
    }
}

fn read_profile(storage: &impl KeyValueStore) -> UserProfile {
    match storage.get(PROFILE_KEY) {
        Ok(Some(json)) => UserProfile::from_json(&json).unwrap_or_else(|e| {
            tracing::warn!("stored profile unreadable, using defaults: {e}");
            UserProfile::default()
        }),
        Ok(None) => {
            tracing::debug!("no stored profile, using defaults");
            UserProfile::default()
        }
        Err(e) => {
            tracing::warn!("failed to load profile, using defaults: {e}");
            UserProfile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NoopNotifier, RecordingNotifier};
    use crate::profile::Theme;
    use std::sync::{Arc, Mutex};

    fn container() -> ProfileContainer<MemoryStore> {
        ProfileContainer::load(MemoryStore::new(), Box::new(NoopNotifier))
    }

    fn reopen(c: ProfileContainer<MemoryStore>) -> ProfileContainer<MemoryStore> {
        ProfileContainer::load(c.into_storage(), Box::new(NoopNotifier))
    }

    /// Recording notifier the test keeps a handle to.
    struct Shared(Arc<Mutex<RecordingNotifier>>);

    impl Notifier for Shared {
        fn schedule(&mut self, title: &str, body: &str, trigger: Trigger) -> Option<String> {
            self.0.lock().unwrap().schedule(title, body, trigger)
        }
        fn cancel(&mut self, id: &str) {
            self.0.lock().unwrap().cancel(id)
        }
        fn register_for_push(&mut self) -> Option<String> {
            self.0.lock().unwrap().register_for_push()
        }
    }

    fn recording_container() -> (ProfileContainer<MemoryStore>, Arc<Mutex<RecordingNotifier>>) {
        let shared = Arc::new(Mutex::new(RecordingNotifier::default()));
        let c = ProfileContainer::load(MemoryStore::new(), Box::new(Shared(shared.clone())));
        (c, shared)
    }

    #[test]
    fn test_load_empty_storage_gives_defaults_without_writing() {
        let c = container();
        assert_eq!(*c.profile(), UserProfile::default());
        assert!(c.storage().get(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_load_unreadable_record_gives_defaults() {
        let mut storage = MemoryStore::new();
        storage.set(PROFILE_KEY, "{not json").unwrap();
        let c = ProfileContainer::load(storage, Box::new(NoopNotifier));
        assert_eq!(*c.profile(), UserProfile::default());
    }

    #[test]
    fn test_settings_survive_reload() {
        let mut c = container();
        c.update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        })
        .unwrap();
        let c = reopen(c);
        assert_eq!(c.profile().theme, Theme::Dark);
    }

    #[test]
    fn test_logout_keeps_only_theme() {
        let mut c = container();
        c.login("sam", true);
        c.complete_onboarding(&[Category::Porn]).unwrap();
        c.update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            notifications: Some(false),
            ..Default::default()
        })
        .unwrap();
        c.logout();

        let c = reopen(c);
        let expected = UserProfile {
            theme: Theme::Dark,
            ..UserProfile::default()
        };
        assert_eq!(*c.profile(), expected);
    }

    #[test]
    fn test_login_sets_username_and_flag() {
        let mut c = container();
        c.login("sam", false);
        assert!(c.profile().is_logged_in);
        assert_eq!(c.profile().username.as_deref(), Some("sam"));

        // remember=false still persists
        let c = reopen(c);
        assert!(c.profile().is_logged_in);
    }

    #[test]
    fn test_login_registers_for_push() {
        let (mut c, rec) = recording_container();
        assert_eq!(rec.lock().unwrap().push_registrations, 0);
        c.login("sam", true);
        assert_eq!(rec.lock().unwrap().push_registrations, 1);

        // a logged-in record registers again on the next launch
        let shared = Arc::new(Mutex::new(RecordingNotifier::default()));
        let _c = ProfileContainer::load(c.into_storage(), Box::new(Shared(shared.clone())));
        assert_eq!(shared.lock().unwrap().push_registrations, 1);
    }

    #[test]
    fn test_onboarding_rejects_empty_categories() {
        let mut c = container();
        let err = c.complete_onboarding(&[]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(!c.profile().is_onboarded);
        assert!(c.storage().get(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_onboarding_dedups_and_keeps_order() {
        let mut c = container();
        c.complete_onboarding(&[Category::Substance, Category::Porn, Category::Substance])
            .unwrap();
        assert!(c.profile().is_onboarded);
        assert_eq!(c.profile().categories, vec![Category::Substance, Category::Porn]);
    }

    #[test]
    fn test_onboarding_arms_reminder_for_social_media_only() {
        let (mut c, shared) = recording_container();
        c.complete_onboarding(&[Category::Porn]).unwrap();
        assert!(shared.lock().unwrap().scheduled.is_empty());

        c.complete_onboarding(&[Category::Porn, Category::SocialMedia]).unwrap();
        let rec = shared.lock().unwrap();
        assert_eq!(rec.scheduled.len(), 1);
        assert_eq!(
            rec.scheduled[0].trigger,
            Trigger::after_secs(ONBOARDING_REMINDER_SECS)
        );
    }

    #[test]
    fn test_ultimate_forces_extreme_intensity() {
        let mut c = container();
        c.update_settings(SettingsPatch {
            intensity: Some(Intensity::Mild),
            ..Default::default()
        })
        .unwrap();
        c.upgrade_premium(PremiumTier::Pro);
        assert_eq!(c.profile().intensity, Intensity::Mild);

        c.upgrade_premium(PremiumTier::Ultimate);
        assert_eq!(c.profile().premium_tier, PremiumTier::Ultimate);
        assert_eq!(c.profile().intensity, Intensity::Extreme);
    }

    #[test]
    fn test_update_goal_in_range() {
        let mut c = container();
        let goal = Goal::new(Category::SocialMedia, 60.0, 45.0);
        c.update_goal(0, goal.clone()).unwrap();
        assert_eq!(c.profile().goals[0], goal);
        assert!(c.profile().goals[0].is_on_track());
    }

    #[test]
    fn test_update_goal_out_of_range_leaves_goals_unchanged() {
        let mut c = container();
        let before = c.profile().goals.clone();
        let err = c
            .update_goal(3, Goal::new(Category::Porn, 1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(c.profile().goals, before);
    }

    #[test]
    fn test_update_goal_rejects_invalid_goal() {
        let mut c = container();
        let err = c
            .update_goal(0, Goal::new(Category::Porn, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_update_goal_rejects_non_finite_and_profile_survives_reload() {
        let mut c = container();
        c.login("sam", true);
        c.complete_onboarding(&[Category::SocialMedia]).unwrap();

        let err = c
            .update_goal(0, Goal::new(Category::SocialMedia, f64::INFINITY, 0.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = c
            .update_goal(0, Goal::new(Category::SocialMedia, 35.0, f64::NAN))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let huge = Goal::new(Category::SocialMedia, f64::MAX, 0.0);
        c.update_goal(0, huge.raise_target()).unwrap();

        let c = reopen(c);
        assert!(c.profile().is_logged_in);
        assert_eq!(c.profile().username.as_deref(), Some("sam"));
        assert_eq!(c.profile().categories, vec![Category::SocialMedia]);
        assert_eq!(c.profile().goals[0].target, f64::MAX);
    }

    #[test]
    fn test_settings_patch_cannot_strip_onboarded_categories() {
        let mut c = container();
        c.complete_onboarding(&[Category::Porn]).unwrap();
        let stored = c.storage().get(PROFILE_KEY).unwrap();
        let before = c.snapshot();

        let err = c
            .update_settings(SettingsPatch {
                categories: Some(Vec::new()),
                theme: Some(Theme::Dark),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(c.snapshot(), before);
        assert_eq!(c.storage().get(PROFILE_KEY).unwrap(), stored);
    }

    #[test]
    fn test_settings_patch_rejects_invalid_goals() {
        let (mut c, notifier) = recording_container();
        let err = c
            .update_settings(SettingsPatch {
                goals: Some(vec![Goal::new(Category::Porn, -3.0, -7.0)]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(c.profile().goals, UserProfile::default().goals);
        assert!(c.storage().get(PROFILE_KEY).unwrap().is_none());
        assert!(notifier.lock().unwrap().scheduled.is_empty());

        let c = reopen(c);
        assert_eq!(*c.profile(), UserProfile::default());
    }

    #[test]
    fn test_track_activity() {
        let mut c = container();
        c.track_activity(Category::Substance, 3);
        assert_eq!(c.profile().stats.substance, 8);
    }

    #[test]
    fn test_write_failure_is_swallowed_and_memory_wins() {
        let mut storage = MemoryStore::new();
        storage.set_fail_writes(true);
        let mut c = ProfileContainer::load(storage, Box::new(NoopNotifier));

        c.login("sam", true);
        assert!(c.profile().is_logged_in);
        assert!(matches!(
            c.last_persistence_error(),
            Some(CoreError::Persistence(_))
        ));
        assert!(c.storage().get(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_subscribers_see_every_mutation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut c = container();
        let sink = seen.clone();
        let id = c.subscribe(move |p| sink.lock().unwrap().push(p.is_logged_in));

        c.login("sam", true);
        c.logout();
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);

        assert!(c.unsubscribe(id));
        assert!(!c.unsubscribe(id));
        c.login("sam", true);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_reset_removes_record_and_theme() {
        let mut c = container();
        c.update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        })
        .unwrap();
        c.reset();
        assert_eq!(*c.profile(), UserProfile::default());
        assert!(c.storage().get(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_reload_discards_unpersisted_changes() {
        let mut c = container();
        c.login("sam", true);

        c.storage_mut().set_fail_writes(true);
        c.update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.profile().theme, Theme::Dark);

        c.reload();
        assert_eq!(c.profile().theme, Theme::Light);
        assert!(c.profile().is_logged_in);
    }
}
