//! Integration tests across catalog, selection and the profile container:
//! onboarding → feed → chat → settings → reload.

use bb_core::{
    Catalog, Category, ChatSession, Goal, Intensity, MemoryStore, NoopNotifier, PersonaStyle,
    PremiumTier, ProfileContainer, QuoteFeed, SettingsPatch, SwipeDirection, Theme, Weights,
    rank_by_preference, sample_quotes, select_response,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

fn category_subset() -> impl Strategy<Value = Vec<Category>> {
    prop::sample::subsequence(Category::ALL.to_vec(), 1..=3)
}

#[test]
fn profile_drives_selection() {
    let catalog = Catalog::reference();
    let mut rng = rng();
    let mut container = ProfileContainer::load(MemoryStore::new(), Box::new(NoopNotifier));

    container.login("sam", false);
    container
        .complete_onboarding(&[Category::Porn, Category::SocialMedia])
        .unwrap();
    container.update_settings(SettingsPatch {
        intensity: Some(Intensity::Moderate),
        ..Default::default()
    })
    .unwrap();

    let profile = container.snapshot();
    let ranked = rank_by_preference(&catalog, &profile.categories, 10, Some(profile.intensity));
    assert!(!ranked.is_empty());
    assert!(ranked.iter().all(|q| q.intensity == Intensity::Moderate));
    // the only moderate porn quote comes first
    assert_eq!(ranked[0].category, Category::Porn);

    let feed = QuoteFeed::new(&catalog, &profile.categories, &mut rng);
    assert!(
        feed.cards()
            .iter()
            .all(|q| profile.categories.contains(&q.category))
    );
}

#[test]
fn chat_respects_member_categories() {
    let catalog = Catalog::reference();
    let mut rng = rng();
    let mut container = ProfileContainer::load(MemoryStore::new(), Box::new(NoopNotifier));
    container.complete_onboarding(&[Category::Substance]).unwrap();

    let persona = catalog.persona("bully_dad").unwrap().clone();
    assert_eq!(persona.style, PersonaStyle::Parent);
    let mut session = ChatSession::new(persona);

    let sent = session.send("I was scrolling instagram").unwrap().text.clone();
    let reply = session
        .reply_to(&catalog, &sent, &container.profile().categories, &mut rng)
        .unwrap()
        .text
        .clone();

    let bucket = catalog
        .lookup_responses(PersonaStyle::Parent, Category::Substance)
        .unwrap();
    assert!(bucket.contains(&reply));
}

#[test]
fn full_session_survives_restart() {
    let catalog = Catalog::reference();
    let mut rng = rng();
    let mut container = ProfileContainer::load(MemoryStore::new(), Box::new(NoopNotifier));

    container.login("sam", true);
    container
        .complete_onboarding(&[Category::SocialMedia])
        .unwrap();
    container.upgrade_premium(PremiumTier::Ultimate);
    container.update_settings(SettingsPatch {
        theme: Some(Theme::Dark),
        ..Default::default()
    })
    .unwrap();
    let goal = container.profile().goals[0].raise_target();
    container.update_goal(0, goal).unwrap();
    container.track_activity(Category::SocialMedia, 15);

    let mut feed = QuoteFeed::new(&catalog, &container.profile().categories, &mut rng);
    let id = feed.cards()[0].id;
    assert!(feed.swipe(&catalog, id, SwipeDirection::Left, &mut rng).is_some());

    let before = container.snapshot();
    let container = ProfileContainer::load(container.into_storage(), Box::new(NoopNotifier));
    let after = container.snapshot();

    assert_eq!(before, after);
    assert_eq!(after.goals[0], Goal::new(Category::SocialMedia, 35.0, 45.0));
    assert_eq!(after.stats.social_media, 135);
    assert_eq!(after.premium_tier, PremiumTier::Ultimate);
    assert_eq!(after.theme, Theme::Dark);
}

#[test]
fn logout_then_login_starts_fresh_but_keeps_theme() {
    let mut container = ProfileContainer::load(MemoryStore::new(), Box::new(NoopNotifier));
    container.login("sam", true);
    container
        .complete_onboarding(&[Category::Porn])
        .unwrap();
    container.update_settings(SettingsPatch {
        theme: Some(Theme::System),
        ..Default::default()
    })
    .unwrap();

    container.logout();
    container.login("alex", true);

    let p = container.profile();
    assert_eq!(p.username.as_deref(), Some("alex"));
    assert!(!p.is_onboarded);
    assert!(p.categories.is_empty());
    assert_eq!(p.theme, Theme::System);
}

proptest! {
    #[test]
    fn sample_length_is_min_of_count_and_catalog(
        categories in category_subset(),
        count in 0usize..40,
        seed in any::<u64>(),
    ) {
        let catalog = Catalog::reference();
        let mut rng = SmallRng::seed_from_u64(seed);
        let picked = sample_quotes(&catalog, &categories, count, &mut rng);
        prop_assert_eq!(picked.len(), count.min(catalog.list_quotes().len()));

        let pool = catalog
            .list_quotes()
            .iter()
            .filter(|q| categories.contains(&q.category))
            .count();
        if pool >= count {
            prop_assert!(picked.iter().all(|q| categories.contains(&q.category)));
        }
    }

    #[test]
    fn ranking_is_weight_ordered_and_filtered(
        categories in category_subset(),
        count in 0usize..20,
        intensity in prop::option::of(prop::sample::select(vec![
            Intensity::Mild,
            Intensity::Moderate,
            Intensity::Extreme,
        ])),
    ) {
        let catalog = Catalog::reference();
        let weights = Weights::reference();
        let ranked = rank_by_preference(&catalog, &categories, count, intensity);

        prop_assert!(ranked.len() <= count);
        for q in &ranked {
            prop_assert!(categories.contains(&q.category));
            if let Some(i) = intensity {
                prop_assert_eq!(q.intensity, i);
            }
        }
        for pair in ranked.windows(2) {
            let (a, b) = (weights.weight(pair[0].category), weights.weight(pair[1].category));
            prop_assert!(a >= b);
            if a == b {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn select_response_stays_in_member_bucket(
        message in ".{0,40}",
        categories in category_subset(),
        seed in any::<u64>(),
    ) {
        let catalog = Catalog::reference();
        let mut rng = SmallRng::seed_from_u64(seed);
        let reply = select_response(&catalog, &message, PersonaStyle::Coach, &categories, &mut rng)
            .unwrap();
        let in_member_bucket = categories.iter().any(|c| {
            catalog
                .lookup_responses(PersonaStyle::Coach, *c)
                .unwrap()
                .iter()
                .any(|r| r == reply)
        });
        prop_assert!(in_member_bucket);
    }
}
