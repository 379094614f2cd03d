//! Property-based tests for the session controller.
//!
//! Arbitrary interleavings of auth events, lookup completions (including
//! stale ones), and screen commands must keep the controller's invariants.

use caity_client::{
    BuildProfile, ControllerEvent, Effect, Identity, NavCommand, ProfileError, RenderPlan,
    ScreenId, SessionController, UserProfile,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    SignIn(u8),
    SignOut,
    /// Complete the pending lookup at this index (modulo pending count).
    Complete(usize, Outcome),
    Navigate(String),
    SelectRoom(u8),
    BackToMenu,
    UpdateCoins(u64),
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Found(u64),
    Missing,
    Failed,
}

const SCREEN_NAMES: &[&str] = &[
    "login",
    "register",
    "menu",
    "rooms",
    "game",
    "profile",
    "shop",
    "diagnostic",
    "tasks",
    "invites",
    "gameRooms",
    "multiplayerGame",
    "bogus",
    "",
];

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        3 => (0u64..10_000).prop_map(Outcome::Found),
        1 => Just(Outcome::Missing),
        1 => Just(Outcome::Failed),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => (0u8..4).prop_map(Step::SignIn),
        2 => Just(Step::SignOut),
        3 => (0usize..8, outcome_strategy()).prop_map(|(i, o)| Step::Complete(i, o)),
        2 => prop::sample::select(SCREEN_NAMES).prop_map(|s| Step::Navigate(s.to_string())),
        1 => (0u8..5).prop_map(Step::SelectRoom),
        1 => Just(Step::BackToMenu),
        1 => (0u64..1_000).prop_map(Step::UpdateCoins),
    ]
}

fn outcome_for(identity: &Identity, outcome: Outcome) -> Result<Option<UserProfile>, ProfileError> {
    match outcome {
        Outcome::Found(coins) => Ok(Some(UserProfile::new(
            identity.clone(),
            "p".to_string(),
            "p@example.com".to_string(),
            coins,
        ))),
        Outcome::Missing => Ok(None),
        Outcome::Failed => Err(ProfileError::new("failed")),
    }
}

proptest! {
    #[test]
    fn prop_controller_invariants_hold(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut c = SessionController::new(BuildProfile::Development, 500);
        let mut pending: Vec<(u64, Identity)> = Vec::new();
        let mut was_initialized = false;

        for step in steps {
            let event = match step {
                Step::SignIn(n) => ControllerEvent::AuthChanged(Some(Identity::from(format!("u{n}")))),
                Step::SignOut => ControllerEvent::AuthChanged(None),
                Step::Complete(i, outcome) => {
                    if pending.is_empty() {
                        continue;
                    }
                    let (generation, identity) = pending.remove(i % pending.len());
                    let outcome = outcome_for(&identity, outcome);
                    ControllerEvent::ProfileResolved { generation, identity, outcome }
                }
                Step::Navigate(name) => ControllerEvent::Command(NavCommand::navigate_named(&name)),
                Step::SelectRoom(n) => ControllerEvent::Command(NavCommand::SelectRoom(format!("r{n}"))),
                Step::BackToMenu => ControllerEvent::Command(NavCommand::BackToMenu),
                Step::UpdateCoins(n) => ControllerEvent::Command(NavCommand::UpdateCoins(n)),
            };

            let is_sign_out = matches!(event, ControllerEvent::AuthChanged(None));
            let current_completion = match &event {
                ControllerEvent::ProfileResolved { generation, outcome, .. } => {
                    Some((*generation == *c.generation(), outcome.clone()))
                }
                _ => None,
            };
            let before = c.snapshot();

            let effects = c.handle(event);
            for effect in &effects {
                if let Effect::LookupProfile { generation, identity } = effect {
                    pending.push((*generation, identity.clone()));
                }
            }
            let snap = c.snapshot();

            // initializing never returns once cleared.
            if was_initialized {
                prop_assert!(!snap.initializing());
            }
            was_initialized = !snap.initializing();

            // A sign-out always lands on login with no profile.
            if is_sign_out {
                prop_assert_eq!(*snap.active_screen(), ScreenId::Login);
                prop_assert!(snap.profile().is_none());
                prop_assert!(snap.identity().is_none());
            }

            match current_completion {
                // Current successful lookups open the menu and clear errors.
                Some((true, Ok(Some(_)))) => {
                    prop_assert_eq!(*snap.active_screen(), ScreenId::Menu);
                    prop_assert!(snap.last_error().is_none());
                }
                // Missing profiles request exactly one sign-out.
                Some((true, Ok(None))) => {
                    let sign_outs = effects.iter().filter(|e| **e == Effect::SignOut).count();
                    prop_assert_eq!(sign_outs, 1);
                    prop_assert_eq!(snap.active_screen(), before.active_screen());
                }
                // Stale lookups change nothing.
                Some((false, _)) => {
                    prop_assert!(effects.is_empty());
                    prop_assert_eq!(&snap, &before);
                }
                _ => {}
            }

            // Exactly one thing is rendered, and the overlay never covers diagnostics.
            if let RenderPlan::Screen { diagnostics_overlay, .. } = c.render_plan() {
                prop_assert_eq!(diagnostics_overlay, *snap.active_screen() != ScreenId::Diagnostic);
            }
        }
    }

    #[test]
    fn prop_navigate_known_screen_is_exact(name in prop::sample::select(SCREEN_NAMES)) {
        let mut c = SessionController::new(BuildProfile::Production, 0);
        c.on_auth_event(None);
        c.navigate_named(name);
        let expected = name.parse::<ScreenId>().unwrap_or(ScreenId::Login);
        prop_assert_eq!(c.active_screen(), expected);
        let overlay = matches!(
            c.render_plan(),
            RenderPlan::Screen { diagnostics_overlay: true, .. }
        );
        prop_assert!(!overlay);
    }
}
