//! Session controller: the state machine behind screen selection.
//!
//! The controller is pure: it consumes [`ControllerEvent`]s and returns
//! [`Effect`]s for the runtime to execute. It never awaits, so every
//! transition can be driven and checked without a backend.
//!
//! Every auth event bumps a generation counter. Profile lookups carry the
//! generation they were issued under, and a result from an older
//! generation is discarded, so a slow lookup for a previous sign-in cannot
//! overwrite the state of a newer one.

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    BuildProfile, Effect, Fault, Identity, NavCommand, NavigationState, ProfileError, RenderPlan,
    ScreenId, Session, UserProfile,
};

/// Input to the controller.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The auth notifier reported a sign-in state.
    AuthChanged(Option<Identity>),
    /// Subscribing to the auth notifier failed.
    SubscriptionFailed,
    /// A profile lookup finished.
    ProfileResolved {
        /// Generation the lookup was issued under.
        generation: u64,
        /// Identity that was looked up.
        identity: Identity,
        /// `Ok(None)` when the identity has no profile.
        outcome: Result<Option<UserProfile>, ProfileError>,
    },
    /// A screen requested a change.
    Command(NavCommand),
}

/// Coarse state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the first auth event.
    Initializing,
    /// Showing the error panel.
    Error,
    /// On the login or register screen.
    Unauthenticated,
    /// On any other screen.
    Authenticated,
}

/// Read-only copy of the controller state handed to screens and observers.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct SessionSnapshot {
    phase: Phase,
    active_screen: ScreenId,
    identity: Option<Identity>,
    profile: Option<UserProfile>,
    coins: u64,
    initializing: bool,
    last_error: Option<String>,
    selected_room_id: Option<String>,
    selected_game_room_id: Option<String>,
}

/// Owns the session and navigation state.
#[derive(Debug, Clone, Getters)]
pub struct SessionController {
    session: Session,
    navigation: NavigationState,
    build: BuildProfile,
    /// Bumped on every auth event.
    generation: u64,
}

impl SessionController {
    /// Creates a controller in the initializing state.
    #[instrument]
    pub fn new(build: BuildProfile, starting_coins: u64) -> Self {
        info!("Creating SessionController");
        Self {
            session: Session::new(starting_coins),
            navigation: NavigationState::new(),
            build,
            generation: 0,
        }
    }

    /// Processes one event and returns the effects to execute.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Effect> {
        match event {
            ControllerEvent::AuthChanged(identity) => self.on_auth_event(identity),
            ControllerEvent::SubscriptionFailed => self.on_subscription_failed(),
            ControllerEvent::ProfileResolved {
                generation,
                identity,
                outcome,
            } => self.on_profile_resolved(generation, identity, outcome),
            ControllerEvent::Command(command) => self.apply_command(command),
        }
    }

    /// Handles a sign-in state change from the auth notifier.
    #[instrument(skip(self))]
    pub fn on_auth_event(&mut self, identity: Option<Identity>) -> Vec<Effect> {
        self.generation += 1;
        match identity {
            Some(identity) => {
                info!(identity = %identity, "Signed in, looking up profile");
                self.session.sign_in(identity.clone());
                vec![
                    Effect::LookupProfile {
                        generation: self.generation,
                        identity,
                    },
                    Effect::Render,
                ]
            }
            None => {
                info!("Signed out");
                self.session.sign_out();
                self.navigation.reset_to_login();
                self.session.finish_initializing();
                vec![Effect::Render]
            }
        }
    }

    /// Surfaces a failed auth subscription instead of loading forever.
    #[instrument(skip(self))]
    pub fn on_subscription_failed(&mut self) -> Vec<Effect> {
        warn!("Auth subscription failed");
        self.session.fail(Fault::SubscriptionSetup);
        self.session.finish_initializing();
        vec![Effect::Render]
    }

    /// Applies a finished profile lookup if it is still current.
    #[instrument(skip(self, outcome))]
    pub fn on_profile_resolved(
        &mut self,
        generation: u64,
        identity: Identity,
        outcome: Result<Option<UserProfile>, ProfileError>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            debug!(
                stale = generation,
                current = self.generation,
                identity = %identity,
                "Discarding stale profile lookup"
            );
            return Vec::new();
        }

        let effects = match outcome {
            Ok(Some(profile)) => {
                info!(identity = %identity, coins = profile.coin_balance(), "Profile loaded");
                self.session.load_profile(profile);
                self.navigation.navigate(ScreenId::Menu);
                vec![Effect::Render]
            }
            Ok(None) => {
                warn!(identity = %identity, "Profile not found, signing out");
                self.session.fail(Fault::ProfileNotFound);
                vec![Effect::SignOut, Effect::Render]
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "Profile lookup failed");
                self.session.fail(Fault::ProfileUnavailable);
                vec![Effect::Render]
            }
        };
        self.session.finish_initializing();
        effects
    }

    /// Applies a screen command.
    #[instrument(skip(self))]
    pub fn apply_command(&mut self, command: NavCommand) -> Vec<Effect> {
        match command {
            NavCommand::Navigate(screen) => self.navigation.navigate(screen),
            NavCommand::SelectRoom(room_id) => self.navigation.select_room(room_id),
            NavCommand::SelectGameRoom(room_id) => self.navigation.select_game_room(room_id),
            NavCommand::BackToMenu => self.navigation.back_to_menu(),
            NavCommand::BackToGameRooms => self.navigation.back_to_game_rooms(),
            NavCommand::UpdateCoins(amount) => return self.update_coins(amount),
            NavCommand::SignOut => {
                debug!("Screen requested sign-out");
                return vec![Effect::SignOut];
            }
            NavCommand::RunDiagnostic => {
                self.session.clear_error();
                self.navigation.navigate(ScreenId::Diagnostic);
            }
            NavCommand::OpenDiagnostics => self.navigation.navigate(ScreenId::Diagnostic),
        }
        vec![Effect::Render]
    }

    /// Sets the active screen.
    pub fn navigate(&mut self, screen: ScreenId) -> Vec<Effect> {
        self.apply_command(NavCommand::Navigate(screen))
    }

    /// Sets the active screen by name; unknown names go to login.
    pub fn navigate_named(&mut self, name: &str) -> Vec<Effect> {
        self.apply_command(NavCommand::navigate_named(name))
    }

    /// Picks a room and opens the game.
    pub fn select_room(&mut self, room_id: impl Into<String>) -> Vec<Effect> {
        self.apply_command(NavCommand::SelectRoom(room_id.into()))
    }

    /// Picks a game room and opens the multiplayer game.
    pub fn select_game_room(&mut self, room_id: impl Into<String>) -> Vec<Effect> {
        self.apply_command(NavCommand::SelectGameRoom(room_id.into()))
    }

    /// Returns to the menu.
    pub fn back_to_menu(&mut self) -> Vec<Effect> {
        self.apply_command(NavCommand::BackToMenu)
    }

    /// Returns to the game room list.
    pub fn back_to_game_rooms(&mut self) -> Vec<Effect> {
        self.apply_command(NavCommand::BackToGameRooms)
    }

    /// Overwrites the coin mirror and asks for it to be persisted.
    #[instrument(skip(self))]
    pub fn update_coins(&mut self, amount: u64) -> Vec<Effect> {
        self.session.set_coins(amount);
        match self.session.identity() {
            Some(identity) => vec![
                Effect::PersistCoins {
                    identity: identity.clone(),
                    amount,
                },
                Effect::Render,
            ],
            None => {
                debug!("No identity, coin balance kept locally");
                vec![Effect::Render]
            }
        }
    }

    /// Selects what to show.
    pub fn render_plan(&self) -> RenderPlan {
        RenderPlan::select(&self.session, &self.navigation, self.build)
    }

    /// Coarse state of the controller.
    pub fn phase(&self) -> Phase {
        if *self.session.initializing() {
            Phase::Initializing
        } else if self.session.last_error().is_some() {
            Phase::Error
        } else if self.navigation.active_screen().is_public() {
            Phase::Unauthenticated
        } else {
            Phase::Authenticated
        }
    }

    /// Active screen identifier.
    pub fn active_screen(&self) -> ScreenId {
        *self.navigation.active_screen()
    }

    /// Takes a read-only copy of the current state.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            active_screen: self.active_screen(),
            identity: self.session.identity().clone(),
            profile: self.session.profile().clone(),
            coins: *self.session.coins(),
            initializing: *self.session.initializing(),
            last_error: self.session.last_error().map(|f| f.message().to_string()),
            selected_room_id: self.navigation.selected_room_id().clone(),
            selected_game_room_id: self.navigation.selected_game_room_id().clone(),
        }
    }
}
