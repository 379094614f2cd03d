//! Deterministic replay of scripted sessions.
//!
//! A script lists profiles and a sequence of steps (auth events and screen
//! commands). The replay drives a [`SessionController`] directly, answering
//! its effects from the script: lookups resolve from the profile table,
//! sign-outs loop back as a signed-out auth event, coin saves are recorded.
//! One [`ReplayFrame`] is captured after each step.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    BuildProfile, ControllerEvent, Effect, Identity, NavCommand, ProfileError, ReplayError,
    ScreenId, SessionController, SessionSnapshot, UserProfile,
};

/// A profile known to the scripted backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptProfile {
    /// Identity the profile belongs to.
    pub identity: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Coin balance.
    #[serde(default)]
    pub coins: u64,
    /// Lookups fail with a service error instead of returning the profile.
    #[serde(default)]
    pub unavailable: bool,
    /// Lookups stay pending until a `resolve_lookups` step.
    #[serde(default)]
    pub defer: bool,
}

/// One scripted step. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    /// Auth notifier reports this identity.
    pub auth: Option<String>,
    /// Auth notifier reports nobody signed in.
    pub signed_out: Option<bool>,
    /// Subscribing to the notifier failed.
    pub subscription_failure: Option<bool>,
    /// Complete every deferred lookup, oldest first.
    pub resolve_lookups: Option<bool>,
    /// `navigate(name)`.
    pub navigate: Option<String>,
    /// `selectRoom(id)`.
    pub select_room: Option<String>,
    /// `selectGameRoom(id)`.
    pub select_game_room: Option<String>,
    /// `backToMenu()`.
    pub back_to_menu: Option<bool>,
    /// `backToGameRooms()`.
    pub back_to_game_rooms: Option<bool>,
    /// `updateCoins(amount)`.
    pub update_coins: Option<u64>,
    /// Screen-initiated sign-out.
    pub sign_out: Option<bool>,
    /// Error panel escape hatch.
    pub run_diagnostic: Option<bool>,
}

/// A parsed replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    /// Build flavor for the controller.
    #[serde(default)]
    pub build: BuildProfile,
    /// Coin balance before any profile loads.
    #[serde(default = "default_starting_coins")]
    pub starting_coins: u64,
    /// Profiles the scripted backend knows.
    #[serde(default)]
    pub profiles: Vec<ScriptProfile>,
    /// Steps to run in order.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

fn default_starting_coins() -> u64 {
    500
}

/// A validated step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Auth(Option<Identity>),
    SubscriptionFailure,
    ResolveLookups,
    Command(NavCommand),
}

impl ScriptStep {
    /// Converts the step into the single action it names.
    #[instrument(skip(self))]
    fn action(&self, index: usize) -> Result<Action, ReplayError> {
        let mut actions = Vec::new();
        if let Some(id) = &self.auth {
            actions.push(Action::Auth(Some(Identity::from(id.as_str()))));
        }
        if self.signed_out == Some(true) {
            actions.push(Action::Auth(None));
        }
        if self.subscription_failure == Some(true) {
            actions.push(Action::SubscriptionFailure);
        }
        if self.resolve_lookups == Some(true) {
            actions.push(Action::ResolveLookups);
        }
        if let Some(name) = &self.navigate {
            actions.push(Action::Command(NavCommand::navigate_named(name)));
        }
        if let Some(room) = &self.select_room {
            actions.push(Action::Command(NavCommand::SelectRoom(room.clone())));
        }
        if let Some(room) = &self.select_game_room {
            actions.push(Action::Command(NavCommand::SelectGameRoom(room.clone())));
        }
        if self.back_to_menu == Some(true) {
            actions.push(Action::Command(NavCommand::BackToMenu));
        }
        if self.back_to_game_rooms == Some(true) {
            actions.push(Action::Command(NavCommand::BackToGameRooms));
        }
        if let Some(amount) = self.update_coins {
            actions.push(Action::Command(NavCommand::UpdateCoins(amount)));
        }
        if self.sign_out == Some(true) {
            actions.push(Action::Command(NavCommand::SignOut));
        }
        if self.run_diagnostic == Some(true) {
            actions.push(Action::Command(NavCommand::RunDiagnostic));
        }

        match actions.len() {
            1 => Ok(actions.remove(0)),
            0 => Err(ReplayError::new(format!("Step {} names no action", index))),
            n => Err(ReplayError::new(format!(
                "Step {} names {} actions, expected one",
                index, n
            ))),
        }
    }
}

impl ReplayScript {
    /// Parses a script from TOML text.
    #[instrument(skip(content))]
    pub fn parse(content: &str) -> Result<Self, ReplayError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a script from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ReplayError::new(format!("Failed to read script: {}", e)))?;
        Self::parse(&content)
    }
}

/// State captured after one step.
#[derive(Debug, Clone, Getters, Serialize)]
pub struct ReplayFrame {
    step: usize,
    snapshot: SessionSnapshot,
    /// Sign-out requests issued so far.
    sign_outs: usize,
    /// Coin balances persisted so far.
    coin_saves: Vec<(Identity, u64)>,
}

/// Result of a replay.
#[derive(Debug, Clone, Getters, Serialize)]
pub struct ReplayReport {
    frames: Vec<ReplayFrame>,
}

impl ReplayReport {
    /// Writes one JSON object per frame.
    #[instrument(skip(self))]
    pub fn to_json_lines(&self) -> Result<String, ReplayError> {
        let mut out = String::new();
        for frame in &self.frames {
            out.push_str(&serde_json::to_string(frame)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Snapshot after the last step, if any ran.
    pub fn last(&self) -> Option<&SessionSnapshot> {
        self.frames.last().map(ReplayFrame::snapshot)
    }
}

/// Drives a controller through a script.
#[derive(Debug)]
struct Replayer {
    controller: SessionController,
    profiles: HashMap<Identity, ScriptProfile>,
    queue: VecDeque<ControllerEvent>,
    deferred: Vec<(u64, Identity)>,
    sign_outs: usize,
    coin_saves: Vec<(Identity, u64)>,
}

impl Replayer {
    fn lookup(&self, identity: &Identity) -> Result<Option<UserProfile>, ProfileError> {
        match self.profiles.get(identity) {
            Some(p) if p.unavailable => Err(ProfileError::new("Scripted lookup failure")),
            Some(p) => Ok(Some(UserProfile::new(
                identity.clone(),
                p.display_name.clone(),
                String::new(),
                p.coins,
            ))),
            None => Ok(None),
        }
    }

    fn resolve(&mut self, generation: u64, identity: Identity) {
        let outcome = self.lookup(&identity);
        self.queue.push_back(ControllerEvent::ProfileResolved {
            generation,
            identity,
            outcome,
        });
    }

    /// Runs queued events and their follow-ups to quiescence.
    fn drain(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            for effect in self.controller.handle(event) {
                match effect {
                    Effect::Render => {}
                    Effect::LookupProfile {
                        generation,
                        identity,
                    } => {
                        if self.profiles.get(&identity).is_some_and(|p| p.defer) {
                            debug!(identity = %identity, "Deferring lookup");
                            self.deferred.push((generation, identity));
                        } else {
                            self.resolve(generation, identity);
                        }
                    }
                    Effect::SignOut => {
                        self.sign_outs += 1;
                        self.queue.push_back(ControllerEvent::AuthChanged(None));
                    }
                    Effect::PersistCoins { identity, amount } => {
                        self.coin_saves.push((identity, amount));
                    }
                }
            }
        }
    }

    fn step(&mut self, action: Action) {
        match action {
            Action::Auth(identity) => self.queue.push_back(ControllerEvent::AuthChanged(identity)),
            Action::SubscriptionFailure => {
                self.queue.push_back(ControllerEvent::SubscriptionFailed)
            }
            Action::ResolveLookups => {
                for (generation, identity) in std::mem::take(&mut self.deferred) {
                    self.resolve(generation, identity);
                }
            }
            Action::Command(command) => self.queue.push_back(ControllerEvent::Command(command)),
        }
        self.drain();
    }
}

/// Runs `script` and returns a frame per step.
#[instrument(skip(script), fields(steps = script.steps.len()))]
pub fn run_script(script: &ReplayScript) -> Result<ReplayReport, ReplayError> {
    let actions = script
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| step.action(i))
        .collect::<Result<Vec<_>, _>>()?;

    let mut replayer = Replayer {
        controller: SessionController::new(script.build, script.starting_coins),
        profiles: script
            .profiles
            .iter()
            .map(|p| (Identity::from(p.identity.as_str()), p.clone()))
            .collect(),
        queue: VecDeque::new(),
        deferred: Vec::new(),
        sign_outs: 0,
        coin_saves: Vec::new(),
    };

    let mut frames = Vec::with_capacity(actions.len());
    for (step, action) in actions.into_iter().enumerate() {
        debug!(step, ?action, "Replaying step");
        replayer.step(action);
        frames.push(ReplayFrame {
            step,
            snapshot: replayer.controller.snapshot(),
            sign_outs: replayer.sign_outs,
            coin_saves: replayer.coin_saves.clone(),
        });
    }

    info!(
        frames = frames.len(),
        screen = %replayer.controller.active_screen(),
        "Replay finished"
    );
    Ok(ReplayReport { frames })
}

/// Screen shown after the last step, or login for an empty script.
pub fn final_screen(report: &ReplayReport) -> ScreenId {
    report
        .last()
        .map(|s| *s.active_screen())
        .unwrap_or_default()
}
