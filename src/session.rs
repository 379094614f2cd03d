//! Authentication identity, user profile, and session state.

use derive_getters::Getters;
use derive_more::{Display, From};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Opaque handle for an authenticated user, issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Returns the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Extended user record fetched separately from the identity.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity the profile belongs to.
    identity: Identity,
    /// Name shown on the menu and shop screens.
    display_name: String,
    /// Sign-in email.
    email: String,
    /// Persisted coin balance.
    coin_balance: u64,
}

/// User-visible failure shown on the error panel.
///
/// Each variant carries a fixed message; none is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// The auth subscription could not be established.
    #[display("{}", SUBSCRIPTION_SETUP_MESSAGE)]
    SubscriptionSetup,
    /// The signed-in identity has no profile record.
    #[display("{}", PROFILE_NOT_FOUND_MESSAGE)]
    ProfileNotFound,
    /// The profile service failed while looking the profile up.
    #[display("{}", PROFILE_UNAVAILABLE_MESSAGE)]
    ProfileUnavailable,
}

/// Message shown when the auth subscription cannot be set up.
pub const SUBSCRIPTION_SETUP_MESSAGE: &str =
    "Could not connect to the authentication service. Check your configuration.";

/// Message shown when a signed-in identity has no profile.
pub const PROFILE_NOT_FOUND_MESSAGE: &str = "User profile not found. Please sign in again.";

/// Message shown when the profile service fails.
pub const PROFILE_UNAVAILABLE_MESSAGE: &str =
    "Could not load your user profile. Check your connection and try again.";

/// Help text shown under every error panel message.
pub const ERROR_HELP: &str =
    "Make sure the authentication backend credentials are configured correctly.";

impl Fault {
    /// Returns the fixed user-visible message.
    #[instrument]
    pub fn message(self) -> &'static str {
        match self {
            Self::SubscriptionSetup => SUBSCRIPTION_SETUP_MESSAGE,
            Self::ProfileNotFound => PROFILE_NOT_FOUND_MESSAGE,
            Self::ProfileUnavailable => PROFILE_UNAVAILABLE_MESSAGE,
        }
    }
}

/// Authentication and profile state owned by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Session {
    identity: Option<Identity>,
    profile: Option<UserProfile>,
    /// Local mirror of the coin balance.
    coins: u64,
    initializing: bool,
    last_error: Option<Fault>,
}

impl Session {
    /// Creates the startup session: initializing, no identity.
    #[instrument]
    pub fn new(starting_coins: u64) -> Self {
        Self {
            identity: None,
            profile: None,
            coins: starting_coins,
            initializing: true,
            last_error: None,
        }
    }

    /// Records a newly signed-in identity.
    ///
    /// A profile belonging to a different identity is dropped.
    pub(crate) fn sign_in(&mut self, identity: Identity) {
        if self.profile.as_ref().map(UserProfile::identity) != Some(&identity) {
            self.profile = None;
        }
        self.identity = Some(identity);
    }

    /// Clears identity and profile after a sign-out.
    pub(crate) fn sign_out(&mut self) {
        self.identity = None;
        self.profile = None;
    }

    /// Stores a loaded profile and mirrors its coin balance.
    pub(crate) fn load_profile(&mut self, profile: UserProfile) {
        self.coins = *profile.coin_balance();
        self.profile = Some(profile);
        self.last_error = None;
    }

    pub(crate) fn set_coins(&mut self, amount: u64) {
        self.coins = amount;
    }

    /// Leaves the loading state. Never re-entered.
    pub(crate) fn finish_initializing(&mut self) {
        self.initializing = false;
    }

    pub(crate) fn fail(&mut self, fault: Fault) {
        self.last_error = Some(fault);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, coins: u64) -> UserProfile {
        UserProfile::new(id.into(), "Caity".to_string(), "caity@example.com".to_string(), coins)
    }

    #[test]
    fn test_new_session_is_initializing() {
        let session = Session::new(500);
        assert!(*session.initializing());
        assert!(session.identity().is_none());
        assert_eq!(*session.coins(), 500);
    }

    #[test]
    fn test_load_profile_mirrors_coins_and_clears_error() {
        let mut session = Session::new(500);
        session.fail(Fault::ProfileUnavailable);
        session.load_profile(profile("u1", 120));
        assert_eq!(*session.coins(), 120);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_sign_in_as_other_identity_drops_profile() {
        let mut session = Session::new(500);
        session.sign_in("u1".into());
        session.load_profile(profile("u1", 10));
        session.sign_in("u1".into());
        assert!(session.profile().is_some());
        session.sign_in("u2".into());
        assert!(session.profile().is_none());
    }

    #[test]
    fn test_fault_display_matches_message() {
        assert_eq!(Fault::ProfileNotFound.to_string(), PROFILE_NOT_FOUND_MESSAGE);
        assert_eq!(Fault::SubscriptionSetup.message(), SUBSCRIPTION_SETUP_MESSAGE);
    }
}
