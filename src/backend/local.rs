//! In-memory auth and profile backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::backend::{AuthNotifier, AuthSubscription, CoinLedger, ProfileStore, SessionTerminator};
use crate::{AuthError, ClientConfig, Identity, ProfileError, UserProfile};

#[derive(Debug, Default)]
struct LocalState {
    /// Email to identity.
    accounts: HashMap<String, Identity>,
    profiles: HashMap<Identity, UserProfile>,
    current: Option<Identity>,
    listeners: HashMap<u64, mpsc::UnboundedSender<Option<Identity>>>,
    next_listener: u64,
    next_uid: u64,
    fail_subscriptions: bool,
    fail_lookups: bool,
    lookup_delays: HashMap<Identity, Duration>,
    sign_out_requests: usize,
    coin_saves: Vec<(Identity, u64)>,
}

impl LocalState {
    /// Pushes the current sign-in state to every live listener.
    fn broadcast(&mut self) {
        let current = self.current.clone();
        self.listeners
            .retain(|_, tx| tx.send(current.clone()).is_ok());
        debug!(listeners = self.listeners.len(), "Broadcast auth state");
    }
}

/// Auth notifier, sign-out action, profile store, and coin ledger backed by
/// in-process maps.
///
/// Clones share state, so a test can keep one clone to drive sign-ins while
/// the runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    state: Arc<Mutex<LocalState>>,
}

impl LocalBackend {
    /// Creates an empty backend with nobody signed in.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating LocalBackend");
        Self::default()
    }

    /// Creates a backend seeded per `config`.
    #[instrument(skip(config))]
    pub fn from_config(config: &ClientConfig) -> Self {
        let backend = Self::new();
        if config.should_seed_test_user() {
            let identity = backend.register(
                config.test_user_email(),
                "Test User",
                *config.test_user_coins(),
            );
            info!(identity = %identity, email = %config.test_user_email(), "Seeded test user");
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates an account with a profile. Re-registering an email returns
    /// its existing identity.
    #[instrument(skip(self))]
    pub fn register(&self, email: &str, display_name: &str, coins: u64) -> Identity {
        let identity = self.register_without_profile(email);
        let profile = UserProfile::new(
            identity.clone(),
            display_name.to_string(),
            email.to_string(),
            coins,
        );
        self.lock().profiles.insert(identity.clone(), profile);
        identity
    }

    /// Creates an account that has no profile record.
    #[instrument(skip(self))]
    pub fn register_without_profile(&self, email: &str) -> Identity {
        let mut state = self.lock();
        if let Some(identity) = state.accounts.get(email) {
            return identity.clone();
        }
        state.next_uid += 1;
        let identity = Identity::from(format!("uid-{}", state.next_uid));
        state.accounts.insert(email.to_string(), identity.clone());
        debug!(identity = %identity, "Account created");
        identity
    }

    /// Signs in the account registered under `email`.
    #[instrument(skip(self))]
    pub fn sign_in(&self, email: &str) -> Result<Identity, AuthError> {
        let mut state = self.lock();
        let identity = state
            .accounts
            .get(email)
            .cloned()
            .ok_or_else(|| AuthError::new(format!("No account for {}", email)))?;
        info!(identity = %identity, "Signing in");
        state.current = Some(identity.clone());
        state.broadcast();
        Ok(identity)
    }

    /// Signs out immediately, notifying every subscriber.
    #[instrument(skip(self))]
    pub fn sign_out_now(&self) {
        let mut state = self.lock();
        info!(was = ?state.current, "Signing out");
        state.current = None;
        state.broadcast();
    }

    /// Makes every later subscription attempt fail.
    #[instrument(skip(self))]
    pub fn set_subscription_failure(&self, fail: bool) {
        self.lock().fail_subscriptions = fail;
    }

    /// Makes every later profile lookup fail.
    #[instrument(skip(self))]
    pub fn set_lookup_failure(&self, fail: bool) {
        self.lock().fail_lookups = fail;
    }

    /// Delays profile lookups for `identity`.
    #[instrument(skip(self))]
    pub fn set_lookup_delay(&self, identity: &Identity, delay: Duration) {
        self.lock().lookup_delays.insert(identity.clone(), delay);
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Number of sign-out requests received through [`SessionTerminator`].
    pub fn sign_out_requests(&self) -> usize {
        self.lock().sign_out_requests
    }

    /// Every balance saved through [`CoinLedger`], oldest first.
    pub fn coin_saves(&self) -> Vec<(Identity, u64)> {
        self.lock().coin_saves.clone()
    }

    /// Stored profile for `identity`.
    pub fn profile(&self, identity: &Identity) -> Option<UserProfile> {
        self.lock().profiles.get(identity).cloned()
    }

    /// Identity currently signed in.
    pub fn current(&self) -> Option<Identity> {
        self.lock().current.clone()
    }
}

/// Removes the listener `id` if the backend still exists.
fn unsubscribe(state: Weak<Mutex<LocalState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
        state.listeners.remove(&id);
        debug!(listener = id, remaining = state.listeners.len(), "Unsubscribed");
    }
}

impl AuthNotifier for LocalBackend {
    #[instrument(skip(self))]
    fn subscribe(&self) -> Result<AuthSubscription, AuthError> {
        let mut state = self.lock();
        if state.fail_subscriptions {
            warn!("Subscription refused");
            return Err(AuthError::new("Auth backend is not configured"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(state.current.clone())
            .map_err(|_| AuthError::new("Subscriber closed before first event"))?;

        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id, tx);
        debug!(listener = id, "Subscribed");

        let weak = Arc::downgrade(&self.state);
        Ok(AuthSubscription::new(rx, move || unsubscribe(weak, id)))
    }
}

#[async_trait]
impl SessionTerminator for LocalBackend {
    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock().sign_out_requests += 1;
        self.sign_out_now();
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for LocalBackend {
    #[instrument(skip(self))]
    async fn get_profile(&self, identity: &Identity) -> Result<Option<UserProfile>, ProfileError> {
        let delay = self.lock().lookup_delays.get(identity).copied();
        if let Some(delay) = delay {
            debug!(?delay, "Delaying profile lookup");
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if state.fail_lookups {
            warn!("Profile lookup refused");
            return Err(ProfileError::new("Profile service unavailable"));
        }
        let profile = state.profiles.get(identity).cloned();
        debug!(found = profile.is_some(), "Profile lookup finished");
        Ok(profile)
    }
}

#[async_trait]
impl CoinLedger for LocalBackend {
    #[instrument(skip(self))]
    async fn save_coins(&self, identity: &Identity, amount: u64) -> Result<(), ProfileError> {
        let mut state = self.lock();
        let profile = state
            .profiles
            .get(identity)
            .cloned()
            .ok_or_else(|| ProfileError::new(format!("No profile for {}", identity)))?;
        let updated = UserProfile::new(
            profile.identity().clone(),
            profile.display_name().clone(),
            profile.email().clone(),
            amount,
        );
        state.profiles.insert(identity.clone(), updated);
        state.coin_saves.push((identity.clone(), amount));
        info!(identity = %identity, amount, "Coins saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_yields_current_state_first() {
        let backend = LocalBackend::new();
        backend.register("a@example.com", "A", 10);
        let identity = backend.sign_in("a@example.com").expect("sign in");

        let mut sub = backend.subscribe().expect("subscribe");
        assert_eq!(sub.next().await, Some(Some(identity)));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let backend = LocalBackend::new();
        let sub = backend.subscribe().expect("subscribe");
        assert_eq!(backend.listener_count(), 1);
        drop(sub);
        assert_eq!(backend.listener_count(), 0);
    }

    #[test]
    fn test_subscription_failure() {
        let backend = LocalBackend::new();
        backend.set_subscription_failure(true);
        assert!(backend.subscribe().is_err());
    }

    #[test]
    fn test_sign_in_unknown_email_fails() {
        let backend = LocalBackend::new();
        assert!(backend.sign_in("nobody@example.com").is_err());
    }

    #[tokio::test]
    async fn test_save_coins_updates_profile() {
        let backend = LocalBackend::new();
        let identity = backend.register("a@example.com", "A", 10);
        backend.save_coins(&identity, 42).await.expect("save");
        let profile = backend.profile(&identity).expect("profile");
        assert_eq!(*profile.coin_balance(), 42);
        assert_eq!(backend.coin_saves(), vec![(identity, 42)]);
    }

    #[tokio::test]
    async fn test_profile_missing_for_bare_account() {
        let backend = LocalBackend::new();
        let identity = backend.register_without_profile("b@example.com");
        let profile = backend.get_profile(&identity).await.expect("lookup");
        assert!(profile.is_none());
    }
}
