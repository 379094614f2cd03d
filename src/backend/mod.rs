//! Collaborator interfaces for authentication and profile storage.
//!
//! The controller never talks to a backend directly. The runtime reaches
//! these traits through [`Collaborators`], so any auth SDK or profile
//! service can sit behind them. [`LocalBackend`] implements all of them in
//! memory.

mod local;

pub use local::LocalBackend;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::{AuthError, Identity, ProfileError, UserProfile};

/// Source of sign-in state changes.
pub trait AuthNotifier: Send + Sync {
    /// Subscribes to sign-in state changes.
    ///
    /// The subscription yields the current state first and then every
    /// change, in order. Dropping it unsubscribes.
    fn subscribe(&self) -> Result<AuthSubscription, AuthError>;
}

/// Ends the current authenticated session.
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    /// Requests a sign-out. The resulting state arrives through the
    /// notifier, not through this call.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Looks up user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profile for `identity`, or `None` if it has none.
    async fn get_profile(&self, identity: &Identity) -> Result<Option<UserProfile>, ProfileError>;
}

/// Persists coin balances.
#[async_trait]
pub trait CoinLedger: Send + Sync {
    /// Stores `amount` as the balance of `identity`.
    async fn save_coins(&self, identity: &Identity, amount: u64) -> Result<(), ProfileError>;
}

/// A live auth subscription.
///
/// Runs its disposer exactly once when dropped.
pub struct AuthSubscription {
    rx: mpsc::UnboundedReceiver<Option<Identity>>,
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl AuthSubscription {
    /// Wraps a receiver and the function that unsubscribes it.
    #[instrument(skip_all)]
    pub fn new(
        rx: mpsc::UnboundedReceiver<Option<Identity>>,
        disposer: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            disposer: Some(Box::new(disposer)),
        }
    }

    /// Waits for the next sign-in state. `None` means the notifier is gone.
    pub async fn next(&mut self) -> Option<Option<Identity>> {
        self.rx.recv().await
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            debug!("Releasing auth subscription");
            dispose();
        }
    }
}

/// The external services the runtime depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Sign-in state source.
    pub notifier: Arc<dyn AuthNotifier>,
    /// Sign-out action.
    pub terminator: Arc<dyn SessionTerminator>,
    /// Profile lookup.
    pub profiles: Arc<dyn ProfileStore>,
    /// Coin persistence.
    pub ledger: Arc<dyn CoinLedger>,
}

impl Collaborators {
    /// Uses one in-memory backend for every role.
    #[instrument(skip(backend))]
    pub fn local(backend: LocalBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            notifier: backend.clone(),
            terminator: backend.clone(),
            profiles: backend.clone(),
            ledger: backend,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
