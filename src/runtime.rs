//! Session runtime: drives the controller from live collaborators.
//!
//! The runtime owns the [`SessionController`] and is the only writer of its
//! state. One loop multiplexes auth changes, screen commands, and finished
//! profile lookups, so events are applied strictly one at a time. The auth
//! subscription and any outstanding lookups live inside [`SessionRuntime::run`]
//! and are released however it ends.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::{AuthSubscription, Collaborators};
use crate::{
    ClientConfig, ControllerEvent, Effect, Identity, NavCommand, ProfileError, RenderPlan,
    ScreenHandle, SessionController, SessionSnapshot,
};

/// How long [`SessionRuntime::run`] waits for sign-out and coin saves still
/// in flight when it stops.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Event loop around a [`SessionController`].
#[derive(Debug)]
pub struct SessionRuntime {
    controller: SessionController,
    collaborators: Collaborators,
    commands: mpsc::UnboundedReceiver<NavCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    plans: watch::Sender<RenderPlan>,
    lookups: JoinSet<ControllerEvent>,
    background: JoinSet<()>,
}

/// Read side of a runtime: handles and state feeds for the front end.
#[derive(Debug, Clone)]
pub struct RuntimeHandles {
    /// Queues screen commands.
    pub screens: ScreenHandle,
    /// Latest state snapshot.
    pub snapshots: watch::Receiver<SessionSnapshot>,
    /// Latest render plan.
    pub plans: watch::Receiver<RenderPlan>,
}

impl SessionRuntime {
    /// Creates a runtime and the handles used to drive and observe it.
    #[instrument(skip(config, collaborators))]
    pub fn new(config: &ClientConfig, collaborators: Collaborators) -> (Self, RuntimeHandles) {
        info!(build = %config.build(), "Creating SessionRuntime");
        let controller = SessionController::new(*config.build(), *config.starting_coins());
        let (screens, commands) = ScreenHandle::channel();
        let (snapshots, snapshot_rx) = watch::channel(controller.snapshot());
        let (plans, plan_rx) = watch::channel(controller.render_plan());
        let runtime = Self {
            controller,
            collaborators,
            commands,
            snapshots,
            plans,
            lookups: JoinSet::new(),
            background: JoinSet::new(),
        };
        let handles = RuntimeHandles {
            screens,
            snapshots: snapshot_rx,
            plans: plan_rx,
        };
        (runtime, handles)
    }

    /// Runs until every [`ScreenHandle`] has been dropped or the auth
    /// stream ends.
    ///
    /// Pending sign-outs and coin saves are given [`SHUTDOWN_GRACE`] to
    /// finish before returning. Returns the final snapshot.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> SessionSnapshot {
        info!("Starting session runtime");

        let mut subscription = match self.collaborators.notifier.subscribe() {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                error!(error = %e, "Failed to subscribe to auth changes");
                self.dispatch(ControllerEvent::SubscriptionFailed);
                None
            }
        };

        loop {
            tokio::select! {
                change = next_auth_change(&mut subscription) => match change {
                    Some(identity) => self.dispatch(ControllerEvent::AuthChanged(identity)),
                    None => {
                        warn!("Auth notifier closed, stopping");
                        break;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(ControllerEvent::Command(command)),
                    None => {
                        info!("All screen handles dropped, stopping");
                        break;
                    }
                },
                Some(joined) = self.lookups.join_next() => match joined {
                    Ok(event) => self.dispatch(event),
                    Err(e) => error!(error = %e, "Profile lookup task failed"),
                },
                Some(joined) = self.background.join_next() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Background task failed");
                    }
                }
            }
        }

        drop(subscription);
        self.lookups.abort_all();
        self.finish_background().await;
        self.controller.snapshot()
    }

    /// Waits for background effects started before shutdown.
    async fn finish_background(&mut self) {
        if self.background.is_empty() {
            return;
        }
        debug!(pending = self.background.len(), "Waiting for background effects");
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(joined) = self.background.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "Background task failed");
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                abandoned = self.background.len(),
                "Background effects did not finish in time"
            );
            self.background.abort_all();
        }
    }

    /// Applies one event and executes the resulting effects.
    #[instrument(skip(self))]
    fn dispatch(&mut self, event: ControllerEvent) {
        let effects = self.controller.handle(event);
        for effect in effects {
            self.execute(effect);
        }
    }

    #[instrument(skip(self))]
    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Render => self.publish(),
            Effect::LookupProfile {
                generation,
                identity,
            } => self.spawn_lookup(generation, identity),
            Effect::SignOut => {
                let terminator = self.collaborators.terminator.clone();
                self.background.spawn(async move {
                    if let Err(e) = terminator.sign_out().await {
                        warn!(error = %e, "Sign-out request failed");
                    }
                });
            }
            Effect::PersistCoins { identity, amount } => {
                let ledger = self.collaborators.ledger.clone();
                self.background.spawn(async move {
                    if let Err(e) = ledger.save_coins(&identity, amount).await {
                        warn!(identity = %identity, amount, error = %e, "Failed to persist coins");
                    }
                });
            }
        }
    }

    fn spawn_lookup(&mut self, generation: u64, identity: Identity) {
        debug!(generation, identity = %identity, "Spawning profile lookup");
        let profiles = self.collaborators.profiles.clone();
        let lookup_identity = identity.clone();
        self.lookups.spawn(async move {
            // The store runs in its own task so a panic still resolves the lookup.
            let fetch = tokio::spawn(async move { profiles.get_profile(&lookup_identity).await });
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(identity = %identity, error = %e, "Profile lookup task failed");
                    Err(ProfileError::new(format!("Profile lookup aborted: {}", e)))
                }
            };
            ControllerEvent::ProfileResolved {
                generation,
                identity,
                outcome,
            }
        });
    }

    fn publish(&self) {
        let snapshot = self.controller.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        let plan = self.controller.render_plan();
        self.plans.send_if_modified(|current| {
            if *current == plan {
                false
            } else {
                *current = plan;
                true
            }
        });
    }
}

/// Waits for the next sign-in state, or forever without a subscription.
async fn next_auth_change(subscription: &mut Option<AuthSubscription>) -> Option<Option<Identity>> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}
