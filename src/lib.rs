//! Caity client library - session and screen navigation for the coin game
//!
//! Tracks who is signed in, loads their profile, and decides which one of a
//! fixed set of screens is shown. Screens and backends are collaborators:
//! screens get read-only views plus a [`ScreenHandle`] to request changes,
//! and the auth/profile services sit behind the traits in [`backend`].
//!
//! # Architecture
//!
//! - **Controller**: pure state machine turning events into effects
//! - **Runtime**: tokio loop feeding auth changes, commands, and lookups
//!   into the controller and executing its effects
//! - **View**: the rendering contract (loading, error panel, or one screen)
//! - **Replay**: deterministic scripted runs for inspection and tests
//!
//! # Example
//!
//! ```no_run
//! use caity_client::{ClientConfig, SessionRuntime, backend::{Collaborators, LocalBackend}};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let backend = LocalBackend::from_config(&config);
//! let (runtime, handles) = SessionRuntime::new(&config, Collaborators::local(backend));
//! let task = tokio::spawn(runtime.run());
//!
//! handles.screens.navigate(caity_client::ScreenId::Register);
//! drop(handles);
//! let last = task.await?;
//! println!("{}", last.active_screen());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
mod command;
mod config;
mod controller;
mod effect;
mod error;
mod navigation;
mod replay;
mod runtime;
mod screen;
mod session;
mod tui;
mod view;

// Crate-level exports - Errors
pub use error::{AuthError, ConfigError, ProfileError, ReplayError};

// Crate-level exports - Configuration
pub use config::{BUILD_ENV_VAR, BuildProfile, ClientConfig};

// Crate-level exports - Session state
pub use navigation::NavigationState;
pub use screen::ScreenId;
pub use session::{
    ERROR_HELP, Fault, Identity, PROFILE_NOT_FOUND_MESSAGE, PROFILE_UNAVAILABLE_MESSAGE,
    SUBSCRIPTION_SETUP_MESSAGE, Session, UserProfile,
};

// Crate-level exports - Controller
pub use command::{NavCommand, ScreenHandle};
pub use controller::{ControllerEvent, Phase, SessionController, SessionSnapshot};
pub use effect::Effect;
pub use view::{Callback, RenderPlan, ScreenView};

// Crate-level exports - Runtime
pub use runtime::{RuntimeHandles, SHUTDOWN_GRACE, SessionRuntime};

// Crate-level exports - Replay
pub use replay::{
    ReplayFrame, ReplayReport, ReplayScript, ScriptProfile, ScriptStep, final_screen, run_script,
};

// Crate-level exports - Terminal front end
pub use tui::{ActionKind, TuiAction, actions_for, run_tui};
