//! Client configuration loaded from TOML and the environment.

use std::path::Path;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, instrument, warn};

use crate::ConfigError;

/// Environment variable overriding [`ClientConfig::build`].
pub const BUILD_ENV_VAR: &str = "CAITY_BUILD";

/// Build flavor. Development builds show the diagnostics overlay and seed
/// a test user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    /// Local development.
    #[default]
    Development,
    /// Shipped build.
    Production,
}

impl BuildProfile {
    /// Returns `true` for development builds.
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Settings for the session controller and the local backend.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Build flavor.
    #[serde(default)]
    build: BuildProfile,

    /// Coin balance shown before any profile has loaded.
    #[serde(default = "default_starting_coins")]
    starting_coins: u64,

    /// Seed a test user into the local backend (development builds only).
    #[serde(default = "default_seed_test_user")]
    seed_test_user: bool,

    /// Email of the seeded test user.
    #[serde(default = "default_test_user_email")]
    test_user_email: String,

    /// Coin balance of the seeded test user.
    #[serde(default = "default_starting_coins")]
    test_user_coins: u64,
}

#[instrument]
fn default_starting_coins() -> u64 {
    500
}

#[instrument]
fn default_seed_test_user() -> bool {
    true
}

#[instrument]
fn default_test_user_email() -> String {
    "test@caity.dev".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            build: BuildProfile::default(),
            starting_coins: default_starting_coins(),
            seed_test_user: default_seed_test_user(),
            test_user_email: default_test_user_email(),
            test_user_coins: default_starting_coins(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)?;
        info!(build = %config.build, "Config loaded successfully");
        Ok(config)
    }

    /// Loads from `path` if given, otherwise defaults, then applies the
    /// environment override.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                debug!("No config file given, using defaults");
                Self::default()
            }
        };
        config.with_env_override(std::env::var(BUILD_ENV_VAR).ok().as_deref())
    }

    /// Applies a build profile override such as the value of `CAITY_BUILD`.
    #[instrument(skip(self))]
    pub fn with_env_override(mut self, build: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = build {
            self.build = raw.parse().map_err(|_| {
                warn!(value = raw, "Invalid build profile override");
                ConfigError::new(format!("Invalid {} value: {}", BUILD_ENV_VAR, raw))
            })?;
            debug!(build = %self.build, "Build profile overridden from environment");
        }
        Ok(self)
    }

    /// Returns a copy with a different build profile.
    pub fn with_build(mut self, build: BuildProfile) -> Self {
        self.build = build;
        self
    }

    /// Returns `true` if the local backend should get a test user.
    pub fn should_seed_test_user(&self) -> bool {
        self.build.is_development() && self.seed_test_user
    }
}
