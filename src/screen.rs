//! Closed set of screen identifiers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, instrument};

/// Identifier of the single active screen.
///
/// The string form uses the client's camelCase tokens (`gameRooms`,
/// `multiplayerGame`). `Profile` and `Shop` are distinct identifiers that
/// present the same shop screen.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ScreenId {
    /// Sign-in screen; also the fallback for unknown names.
    #[default]
    Login,
    /// Account registration.
    Register,
    /// Main menu hub.
    Menu,
    /// Single-player room list.
    Rooms,
    /// Single-player game in the selected room.
    Game,
    /// User profile (rendered by the shop screen).
    Profile,
    /// Coin shop.
    Shop,
    /// Backend connectivity diagnostics.
    Diagnostic,
    /// Daily tasks.
    Tasks,
    /// Pending invitations.
    Invites,
    /// Multiplayer room list.
    GameRooms,
    /// Multiplayer game in the selected game room.
    MultiplayerGame,
}

impl ScreenId {
    /// Resolves a screen name, falling back to [`ScreenId::Login`] for
    /// anything outside the closed set.
    #[instrument]
    pub fn resolve(name: &str) -> Self {
        match name.parse() {
            Ok(screen) => screen,
            Err(_) => {
                debug!(name, "Unrecognized screen name, falling back to login");
                Self::Login
            }
        }
    }

    /// Returns the token used for this screen.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for screens reachable without a signed-in identity.
    #[instrument]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_resolve_known_names() {
        assert_eq!(ScreenId::resolve("menu"), ScreenId::Menu);
        assert_eq!(ScreenId::resolve("gameRooms"), ScreenId::GameRooms);
        assert_eq!(ScreenId::resolve("multiplayerGame"), ScreenId::MultiplayerGame);
        assert_eq!(ScreenId::resolve("profile"), ScreenId::Profile);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_login() {
        assert_eq!(ScreenId::resolve("leaderboard"), ScreenId::Login);
        assert_eq!(ScreenId::resolve(""), ScreenId::Login);
        assert_eq!(ScreenId::resolve("GameRooms"), ScreenId::Login);
    }

    #[test]
    fn test_every_screen_resolves_from_its_own_token() {
        for screen in ScreenId::iter() {
            assert_eq!(ScreenId::resolve(screen.as_str()), screen);
        }
        assert_eq!(ScreenId::iter().count(), 12);
    }

    #[test]
    fn test_serde_uses_camel_case_tokens() {
        let json = serde_json::to_string(&ScreenId::MultiplayerGame).expect("encode");
        assert_eq!(json, "\"multiplayerGame\"");
    }
}
