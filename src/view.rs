//! Rendering contract: which single thing is on screen and what it is given.

use tracing::instrument;

use crate::{BuildProfile, Fault, NavCommand, NavigationState, ScreenId, Session, UserProfile};

/// Exactly one of these is shown at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPlan {
    /// Waiting for the first auth event.
    Loading,
    /// A failure with a single escape hatch to diagnostics.
    ErrorPanel {
        /// What went wrong.
        fault: Fault,
    },
    /// One of the screens.
    Screen {
        /// The screen and its read-only props.
        view: ScreenView,
        /// Development builds float a diagnostics shortcut over every
        /// screen except diagnostics itself.
        diagnostics_overlay: bool,
    },
}

impl RenderPlan {
    /// Selects what to show from the current state.
    #[instrument(skip(session, navigation))]
    pub fn select(session: &Session, navigation: &NavigationState, build: BuildProfile) -> Self {
        if *session.initializing() {
            return Self::Loading;
        }
        if let Some(fault) = session.last_error() {
            return Self::ErrorPanel { fault: *fault };
        }
        let active = *navigation.active_screen();
        Self::Screen {
            view: ScreenView::build(session, navigation),
            diagnostics_overlay: build.is_development() && active != ScreenId::Diagnostic,
        }
    }
}

/// A screen together with the props it receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenView {
    /// Sign-in.
    Login,
    /// Registration.
    Register,
    /// Main menu.
    Menu {
        /// Coin balance mirror.
        coins: u64,
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Single-player room list.
    Rooms {
        /// Coin balance mirror.
        coins: u64,
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Single-player game.
    Game {
        /// Selected room.
        room_id: Option<String>,
        /// Coin balance mirror.
        coins: u64,
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Diagnostics.
    Diagnostic,
    /// Daily tasks.
    Tasks {
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Shop; shown for both `profile` and `shop`.
    Shop {
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
        /// Coin balance mirror.
        coins: u64,
    },
    /// Invitations.
    Invites {
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Multiplayer room list.
    GameRooms {
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
    /// Multiplayer game.
    MultiplayerGame {
        /// Selected game room, empty when none is selected.
        room_id: String,
        /// Loaded profile, if any.
        profile: Option<UserProfile>,
    },
}

impl ScreenView {
    /// Builds the view for the active screen.
    #[instrument(skip(session, navigation), fields(screen = %navigation.active_screen()))]
    pub fn build(session: &Session, navigation: &NavigationState) -> Self {
        let coins = *session.coins();
        let profile = session.profile().clone();
        match navigation.active_screen() {
            ScreenId::Login => Self::Login,
            ScreenId::Register => Self::Register,
            ScreenId::Menu => Self::Menu { coins, profile },
            ScreenId::Rooms => Self::Rooms { coins, profile },
            ScreenId::Game => Self::Game {
                room_id: navigation.selected_room_id().clone(),
                coins,
                profile,
            },
            ScreenId::Diagnostic => Self::Diagnostic,
            ScreenId::Tasks => Self::Tasks { profile },
            ScreenId::Profile | ScreenId::Shop => Self::Shop { profile, coins },
            ScreenId::Invites => Self::Invites { profile },
            ScreenId::GameRooms => Self::GameRooms { profile },
            ScreenId::MultiplayerGame => Self::MultiplayerGame {
                room_id: navigation.selected_game_room_id().clone().unwrap_or_default(),
                profile,
            },
        }
    }

    /// Title for the screen.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::Register => "Create Account",
            Self::Menu { .. } => "Menu",
            Self::Rooms { .. } => "Rooms",
            Self::Game { .. } => "Game",
            Self::Diagnostic => "Diagnostics",
            Self::Tasks { .. } => "Tasks",
            Self::Shop { .. } => "Shop",
            Self::Invites { .. } => "Invites",
            Self::GameRooms { .. } => "Game Rooms",
            Self::MultiplayerGame { .. } => "Multiplayer Game",
        }
    }

    /// The callbacks this screen is handed.
    #[instrument(skip(self))]
    pub fn callbacks(&self) -> &'static [Callback] {
        use Callback::*;
        match self {
            Self::Login => &[OnLogin, OnRegister, OnDiagnostic],
            Self::Register => &[OnRegisterSuccess, OnBackToLogin],
            Self::Menu { .. } => &[OnCoinsUpdated, OnNavigate, OnLogout],
            Self::Rooms { .. } => &[OnRoomSelect, OnBackToMenu],
            Self::Game { .. } => &[OnLogout, OnBackToMenu],
            Self::Diagnostic => &[OnBackToMenu],
            Self::Tasks { .. } | Self::Shop { .. } => &[OnCoinsUpdated, OnBackToMenu],
            Self::Invites { .. } => &[OnBackToMenu],
            Self::GameRooms { .. } => &[OnGameRoomSelect, OnBackToMenu],
            Self::MultiplayerGame { .. } => &[OnBackToRooms],
        }
    }

    /// Returns `true` if this screen was handed `callback`.
    pub fn grants(&self, callback: Callback) -> bool {
        self.callbacks().contains(&callback)
    }

    /// Coin balance shown by the screen, if it shows one.
    pub fn coins(&self) -> Option<u64> {
        match self {
            Self::Menu { coins, .. }
            | Self::Rooms { coins, .. }
            | Self::Game { coins, .. }
            | Self::Shop { coins, .. } => Some(*coins),
            _ => None,
        }
    }

    /// Profile passed to the screen, if it takes one.
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Menu { profile, .. }
            | Self::Rooms { profile, .. }
            | Self::Game { profile, .. }
            | Self::Tasks { profile }
            | Self::Shop { profile, .. }
            | Self::Invites { profile }
            | Self::GameRooms { profile }
            | Self::MultiplayerGame { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }
}

/// A callback a screen may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    /// Signed in from the login screen.
    OnLogin,
    /// Wants to register.
    OnRegister,
    /// Wants diagnostics.
    OnDiagnostic,
    /// Registration finished.
    OnRegisterSuccess,
    /// Back from registration.
    OnBackToLogin,
    /// Coin balance changed (takes an amount).
    OnCoinsUpdated,
    /// Navigate anywhere (takes a screen).
    OnNavigate,
    /// Sign out.
    OnLogout,
    /// Single-player room picked (takes a room id).
    OnRoomSelect,
    /// Multiplayer room picked (takes a room id).
    OnGameRoomSelect,
    /// Back to the menu.
    OnBackToMenu,
    /// Back to the multiplayer room list.
    OnBackToRooms,
}

impl Callback {
    /// The command for callbacks that take no argument.
    #[instrument]
    pub fn fixed_command(self) -> Option<NavCommand> {
        match self {
            Self::OnLogin => Some(NavCommand::Navigate(ScreenId::Menu)),
            Self::OnRegister => Some(NavCommand::Navigate(ScreenId::Register)),
            Self::OnDiagnostic => Some(NavCommand::Navigate(ScreenId::Diagnostic)),
            Self::OnRegisterSuccess | Self::OnBackToLogin => {
                Some(NavCommand::Navigate(ScreenId::Login))
            }
            Self::OnLogout => Some(NavCommand::SignOut),
            Self::OnBackToMenu => Some(NavCommand::BackToMenu),
            Self::OnBackToRooms => Some(NavCommand::BackToGameRooms),
            Self::OnCoinsUpdated | Self::OnNavigate | Self::OnRoomSelect | Self::OnGameRoomSelect => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    /// A signed-out session past the loading state, on `screen`.
    fn ready_on(screen: ScreenId) -> (Session, NavigationState) {
        let mut session = Session::new(500);
        session.finish_initializing();
        let mut navigation = NavigationState::new();
        navigation.navigate(screen);
        (session, navigation)
    }

    #[test]
    fn test_production_never_shows_overlay() {
        for screen in ScreenId::iter() {
            let (session, navigation) = ready_on(screen);
            match RenderPlan::select(&session, &navigation, BuildProfile::Production) {
                RenderPlan::Screen {
                    diagnostics_overlay,
                    ..
                } => assert!(!diagnostics_overlay, "overlay shown on {screen}"),
                other => panic!("Expected a screen on {screen}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_development_overlay_skips_diagnostics_only() {
        for screen in ScreenId::iter() {
            let (session, navigation) = ready_on(screen);
            let plan = RenderPlan::select(&session, &navigation, BuildProfile::Development);
            let RenderPlan::Screen {
                diagnostics_overlay,
                ..
            } = plan
            else {
                panic!("Expected a screen on {screen}");
            };
            assert_eq!(diagnostics_overlay, screen != ScreenId::Diagnostic);
        }
    }

    #[test]
    fn test_login_callbacks() {
        let view = ScreenView::Login;
        assert!(view.grants(Callback::OnRegister));
        assert!(!view.grants(Callback::OnLogout));
    }

    #[test]
    fn test_multiplayer_game_only_goes_back_to_rooms() {
        let view = ScreenView::MultiplayerGame {
            room_id: String::new(),
            profile: None,
        };
        assert_eq!(view.callbacks(), &[Callback::OnBackToRooms]);
        assert_eq!(
            Callback::OnBackToRooms.fixed_command(),
            Some(NavCommand::BackToGameRooms)
        );
    }

    #[test]
    fn test_argument_callbacks_have_no_fixed_command() {
        assert!(Callback::OnRoomSelect.fixed_command().is_none());
        assert!(Callback::OnCoinsUpdated.fixed_command().is_none());
    }
}
