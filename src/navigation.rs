//! Navigation state: the active screen and the room selections.

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::ScreenId;

/// Which screen is active and which rooms were picked to get there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize)]
pub struct NavigationState {
    active_screen: ScreenId,
    selected_room_id: Option<String>,
    selected_game_room_id: Option<String>,
}

impl NavigationState {
    /// Starts on the login screen with nothing selected.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to `screen` unconditionally.
    #[instrument(skip(self), fields(from = %self.active_screen))]
    pub fn navigate(&mut self, screen: ScreenId) {
        debug!(to = %screen, "Navigating");
        self.active_screen = screen;
    }

    /// Picks a single-player room and opens the game screen.
    #[instrument(skip(self))]
    pub fn select_room(&mut self, room_id: String) {
        self.selected_room_id = Some(room_id);
        self.active_screen = ScreenId::Game;
    }

    /// Picks a multiplayer room and opens the multiplayer game screen.
    #[instrument(skip(self))]
    pub fn select_game_room(&mut self, room_id: String) {
        self.selected_game_room_id = Some(room_id);
        self.active_screen = ScreenId::MultiplayerGame;
    }

    /// Returns to the menu. Room selections are kept.
    #[instrument(skip(self))]
    pub fn back_to_menu(&mut self) {
        self.active_screen = ScreenId::Menu;
    }

    /// Leaves the multiplayer game and forgets its room.
    #[instrument(skip(self))]
    pub fn back_to_game_rooms(&mut self) {
        self.selected_game_room_id = None;
        self.active_screen = ScreenId::GameRooms;
    }

    /// Forces the login screen and forgets all room selections.
    #[instrument(skip(self))]
    pub fn reset_to_login(&mut self) {
        self.selected_room_id = None;
        self.selected_game_room_id = None;
        self.active_screen = ScreenId::Login;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_room_then_back_to_menu_keeps_room() {
        let mut nav = NavigationState::new();
        nav.navigate(ScreenId::Rooms);
        nav.select_room("r7".to_string());
        assert_eq!(*nav.active_screen(), ScreenId::Game);
        nav.back_to_menu();
        assert_eq!(*nav.active_screen(), ScreenId::Menu);
        assert_eq!(nav.selected_room_id().as_deref(), Some("r7"));
    }

    #[test]
    fn test_back_to_game_rooms_clears_game_room() {
        let mut nav = NavigationState::new();
        nav.select_game_room("g1".to_string());
        assert_eq!(*nav.active_screen(), ScreenId::MultiplayerGame);
        nav.back_to_game_rooms();
        assert_eq!(*nav.active_screen(), ScreenId::GameRooms);
        assert!(nav.selected_game_room_id().is_none());
    }

    #[test]
    fn test_reset_to_login_clears_selections() {
        let mut nav = NavigationState::new();
        nav.select_room("r1".to_string());
        nav.select_game_room("g1".to_string());
        nav.reset_to_login();
        assert_eq!(*nav.active_screen(), ScreenId::Login);
        assert!(nav.selected_room_id().is_none());
        assert!(nav.selected_game_room_id().is_none());
    }
}
