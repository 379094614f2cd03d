//! Requests screens send back to the controller.

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::ScreenId;

/// A state change requested by a screen.
///
/// Screens never mutate session or navigation state themselves; they queue
/// one of these through a [`ScreenHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    /// Switch to the given screen.
    Navigate(ScreenId),
    /// Pick a single-player room and open the game.
    SelectRoom(String),
    /// Pick a multiplayer room and open the multiplayer game.
    SelectGameRoom(String),
    /// Return to the menu.
    BackToMenu,
    /// Leave the multiplayer game for the game room list.
    BackToGameRooms,
    /// Overwrite the coin balance.
    UpdateCoins(u64),
    /// Ask the auth backend to end the session.
    SignOut,
    /// Dismiss the error panel and open diagnostics.
    RunDiagnostic,
    /// Open diagnostics from the development overlay.
    OpenDiagnostics,
}

impl NavCommand {
    /// Builds a navigation command from a screen name, resolving unknown
    /// names to the login screen.
    #[instrument]
    pub fn navigate_named(name: &str) -> Self {
        Self::Navigate(ScreenId::resolve(name))
    }
}

/// Cloneable handle screens use to request transitions.
///
/// The runtime stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct ScreenHandle {
    tx: mpsc::UnboundedSender<NavCommand>,
}

impl ScreenHandle {
    /// Creates a handle and the receiver the runtime drains.
    #[instrument]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NavCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues a command. Returns `false` if the runtime has stopped.
    #[instrument(skip(self))]
    pub fn send(&self, command: NavCommand) -> bool {
        debug!(?command, "Queueing screen command");
        match self.tx.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!(command = ?e.0, "Runtime stopped, command dropped");
                false
            }
        }
    }

    /// Requests `navigate(screen)`.
    pub fn navigate(&self, screen: ScreenId) -> bool {
        self.send(NavCommand::Navigate(screen))
    }

    /// Requests `selectRoom(room_id)`.
    pub fn select_room(&self, room_id: impl Into<String>) -> bool {
        self.send(NavCommand::SelectRoom(room_id.into()))
    }

    /// Requests `selectGameRoom(room_id)`.
    pub fn select_game_room(&self, room_id: impl Into<String>) -> bool {
        self.send(NavCommand::SelectGameRoom(room_id.into()))
    }

    /// Requests `backToMenu()`.
    pub fn back_to_menu(&self) -> bool {
        self.send(NavCommand::BackToMenu)
    }

    /// Requests `backToGameRooms()`.
    pub fn back_to_game_rooms(&self) -> bool {
        self.send(NavCommand::BackToGameRooms)
    }

    /// Requests `updateCoins(amount)`.
    pub fn update_coins(&self, amount: u64) -> bool {
        self.send(NavCommand::UpdateCoins(amount))
    }

    /// Requests a sign-out.
    pub fn sign_out(&self) -> bool {
        self.send(NavCommand::SignOut)
    }

    /// Requests the error panel's diagnostic escape hatch.
    pub fn run_diagnostic(&self) -> bool {
        self.send(NavCommand::RunDiagnostic)
    }

    /// Requests the development overlay's diagnostics shortcut.
    pub fn open_diagnostics(&self) -> bool {
        self.send(NavCommand::OpenDiagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_named_falls_back_to_login() {
        assert_eq!(NavCommand::navigate_named("shop"), NavCommand::Navigate(ScreenId::Shop));
        assert_eq!(NavCommand::navigate_named("nowhere"), NavCommand::Navigate(ScreenId::Login));
    }

    #[test]
    fn test_handle_queues_in_order() {
        let (handle, mut rx) = ScreenHandle::channel();
        assert!(handle.select_room("r7"));
        assert!(handle.back_to_menu());
        assert_eq!(rx.try_recv().ok(), Some(NavCommand::SelectRoom("r7".to_string())));
        assert_eq!(rx.try_recv().ok(), Some(NavCommand::BackToMenu));
    }

    #[test]
    fn test_send_after_receiver_dropped_reports_failure() {
        let (handle, rx) = ScreenHandle::channel();
        drop(rx);
        assert!(!handle.update_coins(10));
    }
}
