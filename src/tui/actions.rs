//! Selectable actions derived from the callbacks a screen was handed.

use tracing::instrument;

use crate::{Callback, NavCommand, RenderPlan, ScreenId, ScreenView};

/// Single-player rooms offered by the rooms screen.
pub const SAMPLE_ROOMS: &[&str] = &["r1", "r2", "r3"];

/// Multiplayer rooms offered by the game rooms screen.
pub const SAMPLE_GAME_ROOMS: &[&str] = &["g1", "g2"];

/// Screens the menu's navigate callback offers.
const MENU_DESTINATIONS: &[ScreenId] = &[
    ScreenId::Rooms,
    ScreenId::GameRooms,
    ScreenId::Tasks,
    ScreenId::Shop,
    ScreenId::Profile,
    ScreenId::Invites,
];

/// Coins granted by the "earn" action.
const EARN_AMOUNT: u64 = 100;

/// What selecting an action does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Sign in as the seeded test user, then report the login.
    SignInTestUser,
    /// Send a command to the runtime.
    Command(NavCommand),
}

/// One selectable line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuiAction {
    /// Text shown in the list.
    pub label: String,
    /// Effect of selecting it.
    pub kind: ActionKind,
}

impl TuiAction {
    fn command(label: impl Into<String>, command: NavCommand) -> Self {
        Self {
            label: label.into(),
            kind: ActionKind::Command(command),
        }
    }
}

/// Lists the actions for a render plan.
///
/// Signing in as the test user is only offered when `test_user_seeded`.
#[instrument(skip(plan))]
pub fn actions_for(plan: &RenderPlan, test_user_seeded: bool) -> Vec<TuiAction> {
    match plan {
        RenderPlan::Loading => Vec::new(),
        RenderPlan::ErrorPanel { .. } => {
            vec![TuiAction::command("Run diagnostics", NavCommand::RunDiagnostic)]
        }
        RenderPlan::Screen { view, .. } => view
            .callbacks()
            .iter()
            .flat_map(|callback| expand(*callback, view, test_user_seeded))
            .collect(),
    }
}

/// Turns one callback into concrete actions.
fn expand(callback: Callback, view: &ScreenView, test_user_seeded: bool) -> Vec<TuiAction> {
    match callback {
        Callback::OnLogin if !test_user_seeded => Vec::new(),
        Callback::OnLogin => vec![TuiAction {
            label: "Sign in as test user".to_string(),
            kind: ActionKind::SignInTestUser,
        }],
        Callback::OnCoinsUpdated => {
            let coins = view.coins().unwrap_or_default();
            vec![TuiAction::command(
                format!("Earn {} coins", EARN_AMOUNT),
                NavCommand::UpdateCoins(coins.saturating_add(EARN_AMOUNT)),
            )]
        }
        Callback::OnNavigate => MENU_DESTINATIONS
            .iter()
            .map(|screen| {
                TuiAction::command(format!("Go to {}", screen), NavCommand::Navigate(*screen))
            })
            .collect(),
        Callback::OnRoomSelect => SAMPLE_ROOMS
            .iter()
            .map(|room| {
                TuiAction::command(format!("Join room {}", room), NavCommand::SelectRoom(room.to_string()))
            })
            .collect(),
        Callback::OnGameRoomSelect => SAMPLE_GAME_ROOMS
            .iter()
            .map(|room| {
                TuiAction::command(
                    format!("Join game room {}", room),
                    NavCommand::SelectGameRoom(room.to_string()),
                )
            })
            .collect(),
        other => other
            .fixed_command()
            .map(|command| TuiAction::command(label_for(other), command))
            .into_iter()
            .collect(),
    }
}

fn label_for(callback: Callback) -> &'static str {
    match callback {
        Callback::OnRegister => "Create an account",
        Callback::OnDiagnostic => "Diagnostics",
        Callback::OnRegisterSuccess => "Finish registration",
        Callback::OnBackToLogin => "Back to sign in",
        Callback::OnLogout => "Sign out",
        Callback::OnBackToMenu => "Back to menu",
        Callback::OnBackToRooms => "Back to game rooms",
        _ => "",
    }
}
