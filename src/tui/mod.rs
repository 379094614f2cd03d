//! Terminal front end: draws render plans and forwards selections.

mod actions;
mod render;

pub use actions::{ActionKind, TuiAction, actions_for};

use std::io;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend, widgets::ListState};
use tokio::time::{Duration, sleep};
use tracing::{error, info, instrument, warn};

use crate::backend::{Collaborators, LocalBackend};
use crate::{ClientConfig, NavCommand, RenderPlan, RuntimeHandles, ScreenId, SessionRuntime};

/// Runs the terminal client against `backend` until the user quits.
#[instrument(skip(config, backend))]
pub async fn run_tui(config: ClientConfig, backend: LocalBackend) -> Result<()> {
    info!("Starting terminal client");

    let (runtime, handles) = SessionRuntime::new(&config, Collaborators::local(backend.clone()));
    let runtime_task = tokio::spawn(runtime.run());

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            error!(error = %e, "Failed to set up terminal");
            drop(handles);
            if let Err(e) = runtime_task.await {
                error!(error = %e, "Runtime task failed");
            }
            return Err(e);
        }
    };

    let res = event_loop(&mut terminal, handles, &backend, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match runtime_task.await {
        Ok(snapshot) => info!(screen = %snapshot.active_screen(), "Runtime stopped"),
        Err(e) => error!(error = %e, "Runtime task failed"),
    }
    res
}

/// Enters raw mode and the alternate screen, undoing both if a later step
/// fails.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let entered = execute!(stdout, EnterAlternateScreen)
        .map_err(anyhow::Error::from)
        .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)).map_err(anyhow::Error::from));
    restore_on_error(entered, || {
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            warn!(error = %e, "Failed to leave alternate screen");
        }
        disable_raw_mode()?;
        Ok(())
    })
}

/// Runs `restore` when `entered` failed, keeping the original error.
fn restore_on_error<T>(entered: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    match entered {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Err(restore_err) = restore() {
                error!(error = %restore_err, "Failed to restore terminal");
            }
            Err(e)
        }
    }
}

/// Selection state for the current plan.
#[derive(Debug, Default)]
struct Selection {
    /// Whether the login screen may offer the seeded test user.
    test_user_seeded: bool,
    plan: Option<RenderPlan>,
    actions: Vec<TuiAction>,
    list_state: ListState,
}

impl Selection {
    /// Rebuilds the action list when the plan changes.
    fn sync(&mut self, plan: RenderPlan) {
        if self.plan.as_ref() == Some(&plan) {
            return;
        }
        self.actions = actions_for(&plan, self.test_user_seeded);
        self.list_state
            .select(if self.actions.is_empty() { None } else { Some(0) });
        self.plan = Some(plan);
    }

    fn select_previous(&mut self) {
        let count = self.actions.len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i > 0 => i - 1,
            _ => count - 1,
        };
        self.list_state.select(Some(i));
    }

    fn select_next(&mut self) {
        let count = self.actions.len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn selected(&self) -> Option<&TuiAction> {
        self.list_state.selected().and_then(|i| self.actions.get(i))
    }

    fn overlay_shown(&self) -> bool {
        matches!(
            self.plan,
            Some(RenderPlan::Screen {
                diagnostics_overlay: true,
                ..
            })
        )
    }
}

#[instrument(skip_all)]
async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    handles: RuntimeHandles,
    backend: &LocalBackend,
    config: &ClientConfig,
) -> Result<()>
where
    <B as Backend>::Error: Send + Sync + 'static,
{
    let mut selection = Selection {
        test_user_seeded: config.should_seed_test_user(),
        ..Selection::default()
    };

    loop {
        selection.sync(handles.plans.borrow().clone());

        terminal.draw(|f| {
            if let Some(plan) = &selection.plan {
                render::draw(f, plan, &selection.actions, &mut selection.list_state);
            }
        })?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    info!("Quitting terminal client");
                    return Ok(());
                }
                KeyCode::Up => selection.select_previous(),
                KeyCode::Down => selection.select_next(),
                KeyCode::Char('d') if selection.overlay_shown() => {
                    handles.screens.open_diagnostics();
                }
                KeyCode::Enter => {
                    if let Some(action) = selection.selected().cloned() {
                        perform(action, &handles, backend, config);
                    }
                }
                _ => {}
            }
        }

        sleep(Duration::from_millis(10)).await;
    }
}

/// Carries out a selected action.
#[instrument(skip(handles, backend, config))]
fn perform(action: TuiAction, handles: &RuntimeHandles, backend: &LocalBackend, config: &ClientConfig) {
    match action.kind {
        ActionKind::SignInTestUser => match backend.sign_in(config.test_user_email()) {
            Ok(identity) => {
                info!(identity = %identity, "Signed in from login screen");
                handles.screens.send(NavCommand::Navigate(ScreenId::Menu));
            }
            Err(e) => warn!(error = %e, "Sign-in failed"),
        },
        ActionKind::Command(command) => {
            handles.screens.send(command);
        }
    }
}
