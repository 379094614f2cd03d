//! Draws a render plan.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::instrument;

use crate::tui::actions::TuiAction;
use crate::{ERROR_HELP, RenderPlan, ScreenView};

/// Draws `plan` with `actions` as the selectable list.
#[instrument(skip_all)]
pub fn draw(frame: &mut Frame, plan: &RenderPlan, actions: &[TuiAction], list_state: &mut ListState) {
    match plan {
        RenderPlan::Loading => draw_loading(frame),
        RenderPlan::ErrorPanel { fault } => {
            draw_error(frame, fault.message(), actions, list_state)
        }
        RenderPlan::Screen {
            view,
            diagnostics_overlay,
        } => {
            draw_screen(frame, view, actions, list_state);
            if *diagnostics_overlay {
                draw_overlay(frame);
            }
        }
    }
}

fn draw_loading(frame: &mut Frame) {
    let loading = Paragraph::new("Loading...")
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, frame.area());
}

fn draw_error(frame: &mut Frame, message: &str, actions: &[TuiAction], list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(frame.area());

    let text = format!("{}\n\n{}", message, ERROR_HELP);
    let panel = Paragraph::new(text)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Error"));
    frame.render_widget(panel, chunks[0]);

    frame.render_stateful_widget(action_list(actions), chunks[1], list_state);
}

fn draw_screen(frame: &mut Frame, view: &ScreenView, actions: &[TuiAction], list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = Paragraph::new(view.title())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let props = Paragraph::new(props_line(view))
        .style(Style::default().fg(Color::Green))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(props, chunks[1]);

    frame.render_stateful_widget(action_list(actions), chunks[2], list_state);

    let help = Paragraph::new("↑↓: Navigate | Enter: Select | d: Diagnostics | q: Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[3]);
}

/// Small box in the bottom-right corner.
fn draw_overlay(frame: &mut Frame) {
    let area = frame.area();
    let width = area.width.min(10);
    let height = area.height.min(3);
    let corner = Rect::new(
        area.x + area.width - width,
        area.y + area.height - height,
        width,
        height,
    );
    frame.render_widget(Clear, corner);
    let button = Paragraph::new("Diag")
        .style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, corner);
}

fn props_line(view: &ScreenView) -> String {
    let mut parts = Vec::new();
    if let Some(profile) = view.profile() {
        parts.push(format!("Player: {}", profile.display_name()));
    }
    if let Some(coins) = view.coins() {
        parts.push(format!("Coins: {}", coins));
    }
    match view {
        ScreenView::Game {
            room_id: Some(room), ..
        } => parts.push(format!("Room: {}", room)),
        ScreenView::MultiplayerGame { room_id, .. } if !room_id.is_empty() => {
            parts.push(format!("Game room: {}", room_id))
        }
        _ => {}
    }
    parts.join("   ")
}

fn action_list(actions: &[TuiAction]) -> List<'static> {
    let items: Vec<ListItem> = actions
        .iter()
        .map(|a| ListItem::new(a.label.clone()))
        .collect();
    List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Actions"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}
