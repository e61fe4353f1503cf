use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::controller::{ExchangeState, ViewState};
use crate::ui::sidebar::{render_sidebar, SIDEBAR_WIDTH};
use crate::ui::state::{Focus, UiState};
use crate::ui::transcript::transcript_lines;

const TITLE: &str = "Chatbot Playground";
const SUBTITLE: &str = "Chat App · Powered by Groq";
const HELP: &str = "Enter send · Tab parameters · PgUp/PgDn scroll · Ctrl+C quit";
const SIDEBAR_HELP: &str = "↑↓ select · ←→ adjust (Shift: faster) · Enter toggle · Tab chat";
const STOP_EDIT_HELP: &str = "Enter save stop sequence · Esc cancel";
const ORANGE: Color = Color::Rgb(255, 165, 0);

/// Geometry the event loop needs after a frame is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMetrics {
    /// Largest useful `scroll_from_bottom` for the transcript pane.
    pub max_scroll: u16,
    /// Visible transcript rows, used as the PageUp/PageDown step.
    pub page_height: u16,
}

pub fn ui(f: &mut Frame, view: &ViewState<'_>, state: &UiState) -> RenderMetrics {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDEBAR_WIDTH)])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(columns[0]);

    render_header(f, chunks[0]);
    let metrics = render_transcript(f, chunks[1], view, state);
    render_input(f, chunks[2], view, state);
    render_status(f, chunks[3], view, state, Instant::now());
    render_sidebar(f, columns[1], view.params, state);

    metrics
}

fn render_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(ORANGE))),
    ];
    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(ORANGE)),
    );
    f.render_widget(header, area);
}

fn render_transcript(
    f: &mut Frame,
    area: Rect,
    view: &ViewState<'_>,
    state: &UiState,
) -> RenderMetrics {
    let lines = transcript_lines(view, area.width);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(area.height);
    let offset = max_scroll - state.scroll_from_bottom.min(max_scroll);

    f.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);

    RenderMetrics {
        max_scroll,
        page_height: area.height.max(1),
    }
}

fn render_input(f: &mut Frame, area: Rect, view: &ViewState<'_>, state: &UiState) {
    let busy = view.state != ExchangeState::Idle;
    let border_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else if state.focus == Focus::Input {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut input = state.input.clone();
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    if state.focus != Focus::Input || busy {
        input.set_cursor_style(Style::default());
    }
    input.set_cursor_line_style(Style::default());
    f.render_widget(&input, area);
}

fn render_status(
    f: &mut Frame,
    area: Rect,
    view: &ViewState<'_>,
    state: &UiState,
    now: Instant,
) {
    f.render_widget(Paragraph::new(status_line(view, state, now)), area);
}

/// Error first, then the toast, then activity, then key help.
pub fn status_line(view: &ViewState<'_>, state: &UiState, now: Instant) -> Line<'static> {
    if let Some(error) = &state.status_error {
        return Line::from(Span::styled(
            format!("❌ {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    if let Some(toast) = state.toast(now) {
        return Line::from(Span::styled(
            toast.to_string(),
            Style::default().fg(Color::Green),
        ));
    }
    let help = match view.state {
        ExchangeState::Requesting | ExchangeState::Rendering => {
            return Line::from(Span::styled(
                "Generating…",
                Style::default().fg(ORANGE).add_modifier(Modifier::ITALIC),
            ))
        }
        ExchangeState::Idle if state.stop_editor.is_some() => STOP_EDIT_HELP,
        ExchangeState::Idle if state.focus == Focus::Sidebar => SIDEBAR_HELP,
        ExchangeState::Idle => HELP,
    };
    Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)))
}
