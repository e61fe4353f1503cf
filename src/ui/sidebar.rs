//! The parameter sidebar: which controls exist, how keys change them and how
//! they are drawn.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::core::controller::Session;
use crate::core::conversation::ResetNotice;
use crate::core::params::{ParameterSnapshot, MAX_TOKENS_LIMIT, TEMPERATURE_RANGE, TOP_P_RANGE};
use crate::ui::state::{Focus, UiState};

pub const SIDEBAR_WIDTH: u16 = 34;

const TEMPERATURE_STEP: (f32, f32) = (0.1, 0.5);
const MAX_TOKENS_STEP: (i64, i64) = (256, 4096);
const TOP_P_STEP: (f32, f32) = (0.05, 0.25);
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterField {
    Model,
    Temperature,
    MaxTokens,
    Streaming,
    JsonMode,
    Advanced,
    TopP,
    StopSequence,
}

const BASIC_FIELDS: [ParameterField; 6] = [
    ParameterField::Model,
    ParameterField::Temperature,
    ParameterField::MaxTokens,
    ParameterField::Streaming,
    ParameterField::JsonMode,
    ParameterField::Advanced,
];

const ALL_FIELDS: [ParameterField; 8] = [
    ParameterField::Model,
    ParameterField::Temperature,
    ParameterField::MaxTokens,
    ParameterField::Streaming,
    ParameterField::JsonMode,
    ParameterField::Advanced,
    ParameterField::TopP,
    ParameterField::StopSequence,
];

/// Controls shown in the sidebar; top-p and the stop sequence sit behind the
/// "Advanced" group.
pub fn visible_fields(advanced_expanded: bool) -> &'static [ParameterField] {
    if advanced_expanded {
        &ALL_FIELDS
    } else {
        &BASIC_FIELDS
    }
}

impl ParameterField {
    pub fn label(self) -> &'static str {
        match self {
            ParameterField::Model => "Select Model",
            ParameterField::Temperature => "Temperature",
            ParameterField::MaxTokens => "Max Tokens",
            ParameterField::Streaming => "Stream Mode",
            ParameterField::JsonMode => "JSON Mode",
            ParameterField::Advanced => "Advanced",
            ParameterField::TopP => "Top P",
            ParameterField::StopSequence => "Stop Sequence",
        }
    }

    pub fn help(self) -> Option<&'static str> {
        match self {
            ParameterField::JsonMode => Some("Enable JSON structured response output."),
            ParameterField::TopP => Some("Less commonly changed if you adjust temperature."),
            _ => None,
        }
    }
}

/// Left/Right on the selected control. `direction` is -1 or +1.
pub fn adjust(
    session: &mut Session,
    ui: &mut UiState,
    direction: i8,
    coarse: bool,
) -> Option<ResetNotice> {
    let sign = f32::from(direction.signum());
    match ui.selected_field() {
        ParameterField::Model => session.cycle_model(isize::from(direction.signum())),
        ParameterField::Temperature => {
            let step = pick(TEMPERATURE_STEP, coarse);
            session.tune(|panel| panel.step_temperature(sign * step))
        }
        ParameterField::MaxTokens => {
            let step = pick(MAX_TOKENS_STEP, coarse);
            session.tune(|panel| panel.step_max_tokens(i64::from(direction.signum()) * step))
        }
        ParameterField::TopP => {
            let step = pick(TOP_P_STEP, coarse);
            session.tune(|panel| panel.step_top_p(sign * step))
        }
        ParameterField::Streaming => session.tune(|panel| panel.set_streaming(direction > 0)),
        ParameterField::JsonMode => session.tune(|panel| panel.set_json_mode(direction > 0)),
        ParameterField::Advanced => {
            if ui.advanced_expanded != (direction > 0) {
                ui.toggle_advanced();
            }
            None
        }
        ParameterField::StopSequence => None,
    }
}

/// Enter on the selected control.
pub fn activate(session: &mut Session, ui: &mut UiState) -> Option<ResetNotice> {
    match ui.selected_field() {
        ParameterField::Model => session.cycle_model(1),
        ParameterField::Streaming => {
            let next = !session.params().streaming;
            session.tune(|panel| panel.set_streaming(next))
        }
        ParameterField::JsonMode => {
            let next = !session.params().json_mode;
            session.tune(|panel| panel.set_json_mode(next))
        }
        ParameterField::Advanced => {
            ui.toggle_advanced();
            None
        }
        ParameterField::StopSequence => {
            ui.begin_stop_edit(&session.params().stop_sequence);
            None
        }
        ParameterField::Temperature | ParameterField::MaxTokens | ParameterField::TopP => None,
    }
}

fn pick<T>(steps: (T, T), coarse: bool) -> T {
    if coarse {
        steps.1
    } else {
        steps.0
    }
}

pub fn sidebar_lines(params: &ParameterSnapshot, ui: &UiState) -> Vec<Line<'static>> {
    let focused = ui.focus == Focus::Sidebar;
    let selected = ui.selected_field();
    let mut lines = Vec::new();

    for &field in visible_fields(ui.advanced_expanded) {
        let is_selected = focused && field == selected;
        let marker = if is_selected { "› " } else { "  " };
        let label_style = if is_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        if field == ParameterField::Advanced {
            let arrow = if ui.advanced_expanded { "▾ " } else { "▸ " };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{arrow}{}", field.label()), label_style),
            ]));
            continue;
        }

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(field.label(), label_style),
        ]));
        lines.push(value_line(field, params, ui));
        if is_selected {
            if let Some(help) = field.help() {
                lines.push(Line::from(Span::styled(
                    format!("    {help}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn value_line(field: ParameterField, params: &ParameterSnapshot, ui: &UiState) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let accent = Style::default().fg(Color::Rgb(255, 165, 0));
    let spans = match field {
        ParameterField::Model => vec![Span::styled(format!("‹ {} ›", params.model), accent)],
        ParameterField::Temperature => slider(params.temperature, TEMPERATURE_RANGE),
        ParameterField::TopP => slider(params.top_p, TOP_P_RANGE),
        ParameterField::MaxTokens => {
            let fraction = params.max_tokens as f32 / MAX_TOKENS_LIMIT as f32;
            let mut spans = bar(fraction);
            spans.push(Span::styled(format!(" {}", params.max_tokens), accent));
            spans
        }
        ParameterField::Streaming => toggle(params.streaming),
        ParameterField::JsonMode => toggle(params.json_mode),
        ParameterField::StopSequence => match &ui.stop_editor {
            Some(editor) => vec![Span::styled(
                format!("{}▏", editor.lines().concat()),
                Style::default().fg(Color::Yellow),
            )],
            None if params.stop_sequence.is_empty() => vec![Span::styled("(none)", dim)],
            None => vec![Span::styled(format!("{:?}", params.stop_sequence), accent)],
        },
        ParameterField::Advanced => Vec::new(),
    };

    let mut line = vec![Span::raw("    ")];
    line.extend(spans);
    Line::from(line)
}

fn slider(value: f32, (min, max): (f32, f32)) -> Vec<Span<'static>> {
    let fraction = (value - min) / (max - min);
    let mut spans = bar(fraction);
    spans.push(Span::styled(
        format!(" {value:.2}"),
        Style::default().fg(Color::Rgb(255, 165, 0)),
    ));
    spans
}

fn bar(fraction: f32) -> Vec<Span<'static>> {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    vec![
        Span::styled("━".repeat(filled), Style::default().fg(Color::Rgb(255, 165, 0))),
        Span::styled(
            "─".repeat(BAR_WIDTH - filled),
            Style::default().fg(Color::DarkGray),
        ),
    ]
}

fn toggle(on: bool) -> Vec<Span<'static>> {
    if on {
        vec![Span::styled("● On", Style::default().fg(Color::Green))]
    } else {
        vec![Span::styled("○ Off", Style::default().fg(Color::DarkGray))]
    }
}

pub fn render_sidebar(f: &mut Frame, area: Rect, params: &ParameterSnapshot, ui: &UiState) {
    let border_style = if ui.focus == Focus::Sidebar {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(" Parameters ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let sidebar = Paragraph::new(sidebar_lines(params, ui))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(sidebar, area);
}
