//! Transcript lines for the chat pane.
//!
//! Text is wrapped here rather than by ratatui's `Paragraph` so the renderer
//! knows exactly how many rows the transcript occupies and can keep the
//! scroll offset anchored to the newest line.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::controller::{ExchangeState, ViewState};
use crate::core::message::Role;

const USER_PREFIX: &str = "You: ";
const ORANGE: Color = Color::Rgb(255, 165, 0);

/// Word-wrap `text` to `width` display columns. Newlines are kept, runs of
/// spaces inside a line are kept, and words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for piece in paragraph.split_inclusive(' ') {
            let word = piece.trim_end_matches(' ');
            let word_width = UnicodeWidthStr::width(word);
            let spaces = &piece[word.len()..];

            if !line.is_empty() && line_width + word_width > width {
                out.push(line.trim_end().to_string());
                line.clear();
                line_width = 0;
            }

            if word_width > width {
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if !line.is_empty() && line_width + ch_width > width {
                        out.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push(ch);
                    line_width += ch_width;
                }
            } else {
                line.push_str(word);
                line_width += word_width;
            }

            line.push_str(spaces);
            line_width += spaces.len();
        }

        out.push(line.trim_end().to_string());
    }

    out
}

fn user_lines(content: &str, width: u16) -> Vec<Line<'static>> {
    let prefix_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let inner = usize::from(width).saturating_sub(USER_PREFIX.len());
    wrap_text(content, inner)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let lead = if index == 0 {
                Span::styled(USER_PREFIX, prefix_style)
            } else {
                Span::raw(" ".repeat(USER_PREFIX.len()))
            };
            Line::from(vec![lead, Span::raw(row)])
        })
        .collect()
}

fn assistant_lines(content: &str, width: u16) -> Vec<Line<'static>> {
    wrap_text(content, usize::from(width))
        .into_iter()
        .map(Line::from)
        .collect()
}

/// Every row of the transcript pane at the given width, including the reply
/// that is still arriving.
pub fn transcript_lines(view: &ViewState<'_>, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if view.turns.is_empty() && view.pending.is_none() {
        lines.push(Line::from(Span::styled(
            format!("Start chatting with {}.", view.params.model),
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    for turn in view.turns {
        match turn.role {
            Role::User => lines.extend(user_lines(&turn.content, width)),
            Role::Assistant => lines.extend(assistant_lines(&turn.content, width)),
        }
        lines.push(Line::default());
    }

    if let Some(pending) = view.pending {
        if view.state == ExchangeState::Requesting {
            lines.push(Line::from(Span::styled(
                "Thinking…",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        } else {
            let mut rows = assistant_lines(pending, width.saturating_sub(1));
            if let Some(last) = rows.last_mut() {
                last.spans.push(Span::styled("▌", Style::default().fg(ORANGE)));
            }
            lines.extend(rows);
        }
    }

    lines
}
