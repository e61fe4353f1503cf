//! Key handling for the chat screen.
//!
//! Keys are resolved against the current focus: the chat input, the
//! parameter sidebar, or the stop-sequence editor when it is open.

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input as TAInput;

use crate::core::controller::Session;
use crate::core::conversation::ResetNotice;
use crate::ui::sidebar::{activate, adjust};
use crate::ui::state::{Focus, UiState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    Submit(String),
    Quit,
}

pub fn handle_key(
    ui: &mut UiState,
    session: &mut Session,
    key: KeyEvent,
    page_height: u16,
    now: Instant,
) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if ui.stop_editor.is_some() {
        return handle_stop_editor(ui, session, key);
    }

    match key.code {
        KeyCode::PageUp => {
            ui.scroll_up(page_height.max(1));
            return KeyOutcome::Handled;
        }
        KeyCode::PageDown => {
            ui.scroll_down(page_height.max(1));
            return KeyOutcome::Handled;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            ui.toggle_focus();
            return KeyOutcome::Handled;
        }
        _ => {}
    }

    match ui.focus {
        Focus::Input => handle_input_key(ui, key),
        Focus::Sidebar => match handle_sidebar_key(ui, session, key) {
            None => KeyOutcome::Ignored,
            Some(Some(notice)) => {
                ui.status_error = None;
                ui.scroll_from_bottom = 0;
                ui.show_toast(notice.message(), now);
                KeyOutcome::Handled
            }
            Some(None) => KeyOutcome::Handled,
        },
    }
}

fn handle_input_key(ui: &mut UiState, key: KeyEvent) -> KeyOutcome {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            ui.input.insert_newline();
            KeyOutcome::Handled
        }
        KeyCode::Enter => {
            let text = ui.take_input();
            if text.trim().is_empty() {
                return KeyOutcome::Handled;
            }
            ui.status_error = None;
            ui.scroll_from_bottom = 0;
            KeyOutcome::Submit(text)
        }
        _ => {
            if ui.input.input(TAInput::from(key)) {
                KeyOutcome::Handled
            } else {
                KeyOutcome::Ignored
            }
        }
    }
}

/// Insert bracketed-paste text where the user is typing. Pasted line breaks
/// never submit; the stop-sequence editor keeps a single line.
pub fn handle_paste(ui: &mut UiState, text: &str) -> KeyOutcome {
    let sanitized = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "    ")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect::<String>();

    if let Some(editor) = ui.stop_editor.as_mut() {
        editor.insert_str(sanitized.replace('\n', ""));
        return KeyOutcome::Handled;
    }

    match ui.focus {
        Focus::Input => {
            ui.input.insert_str(&sanitized);
            KeyOutcome::Handled
        }
        Focus::Sidebar => KeyOutcome::Ignored,
    }
}

/// `None` when the key was not a sidebar key; otherwise the reset notice, if
/// the model changed.
fn handle_sidebar_key(
    ui: &mut UiState,
    session: &mut Session,
    key: KeyEvent,
) -> Option<Option<ResetNotice>> {
    let coarse = key.modifiers.contains(KeyModifiers::SHIFT);
    let notice = match key.code {
        KeyCode::Up => {
            ui.move_selection(-1);
            None
        }
        KeyCode::Down => {
            ui.move_selection(1);
            None
        }
        KeyCode::Left => adjust(session, ui, -1, coarse),
        KeyCode::Right => adjust(session, ui, 1, coarse),
        KeyCode::Enter | KeyCode::Char(' ') => activate(session, ui),
        KeyCode::Esc => {
            ui.focus = Focus::Input;
            None
        }
        _ => return None,
    };
    Some(notice)
}

fn handle_stop_editor(ui: &mut UiState, session: &mut Session, key: KeyEvent) -> KeyOutcome {
    match key.code {
        KeyCode::Enter => {
            if let Some(stop) = ui.commit_stop_edit() {
                session.tune(|panel| panel.set_stop_sequence(stop));
            }
        }
        KeyCode::Esc => ui.cancel_stop_edit(),
        _ => {
            if let Some(editor) = ui.stop_editor.as_mut() {
                editor.input(TAInput::from(key));
            }
        }
    }
    KeyOutcome::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{ParameterPanel, MODELS};
    use crate::ui::sidebar::ParameterField;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(ui: &mut UiState, session: &mut Session, code: KeyCode) -> KeyOutcome {
        handle_key(ui, session, key(code), 10, Instant::now())
    }

    fn type_text(ui: &mut UiState, session: &mut Session, text: &str) {
        for ch in text.chars() {
            press(ui, session, KeyCode::Char(ch));
        }
    }

    fn setup() -> (UiState, Session) {
        (UiState::new(), Session::new(ParameterPanel::new()))
    }

    #[test]
    fn enter_submits_typed_text() {
        let (mut ui, mut session) = setup();
        type_text(&mut ui, &mut session, "Hello");
        assert_eq!(
            press(&mut ui, &mut session, KeyCode::Enter),
            KeyOutcome::Submit("Hello".into())
        );
        assert_eq!(ui.input.lines().concat(), "");
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let (mut ui, mut session) = setup();
        type_text(&mut ui, &mut session, "   ");
        assert_eq!(press(&mut ui, &mut session, KeyCode::Enter), KeyOutcome::Handled);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let (mut ui, mut session) = setup();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            handle_key(&mut ui, &mut session, ctrl_c, 10, Instant::now()),
            KeyOutcome::Quit
        );
        ui.begin_stop_edit("");
        assert_eq!(
            handle_key(&mut ui, &mut session, ctrl_c, 10, Instant::now()),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn sidebar_model_change_shows_toast() {
        let (mut ui, mut session) = setup();
        ui.status_error = Some("old failure".into());
        press(&mut ui, &mut session, KeyCode::Tab);
        assert_eq!(ui.focus, Focus::Sidebar);

        press(&mut ui, &mut session, KeyCode::Right);
        assert_eq!(session.params().model, MODELS[1]);
        assert!(ui.status_error.is_none());
        assert_eq!(
            ui.toast(Instant::now()),
            Some("Model selected: llama-3.3-70b-versatile")
        );

        press(&mut ui, &mut session, KeyCode::BackTab);
        assert_eq!(ui.focus, Focus::Input);
    }

    #[test]
    fn shift_arrows_take_coarse_steps() {
        let (mut ui, mut session) = setup();
        ui.focus = Focus::Sidebar;
        press(&mut ui, &mut session, KeyCode::Down);
        assert_eq!(ui.selected_field(), ParameterField::Temperature);

        let shift_left = KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT);
        handle_key(&mut ui, &mut session, shift_left, 10, Instant::now());
        assert_eq!(session.params().temperature, 0.5);
        press(&mut ui, &mut session, KeyCode::Right);
        assert_eq!(session.params().temperature, 0.6);
    }

    #[test]
    fn stop_sequence_editing() {
        let (mut ui, mut session) = setup();
        ui.focus = Focus::Sidebar;
        ui.toggle_advanced();
        while ui.selected_field() != ParameterField::StopSequence {
            ui.move_selection(1);
        }

        press(&mut ui, &mut session, KeyCode::Enter);
        assert!(ui.stop_editor.is_some());
        type_text(&mut ui, &mut session, "END");
        assert_eq!(session.params().stop(), None);
        press(&mut ui, &mut session, KeyCode::Enter);
        assert_eq!(session.params().stop(), Some("END"));

        press(&mut ui, &mut session, KeyCode::Enter);
        press(&mut ui, &mut session, KeyCode::Backspace);
        press(&mut ui, &mut session, KeyCode::Esc);
        assert_eq!(session.params().stop(), Some("END"));
        assert!(ui.stop_editor.is_none());
    }

    #[test]
    fn multi_line_paste_stays_in_one_message() {
        let (mut ui, mut session) = setup();
        assert_eq!(
            handle_paste(&mut ui, "first line\r\nsecond\tline\n"),
            KeyOutcome::Handled
        );
        assert_eq!(ui.input.lines().join("|"), "first line|second    line|");

        press(&mut ui, &mut session, KeyCode::Backspace);
        assert_eq!(
            press(&mut ui, &mut session, KeyCode::Enter),
            KeyOutcome::Submit("first line\nsecond    line".into())
        );
    }

    #[test]
    fn paste_goes_to_open_stop_editor_on_one_line() {
        let (mut ui, mut session) = setup();
        ui.focus = Focus::Sidebar;
        assert_eq!(handle_paste(&mut ui, "ignored"), KeyOutcome::Ignored);

        ui.begin_stop_edit("");
        handle_paste(&mut ui, "THE\nEND");
        press(&mut ui, &mut session, KeyCode::Enter);
        assert_eq!(session.params().stop(), Some("THEEND"));
        assert_eq!(ui.input.lines().concat(), "");
    }

    #[test]
    fn page_keys_scroll_transcript() {
        let (mut ui, mut session) = setup();
        press(&mut ui, &mut session, KeyCode::PageUp);
        press(&mut ui, &mut session, KeyCode::PageUp);
        assert_eq!(ui.scroll_from_bottom, 20);
        press(&mut ui, &mut session, KeyCode::PageDown);
        assert_eq!(ui.scroll_from_bottom, 10);
    }
}
