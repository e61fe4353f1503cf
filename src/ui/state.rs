//! View-only state: what has focus, the input buffers, scroll position and
//! transient notices. Nothing here is sent to the API.

use std::time::{Duration, Instant};

use tui_textarea::TextArea;

use crate::ui::sidebar::{visible_fields, ParameterField};

pub const INPUT_PLACEHOLDER: &str = "Type your message...";
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Toast {
    message: String,
    expires_at: Instant,
}

pub struct UiState {
    pub input: TextArea<'static>,
    pub focus: Focus,
    selected: usize,
    pub advanced_expanded: bool,
    /// Present while the stop sequence is being edited.
    pub stop_editor: Option<TextArea<'static>>,
    /// Lines scrolled up from the newest content; 0 follows the tail.
    pub scroll_from_bottom: u16,
    toast: Option<Toast>,
    pub status_error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            input: new_input(),
            focus: Focus::Input,
            selected: 0,
            advanced_expanded: false,
            stop_editor: None,
            scroll_from_bottom: 0,
            toast: None,
            status_error: None,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Sidebar,
            Focus::Sidebar => Focus::Input,
        };
    }

    pub fn selected_field(&self) -> ParameterField {
        let fields = visible_fields(self.advanced_expanded);
        fields[self.selected.min(fields.len() - 1)]
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = visible_fields(self.advanced_expanded).len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub fn toggle_advanced(&mut self) {
        self.advanced_expanded = !self.advanced_expanded;
        let len = visible_fields(self.advanced_expanded).len();
        self.selected = self.selected.min(len - 1);
    }

    /// Take the typed message and clear the input box.
    pub fn take_input(&mut self) -> String {
        let text = self.input.lines().join("\n");
        self.input = new_input();
        text
    }

    pub fn begin_stop_edit(&mut self, current: &str) {
        let mut editor = TextArea::new(vec![current.to_string()]);
        editor.move_cursor(tui_textarea::CursorMove::End);
        self.stop_editor = Some(editor);
    }

    /// Finish editing and return the new stop sequence, if editing was active.
    pub fn commit_stop_edit(&mut self) -> Option<String> {
        self.stop_editor
            .take()
            .map(|editor| editor.lines().concat())
    }

    pub fn cancel_stop_edit(&mut self) {
        self.stop_editor = None;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        });
    }

    pub fn toast(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|toast| now < toast.expires_at)
            .map(|toast| toast.message.as_str())
    }

    /// Drop an expired toast. Returns true when a redraw is needed.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn clamp_scroll(&mut self, max_scroll: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_scroll);
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_placeholder_text(INPUT_PLACEHOLDER);
    input
}
