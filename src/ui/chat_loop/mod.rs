//! Main chat event loop.
//!
//! The loop polls terminal input, routes keys through [`keybindings`], and
//! redraws when something changed. Submitting hands control to the
//! [`ConversationController`], which redraws through its `on_change`
//! callback until the exchange is back to idle.

pub mod keybindings;
pub mod lifecycle;

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::backend::Backend;
use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use ratatui::Terminal;
use tracing::info;

use crate::core::controller::{ConversationController, ViewState};
use crate::core::gateway::{ChatError, CompletionGateway};
use crate::ui::renderer::{ui, RenderMetrics};
use crate::ui::state::UiState;

use self::keybindings::{handle_key, handle_paste, KeyOutcome};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MOUSE_SCROLL_LINES: u16 = 3;

pub async fn run_chat<G: CompletionGateway>(
    mut controller: ConversationController<G>,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut controller).await;
    restore_terminal(&mut terminal)?;
    info!(
        turns = controller.session().store().len(),
        "chat session ended"
    );
    result
}

async fn event_loop<G: CompletionGateway>(
    terminal: &mut ChatTerminal,
    controller: &mut ConversationController<G>,
) -> Result<(), Box<dyn Error>> {
    let mut state = UiState::new();
    let mut metrics = RenderMetrics::default();
    let mut dirty = true;

    loop {
        if state.expire_toast(Instant::now()) {
            dirty = true;
        }

        if dirty {
            let view = controller.view();
            terminal.draw(|f| metrics = ui(f, &view, &state))?;
            state.clamp_scroll(metrics.max_scroll);
            dirty = false;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let outcome = handle_key(
                    &mut state,
                    controller.session_mut(),
                    key,
                    metrics.page_height,
                    Instant::now(),
                );
                match outcome {
                    KeyOutcome::Quit => return Ok(()),
                    KeyOutcome::Submit(text) => {
                        submit(terminal, controller, &mut state, &text).await?;
                    }
                    KeyOutcome::Handled => {}
                    KeyOutcome::Ignored => continue,
                }
                dirty = true;
            }
            Event::Mouse(mouse) => {
                match mouse.kind {
                    MouseEventKind::ScrollUp => state.scroll_up(MOUSE_SCROLL_LINES),
                    MouseEventKind::ScrollDown => state.scroll_down(MOUSE_SCROLL_LINES),
                    _ => continue,
                }
                dirty = true;
            }
            Event::Paste(text) => {
                if handle_paste(&mut state, &text) == KeyOutcome::Ignored {
                    continue;
                }
                dirty = true;
            }
            Event::Resize(..) => dirty = true,
            _ => {}
        }
    }
}

/// Run one exchange, redrawing on every change. A failed exchange ends up in
/// the status line; a failed draw aborts the loop.
async fn submit<B: Backend, G: CompletionGateway>(
    terminal: &mut Terminal<B>,
    controller: &mut ConversationController<G>,
    state: &mut UiState,
    text: &str,
) -> io::Result<()> {
    let shown: &UiState = state;
    let failure = run_exchange(controller, text, |view| {
        terminal.draw(|f| {
            ui(f, view, shown);
        })?;
        Ok(())
    })
    .await?;

    state.status_error = failure.map(|err| err.to_string());
    Ok(())
}

/// Drive the controller, calling `redraw` on each change. After the first
/// redraw error no further frames are attempted and the error wins.
async fn run_exchange<G, D>(
    controller: &mut ConversationController<G>,
    text: &str,
    mut redraw: D,
) -> io::Result<Option<ChatError>>
where
    G: CompletionGateway,
    D: FnMut(&ViewState<'_>) -> io::Result<()>,
{
    let mut draw_error = None;
    let outcome = controller
        .submit(text, |view| {
            if draw_error.is_some() {
                return;
            }
            if let Err(err) = redraw(&view) {
                draw_error = Some(err);
            }
        })
        .await;

    if let Some(err) = draw_error {
        return Err(err);
    }
    Ok(outcome.err())
}
