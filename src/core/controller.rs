//! Drives one user submission through the completion gateway.
//!
//! The controller owns the [`Session`] (transcript plus parameters) and
//! reports every visible change through an `on_change` callback so the view
//! can redraw from a [`ViewState`] without holding any state of its own.

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::conversation::{ConversationStore, ResetNotice};
use crate::core::gateway::{ChatError, Completion, CompletionGateway};
use crate::core::message::Turn;
use crate::core::params::{ParameterPanel, ParameterSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Waiting for input.
    Idle,
    /// Request sent, nothing received yet.
    Requesting,
    /// Reply text is arriving or has arrived.
    Rendering,
}

/// Per-session context: the transcript and the parameter panel. Model
/// changes always go through here so the transcript reset cannot be skipped.
#[derive(Debug, Clone, Default)]
pub struct Session {
    store: ConversationStore,
    panel: ParameterPanel,
}

impl Session {
    pub fn new(panel: ParameterPanel) -> Self {
        Self {
            store: ConversationStore::new(),
            panel,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn panel(&self) -> &ParameterPanel {
        &self.panel
    }

    pub fn params(&self) -> &ParameterSnapshot {
        self.panel.snapshot()
    }

    pub fn select_model(&mut self, model: &str) -> Option<ResetNotice> {
        self.tune(|panel| {
            panel.select_model(model);
        })
    }

    pub fn cycle_model(&mut self, delta: isize) -> Option<ResetNotice> {
        self.tune(|panel| {
            panel.cycle_model(delta);
        })
    }

    /// Apply an edit to the panel. If the edit changed the model the
    /// transcript is cleared before this returns.
    pub fn tune<F>(&mut self, edit: F) -> Option<ResetNotice>
    where
        F: FnOnce(&mut ParameterPanel),
    {
        let before = self.panel.model().to_string();
        edit(&mut self.panel);
        if self.panel.model() == before {
            return None;
        }
        debug!(from = %before, to = %self.panel.model(), "model changed");
        Some(self.store.reset(self.panel.model()))
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub turns: &'a [Turn],
    pub params: &'a ParameterSnapshot,
    pub state: ExchangeState,
    /// Assistant text accumulated so far while an exchange is in flight.
    pub pending: Option<&'a str>,
}

pub struct ConversationController<G> {
    session: Session,
    gateway: G,
    state: ExchangeState,
    pending: String,
}

impl<G: CompletionGateway> ConversationController<G> {
    pub fn new(session: Session, gateway: G) -> Self {
        Self {
            session,
            gateway,
            state: ExchangeState::Idle,
            pending: String::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            turns: self.session.store.all(),
            params: self.session.panel.snapshot(),
            state: self.state,
            pending: (self.state != ExchangeState::Idle).then_some(self.pending.as_str()),
        }
    }

    /// Run one exchange. Whitespace-only input is ignored and yields
    /// `Ok(None)`. On success the new assistant turn is returned.
    ///
    /// The user turn is appended before the request goes out and stays in
    /// the transcript even when the exchange fails; partial streamed text is
    /// discarded on failure.
    pub async fn submit<F>(&mut self, input: &str, mut on_change: F) -> Result<Option<&Turn>, ChatError>
    where
        F: FnMut(ViewState<'_>),
    {
        if input.trim().is_empty() {
            return Ok(None);
        }

        self.session.store.append(Turn::user(input));
        self.pending.clear();
        self.transition(ExchangeState::Requesting);
        on_change(self.view());

        let params = self.session.panel.snapshot().clone();
        let outcome = self.exchange(&params, &mut on_change).await;

        let result = match outcome {
            Ok(reply) => {
                self.session.store.append(Turn::assistant(reply));
                Ok(())
            }
            Err(err) => {
                warn!(kind = ?err.kind(), "exchange failed: {err}");
                Err(err)
            }
        };

        self.pending.clear();
        self.transition(ExchangeState::Idle);
        on_change(self.view());

        result.map(|()| self.session.store.all().last())
    }

    async fn exchange<F>(
        &mut self,
        params: &ParameterSnapshot,
        on_change: &mut F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(ViewState<'_>),
    {
        let completion = self
            .gateway
            .complete(self.session.store.all(), params)
            .await?;

        match completion {
            Completion::Text(text) => {
                self.pending = text;
                self.transition(ExchangeState::Rendering);
                on_change(self.view());
            }
            Completion::Stream(mut fragments) => {
                while let Some(fragment) = fragments.next().await {
                    self.pending.push_str(&fragment?);
                    self.transition(ExchangeState::Rendering);
                    on_change(self.view());
                }
                // An empty stream still produces an (empty) reply.
                self.transition(ExchangeState::Rendering);
            }
        }

        Ok(std::mem::take(&mut self.pending))
    }

    fn transition(&mut self, next: ExchangeState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "exchange state");
            self.state = next;
        }
    }
}
