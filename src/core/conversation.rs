use crate::core::message::Turn;

/// Notice produced by [`ConversationStore::reset`], shown to the user as a
/// transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetNotice {
    pub model: String,
}

impl ResetNotice {
    pub fn message(&self) -> String {
        format!("Model selected: {}", self.model)
    }
}

/// Ordered transcript of the running session.
///
/// The store does not police role alternation; keeping user and assistant
/// turns paired is the controller's job.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn reset(&mut self, model: &str) -> ResetNotice {
        tracing::debug!(cleared = self.turns.len(), model, "conversation reset");
        self.turns.clear();
        ResetNotice {
            model: model.to_string(),
        }
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
