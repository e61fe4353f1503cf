//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that feeds submissions to the
//!   [`crate::core::controller::ConversationController`].
//! - [`renderer`], [`transcript`] and [`sidebar`]: frame composition.
//! - [`state`]: focus, input buffers, scroll and toasts.
//!
//! Ownership boundary: this layer presents and captures interaction state,
//! while [`crate::core`] owns the conversation and the parameters.

pub mod chat_loop;
pub mod renderer;
pub mod sidebar;
pub mod state;
pub mod transcript;
