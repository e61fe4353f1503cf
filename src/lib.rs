//! Chatbot Playground is a terminal chat client for models hosted on Groq's
//! OpenAI-compatible API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation, the parameter panel, the completion
//!   gateway and the controller that drives one exchange at a time.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`cli`] parses arguments and dispatches to the UI or a headless command.
//! - [`api`] defines the chat-completion payloads sent over the wire.
//! - [`logging`] installs file-based tracing output on request.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
