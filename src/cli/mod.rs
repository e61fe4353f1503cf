//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, resolves startup settings
//! (flags over config file over built-in defaults) and dispatches to the
//! chat UI or one of the headless commands.

pub mod auth;
pub mod models;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::models::list_models;
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::controller::{ConversationController, Session};
use crate::core::credentials::{tolerate_outage, CredentialStore};
use crate::core::gateway::HttpGateway;
use crate::core::params::{ParameterPanel, ParameterSnapshot, MODELS};
use crate::logging::init_file_logging;
use crate::ui::chat_loop::run_chat;

#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(version, about = "A terminal chatbot playground for Groq-hosted models")]
#[command(
    long_about = "Chatbot Playground is a full-screen terminal chat client for models hosted \
on Groq's OpenAI-compatible API. Pick a model and tune sampling parameters in the sidebar; \
switching models starts a fresh conversation.\n\n\
Authentication:\n\
  GROQ_API_KEY      API key (takes precedence over the keyring)\n\
  playground auth   Store the key in the system keyring\n\n\
Controls:\n\
  Enter             Send the message (chat) or toggle the control (sidebar)\n\
  Alt+Enter         Insert a newline\n\
  Tab / Shift+Tab   Move between the chat input and the parameter sidebar\n\
  Up/Down           Select a parameter\n\
  Left/Right        Adjust it (hold Shift for bigger steps)\n\
  PgUp/PgDn/Mouse   Scroll the conversation\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to start with
    #[arg(short = 'm', long, global = true, value_parser = PossibleValuesParser::new(MODELS))]
    pub model: Option<String>,

    /// API root, e.g. https://api.groq.com/openai/v1
    #[arg(short = 'b', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and print the reply without starting the UI
    Say {
        /// Wait for the whole reply instead of streaming it
        #[arg(long)]
        no_stream: bool,
        /// Ask for a JSON-formatted reply
        #[arg(long)]
        json: bool,
        /// The prompt; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        prompt: Vec<String>,
    },
    /// List the selectable models
    Models,
    /// Store the API key in the system keyring
    Auth,
    /// Remove the API key from the system keyring
    Deauth,
    /// Print the effective configuration
    Config,
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log {
        init_file_logging(path)?;
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            let controller = build_controller(&config, args.model, args.base_url, |_| {})?;
            run_chat(controller).await
        }
        Commands::Say {
            no_stream,
            json,
            prompt,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                eprintln!("Usage: playground say <prompt>");
                std::process::exit(1);
            }
            let config = Config::load()?;
            let mut controller = build_controller(&config, args.model, args.base_url, |seed| {
                if no_stream {
                    seed.streaming = false;
                }
                if json {
                    seed.json_mode = true;
                }
            })?;
            if let Err(e) = run_say(&mut controller, &prompt).await {
                eprintln!("\n❌ Error: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Models => {
            let config = Config::load()?;
            list_models(&config, &mut std::io::stdout().lock())?;
            Ok(())
        }
        Commands::Auth => {
            let store = CredentialStore::new();
            if let Err(e) = run_auth(&store, &mut std::io::stdin().lock()) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            let store = CredentialStore::new();
            if let Err(e) = run_deauth(&store) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            config.print_all(&Config::config_path()?);
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let value = value.join(" ");
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            if let Err(e) = config.unset_value(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

/// Resolve startup parameters: config file values, then command-line flags,
/// then `adjust` for per-command overrides.
pub fn startup_parameters<F>(config: &Config, model: Option<String>, adjust: F) -> ParameterSnapshot
where
    F: FnOnce(&mut ParameterSnapshot),
{
    let mut seed = config.parameter_seed();
    if let Some(model) = model {
        seed.model = model;
    }
    adjust(&mut seed);
    seed
}

fn build_controller<F>(
    config: &Config,
    model: Option<String>,
    base_url: Option<String>,
    adjust: F,
) -> Result<ConversationController<HttpGateway>, Box<dyn Error>>
where
    F: FnOnce(&mut ParameterSnapshot),
{
    let seed = startup_parameters(config, model, adjust);
    let base_url = base_url.unwrap_or_else(|| config.base_url().to_string());

    let api_key = tolerate_outage(CredentialStore::new().resolve())?;

    info!(model = %seed.model, base_url = %base_url, "starting session");
    let gateway = HttpGateway::new(base_url, api_key)?;
    let session = Session::new(ParameterPanel::seeded(seed));
    Ok(ConversationController::new(session, gateway))
}

#[cfg(test)]
mod tests;
