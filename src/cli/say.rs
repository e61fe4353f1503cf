//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::controller::ConversationController;
use crate::core::gateway::CompletionGateway;

pub async fn run_say<G: CompletionGateway>(
    controller: &mut ConversationController<G>,
    prompt: &str,
) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_reply(controller, prompt, &mut out).await
}

/// Send `prompt` and copy the reply to `out` as it grows, ending with a
/// newline once the exchange completes.
pub async fn write_reply<G, W>(
    controller: &mut ConversationController<G>,
    prompt: &str,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    G: CompletionGateway,
    W: Write,
{
    let mut printed = 0;
    let mut write_error = None;

    let result = controller
        .submit(prompt, |view| {
            let Some(pending) = view.pending else {
                return;
            };
            if write_error.is_some() || pending.len() <= printed {
                return;
            }
            let delta = &pending[printed..];
            if let Err(err) = out.write_all(delta.as_bytes()).and_then(|()| out.flush()) {
                write_error = Some(err);
            }
            printed = pending.len();
        })
        .await;

    if let Some(err) = write_error {
        return Err(err.into());
    }
    result?;
    writeln!(out)?;
    Ok(())
}
