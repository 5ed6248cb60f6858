//! # Operator Loop
//!
//! Reads commands from stdin and prints replies, while background search
//! results arrive on their channel.
//!
//! ```text
//! loop {
//!     select! {
//!         line    = stdin   ──► app.handle_line ──► print reply
//!         outcome = search  ──► app.apply_search ──► print if still current
//!     }
//! }
//! ```

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::app::{App, Flow};
use crate::commands::product::SearchOutcome;
use crate::error::AppResult;
use crate::router::Route;

const PROMPT: &str = "farma> ";

/// Runs until `quit` or end of input.
pub async fn run(
    mut app: App,
    mut searches: UnboundedReceiver<SearchOutcome>,
    initial: Route,
) -> AppResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    emit(&app.start(initial).await)?;
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                let reply = app.handle_line(&line).await;
                emit(&reply.text)?;
                if reply.flow == Flow::Quit {
                    break;
                }
                prompt()?;
            }
            Some(outcome) = searches.recv() => {
                if let Some(text) = app.apply_search(outcome) {
                    emit(&format!("\n{text}"))?;
                    prompt()?;
                }
            }
        }
    }

    info!("Terminal closed");
    Ok(())
}

fn emit(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

fn prompt() -> std::io::Result<()> {
    emit(PROMPT)
}
