use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::session::{ChatBackend, ChatSession};

pub const PROMPT: &str = "You: ";
pub const EXIT_COMMAND: &str = "exit";

const LABEL: &str = "Chatbot:";
const READY_MESSAGE: &str = "Chatbot is ready! Type 'exit' to quit.";
const FAREWELL: &str = "Goodbye!";
const FALLBACK: &str = "Sorry, I couldn't understand your request.";

pub async fn run_repl<B, R, W>(
    session: &mut ChatSession<B>,
    mut input: R,
    output: &mut W,
) -> Result<()>
where
    B: ChatBackend,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{READY_MESSAGE}").context("Failed to write to stdout")?;

    loop {
        write!(output, "{PROMPT}").context("Failed to write to stdout")?;
        output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            info!("input closed, ending session");
            writeln!(output).context("Failed to write to stdout")?;
            break;
        }

        let prompt = strip_line_ending(&line);
        if prompt.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let written = match session.send_message(prompt).await {
            Ok(reply) => match reply.text() {
                Some(text) => writeln!(output, "{LABEL} {text}"),
                None => writeln!(output, "{LABEL} {FALLBACK}"),
            },
            Err(err) => {
                warn!(error = %err, "chat turn failed");
                writeln!(output, "{LABEL} An error occurred: {err}")
            }
        };
        written.context("Failed to write to stdout")?;
    }

    writeln!(output, "{LABEL} {FAREWELL}").context("Failed to write to stdout")?;
    Ok(())
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
