//! Console front end for the CLI.
//!
//! Reads one command per line and writes the result of each, optionally
//! with the derivation trace or as JSON.

use std::io::{BufRead, Write};

use crate::dispatch::{Assistant, Outcome, Response};
use crate::error::{HearthError, Result};
use crate::services::ThreadTimer;

/// Words that end an interactive session.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

/// How results are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplOptions {
    /// Print the derivation trace after each result
    pub trace: bool,
    /// Print one JSON object per command instead of text
    pub json: bool,
}

/// Handle a single command and write its result.
pub fn run_once<W: Write>(
    assistant: &Assistant,
    options: ReplOptions,
    command: &str,
    output: &mut W,
) -> Result<Response> {
    let response = assistant.handle(command);
    write_out(output, &render_response(&response, options)?)?;
    Ok(response)
}

/// Handle a single command, then keep the process alive until any reminder
/// it scheduled on `timer` has fired.
pub fn run_once_and_wait<W: Write>(
    assistant: &Assistant,
    options: ReplOptions,
    command: &str,
    output: &mut W,
    timer: &ThreadTimer,
) -> Result<Response> {
    let response = run_once(assistant, options, command, output)?;
    if let Outcome::Scheduled { .. } = response.outcome {
        if !options.json {
            write_out(output, "Waiting for pending reminders (Ctrl-C to abandon)...\n")?;
        }
        timer.wait_until_idle();
    }
    Ok(response)
}

/// Read commands from `input` until EOF or an exit word.
///
/// Returns the number of commands handled.
pub fn run_interactive<R: BufRead, W: Write>(
    assistant: &Assistant,
    options: ReplOptions,
    input: R,
    mut output: W,
) -> Result<usize> {
    if !options.json {
        write_out(&mut output, &banner())?;
    }

    let mut handled = 0;
    for line in input.lines() {
        let line = line.map_err(console_error)?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&command.to_lowercase().as_str()) {
            break;
        }
        run_once(assistant, options, command, &mut output)?;
        handled += 1;
    }

    if !options.json {
        write_out(&mut output, "Goodbye.\n")?;
    }
    Ok(handled)
}

/// Render a response as text or JSON.
pub fn render_response(response: &Response, options: ReplOptions) -> Result<String> {
    if options.json {
        let mut line = serde_json::to_string(response)?;
        line.push('\n');
        return Ok(line);
    }

    let mut out = String::new();
    out.push_str(&format!("> {}\n", response.command));
    out.push_str(&format!(
        "  grammar: {}\n",
        if response.accepted { "accepted" } else { "rejected" }
    ));
    out.push_str(&format!("  {}\n", response.outcome));
    if let Some(hint) = hint(response) {
        out.push_str(&format!("  hint: {}\n", hint));
    }

    if options.trace {
        out.push_str("  trace:\n");
        for line in response.trace.lines() {
            out.push_str(&format!("    {}\n", line));
        }
    }
    Ok(out)
}

fn hint(response: &Response) -> Option<String> {
    match &response.outcome {
        Outcome::Executed { .. } if !response.accepted => Some(
            "understood, but not in the command grammar; try \"turn on the kitchen fan\"".to_string(),
        ),
        Outcome::Executed { .. } => None,
        Outcome::Scheduled { at, reminder, .. } => Some(format!(
            "reminder {} will fire at {}",
            reminder,
            at.format("%H:%M on %Y-%m-%d")
        )),
        Outcome::Rejected(err) => Some(match err {
            HearthError::UnresolvedDevice { device } => {
                format!("say which room the {} is in, e.g. \"in the kitchen\"", device)
            }
            HearthError::UnknownDevice { name } => format!("there is no device called '{}'", name),
            HearthError::AmbiguousTimeExpression { .. } => {
                "give a time like \"at 3 pm\", \"tomorrow at 9 am\" or \"after 2 hours\"".to_string()
            }
            HearthError::GrammarMismatch {
                consumed, length, ..
            } => format!(
                "the grammar stopped after {} of {} words; run with --trace to see why",
                consumed, length
            ),
            _ => "commands look like \"turn off the bedroom heater\" or \"remind me to read the book at 8 pm\"".to_string(),
        }),
    }
}

fn banner() -> String {
    [
        "Hearth smart home assistant",
        "",
        "  Devices:   turn on the living room lights",
        "             switch off the heater in bedroom",
        "  Reminders: remind me to take medicine at 3 pm",
        "             schedule a water the plants after 2 hours",
        "",
        "Type 'exit' to quit.",
        "",
    ]
    .join("\n")
}

fn write_out<W: Write>(output: &mut W, text: &str) -> Result<()> {
    output
        .write_all(text.as_bytes())
        .and_then(|_| output.flush())
        .map_err(console_error)
}

fn console_error(err: std::io::Error) -> HearthError {
    HearthError::ConsoleError {
        message: err.to_string(),
    }
}
