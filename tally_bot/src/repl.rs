//! Interactive transport for the bot.
//!
//! Reads raw queries from the terminal, runs them through the evaluator,
//! dispatches the matched command's handler, and renders the response.
//! Every parse or dispatch failure is recovered into an ephemeral message;
//! a malformed query never takes the process down.

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use tally_core::{
    AspectRegistry, CommandRegistry, ParseError, QueryEvaluator, QueryMetadata, Response, ResponseType,
};

use crate::handlers::{DispatchError, dispatch};
use crate::store::CampaignStore;

/// Outcome of reading a line from the REPL input.
enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Run the read-eval-respond loop until the user quits.
///
/// # Errors
/// - Propagates a master-pattern compile failure and unrecoverable input errors.
pub fn run_repl(
    commands: &CommandRegistry,
    aspects: &AspectRegistry,
    store: &dyn CampaignStore,
    metadata: &QueryMetadata,
) -> Result<()> {
    let evaluator = QueryEvaluator::new(commands, aspects).context("while compiling the master pattern")?;
    let mut input_manager = InputManager::new();
    let prompt = format!("[{}]>> ", metadata.user_id).bold().blue().to_string();

    loop {
        let line = match input_manager.read_line(&prompt)? {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("{}", "Query canceled.".dimmed());
                continue;
            },
            InputEvent::Line(line) => line,
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "quit" || query == "exit" {
            break;
        }

        render(&answer_query(&evaluator, query, metadata, commands, store));
    }

    info!("REPL ended for user {}", metadata.user_id);
    Ok(())
}

/// Evaluate one raw query end to end, recovering every failure into a
/// user-facing response.
pub fn answer_query(
    evaluator: &QueryEvaluator<'_>,
    input: &str,
    metadata: &QueryMetadata,
    commands: &CommandRegistry,
    store: &dyn CampaignStore,
) -> Response {
    let parsed = match evaluator.parse(input) {
        Ok(parsed) => parsed,
        Err(err) => return parse_failure_response(&err),
    };
    match dispatch(&parsed, metadata, commands, store) {
        Ok(response) => response,
        Err(err) => dispatch_failure_response(&err),
    }
}

fn parse_failure_response(err: &ParseError) -> Response {
    match err {
        ParseError::NoCommandFound => {
            Response::ephemeral("I didn't understand that. Type `help` to see what I can do.")
        },
        ParseError::MismatchedInput { text, .. } => {
            Response::ephemeral(format!("I don't know what '{text}' means."))
        },
        ParseError::ValueOutOfRange(text) => Response::ephemeral(format!("'{text}' is more than I can count.")),
        ParseError::UnknownCommand(_) | ParseError::UnknownAspect(_) => {
            // registry/pattern desync; log it, never crash on a user query
            warn!("internal query evaluation failure: {err}");
            Response::ephemeral("Something went wrong on my end. Try again?")
        },
    }
}

fn dispatch_failure_response(err: &DispatchError) -> Response {
    match err {
        DispatchError::MissingAspect(name) => {
            Response::ephemeral(format!("`{name}` needs an aspect. Which one do you mean?"))
        },
        DispatchError::MissingValue(name) => Response::ephemeral(format!("`{name}` needs a number.")),
        DispatchError::Store(store_err) => {
            warn!("store failure while handling a query: {store_err}");
            Response::ephemeral("The campaign ledger is unavailable right now.")
        },
    }
}

fn render(response: &Response) {
    match response.response_type {
        ResponseType::Channel => println!("{}", response.text),
        ResponseType::Ephemeral => {
            for line in response.text.lines() {
                println!("{}", format!("(only you) {line}").italic().dimmed());
            }
        },
    }
}

/// Manages the interactive input backend: rustyline when a terminal is
/// available, a plain stdin reader otherwise.
struct InputManager {
    backend: Backend,
}

enum Backend {
    Editor(Box<DefaultEditor>),
    Plain,
}

impl InputManager {
    fn new() -> Self {
        let backend = if io::stdin().is_terminal() {
            match DefaultEditor::new() {
                Ok(editor) => {
                    info!("using rustyline-backed REPL input");
                    Backend::Editor(Box::new(editor))
                },
                Err(err) => {
                    warn!("failed to initialize rustyline ({err}), falling back to basic stdin");
                    Backend::Plain
                },
            }
        } else {
            info!("stdin is not a TTY; using basic input mode");
            Backend::Plain
        };
        Self { backend }
    }

    /// Read a line from the current backend. If the interactive backend
    /// reports an unrecoverable error, switch to plain stdin and retry once.
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.backend_read(prompt) {
            Ok(event) => Ok(event),
            Err(err) => {
                if matches!(self.backend, Backend::Editor(_)) {
                    warn!("rustyline input failed: {err} -- switching to basic stdin");
                    self.backend = Backend::Plain;
                    self.backend_read(prompt)
                } else {
                    Err(err)
                }
            },
        }
    }

    fn backend_read(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match &mut self.backend {
            Backend::Editor(editor) => match editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(err) = editor.add_history_entry(line.as_str()) {
                            warn!("failed to append to history: {err}");
                        }
                    }
                    Ok(InputEvent::Line(line))
                },
                Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
                Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
                Err(ReadlineError::Io(io_err)) => Err(io_err),
                Err(other) => Err(io::Error::other(other)),
            },
            Backend::Plain => {
                print!("{prompt}");
                io::stdout().flush()?;
                let mut buffer = String::new();
                let bytes = io::stdin().read_line(&mut buffer)?;
                if bytes == 0 {
                    return Ok(InputEvent::Eof);
                }
                while buffer.ends_with(['\n', '\r']) {
                    buffer.pop();
                }
                Ok(InputEvent::Line(buffer))
            },
        }
    }
}
