//! Query parsing: tokenizer and evaluator.
//!
//! A single master pattern is built from the registered command and aspect
//! names plus numeric and whitespace rules, in strict priority order
//! (command > aspect > number > whitespace). The tokenizer walks the input
//! lazily against that pattern; the evaluator reduces the resulting token
//! stream to a [`ParseResult`] for the transport layer to dispatch.
//!
//! Any stretch of input the pattern cannot classify is surfaced as a
//! `Mismatch` token rather than skipped, so malformed queries fail loudly
//! instead of being silently accepted.

use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::aspect::Aspect;
use crate::command::Command;
use crate::registry::{AspectRegistry, CommandRegistry};

/// Classification of one tokenized substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Cmd,
    Aspect,
    Num,
    Ws,
    Mismatch,
}

/// A classified substring of the raw query, with its byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
}

/// The master pattern could not be compiled from the registries.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to compile master pattern: {0}")]
    Compile(#[from] regex::Error),
}

/// Ways a query can fail to evaluate. None of these are retried; the
/// transport layer turns them into user-facing messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The query was tokenizable but contained no command word.
    #[error("no command found in query")]
    NoCommandFound,
    /// Part of the query matched no registered literal, number, or whitespace.
    #[error("unrecognized input '{text}' at offset {offset}")]
    MismatchedInput { text: String, offset: usize },
    /// A token matched the command group but missed registry lookup.
    /// Indicates a registry/pattern desync; should not occur.
    #[error("token '{0}' matched the command pattern but is not registered")]
    UnknownCommand(String),
    /// A token matched the aspect group but missed registry lookup.
    #[error("token '{0}' matched the aspect pattern but is not registered")]
    UnknownAspect(String),
    /// A digit run too large to represent as an `i64`.
    #[error("numeric value '{0}' is out of range")]
    ValueOutOfRange(String),
}

/// Resolved output of one parse: the matched command plus whatever aspect
/// and value the query supplied. Borrowed from the registries; constructed
/// once per parse and handed to the dispatcher by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<'r> {
    pub command: &'r Command,
    pub aspect: Option<&'r Aspect>,
    pub value: Option<i64>,
}

/// Lazy token stream over one query string.
///
/// Each call to [`QueryEvaluator::tokenize`] produces a fresh stream; no
/// state crosses calls, and callers may stop consuming early.
pub struct Tokens<'p, 't> {
    pattern: &'p Regex,
    input: &'t str,
    pos: usize,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.input.len() {
            return None;
        }

        // Nothing classifiable remains: emit the rest as one mismatch.
        let Some(caps) = self.pattern.captures_at(self.input, self.pos) else {
            let token = Token {
                kind: TokenKind::Mismatch,
                text: self.input[self.pos..].to_string(),
                start: self.pos,
            };
            self.pos = self.input.len();
            return Some(token);
        };

        let whole = caps.get(0)?;

        // A gap before the next match is unclassifiable input. Emit it and
        // leave `pos` at the match start; the next call re-matches there.
        if whole.start() > self.pos {
            let token = Token {
                kind: TokenKind::Mismatch,
                text: self.input[self.pos..whole.start()].to_string(),
                start: self.pos,
            };
            self.pos = whole.start();
            return Some(token);
        }

        // Priority order is fixed by the pattern: CMD > ASPECT > NUM > WS.
        let kind = if caps.name("CMD").is_some() {
            TokenKind::Cmd
        } else if caps.name("ASPECT").is_some() {
            TokenKind::Aspect
        } else if caps.name("NUM").is_some() {
            TokenKind::Num
        } else {
            TokenKind::Ws
        };

        let token = Token {
            kind,
            text: whole.as_str().to_string(),
            start: whole.start(),
        };
        self.pos = whole.end();
        Some(token)
    }
}

/// Build the combined pattern from both registries: each registered name as a
/// whole-word literal, then digit runs, then whitespace runs.
fn master_pattern(commands: &CommandRegistry, aspects: &AspectRegistry) -> Result<Regex, PatternError> {
    let mut alternatives = Vec::new();
    if let Some(group) = literal_group("CMD", commands.names()) {
        alternatives.push(group);
    }
    if let Some(group) = literal_group("ASPECT", aspects.names()) {
        alternatives.push(group);
    }
    alternatives.push(r"(?P<NUM>\d+)".to_string());
    alternatives.push(r"(?P<WS>\s+)".to_string());
    Ok(Regex::new(&alternatives.join("|"))?)
}

/// Render one named group of `\b`-delimited literal alternatives.
/// Returns `None` for an empty registry; an empty group would match the
/// empty string and stall the tokenizer.
fn literal_group<'n>(group: &str, names: impl Iterator<Item = &'n str>) -> Option<String> {
    let literals: Vec<String> = names.map(|name| format!(r"\b{}\b", regex::escape(name))).collect();
    if literals.is_empty() {
        None
    } else {
        Some(format!("(?P<{group}>{})", literals.join("|")))
    }
}

/// Evaluates raw queries against a pair of registries.
///
/// Compiles the master pattern once at construction; since registries are
/// immutable after startup, the pattern can never drift out of sync with
/// them. Holds no per-query state, so repeated parses of the same input
/// yield structurally equal results.
pub struct QueryEvaluator<'r> {
    commands: &'r CommandRegistry,
    aspects: &'r AspectRegistry,
    master: Regex,
}

impl<'r> QueryEvaluator<'r> {
    /// Build an evaluator over the given registries.
    ///
    /// # Errors
    /// Returns [`PatternError`] if the master pattern fails to compile.
    pub fn new(commands: &'r CommandRegistry, aspects: &'r AspectRegistry) -> Result<Self, PatternError> {
        let master = master_pattern(commands, aspects)?;
        Ok(Self { commands, aspects, master })
    }

    /// The compiled master pattern, mostly useful for diagnostics.
    pub fn master_pattern(&self) -> &Regex {
        &self.master
    }

    /// Lazily tokenize `input` against the master pattern.
    pub fn tokenize<'t>(&self, input: &'t str) -> Tokens<'_, 't> {
        Tokens {
            pattern: &self.master,
            input,
            pos: 0,
        }
    }

    /// Reduce `input` to a [`ParseResult`].
    ///
    /// Whitespace tokens are discarded. The first command, aspect, and number
    /// tokens win; later tokens of an already-seen kind are deliberately
    /// ignored rather than rejected. A query with no command word at all, or
    /// with any unclassifiable stretch, fails.
    ///
    /// # Errors
    /// See [`ParseError`] for the failure taxonomy.
    pub fn parse(&self, input: &str) -> Result<ParseResult<'r>, ParseError> {
        let mut command = None;
        let mut aspect = None;
        let mut value = None;

        for token in self.tokenize(input) {
            match token.kind {
                TokenKind::Ws => {},
                TokenKind::Mismatch => {
                    return Err(ParseError::MismatchedInput {
                        text: token.text,
                        offset: token.start,
                    });
                },
                TokenKind::Cmd if command.is_none() => {
                    command = Some(self.lookup_command(&token)?);
                },
                TokenKind::Aspect if aspect.is_none() => {
                    aspect = Some(self.lookup_aspect(&token)?);
                },
                TokenKind::Num if value.is_none() => {
                    let parsed = token
                        .text
                        .parse::<i64>()
                        .map_err(|_| ParseError::ValueOutOfRange(token.text.clone()))?;
                    value = Some(parsed);
                },
                // First occurrence of each kind already taken.
                TokenKind::Cmd | TokenKind::Aspect | TokenKind::Num => {},
            }
        }

        let command = command.ok_or(ParseError::NoCommandFound)?;
        debug!(
            "parsed query into command '{}' (aspect: {:?}, value: {:?})",
            command.name,
            aspect.map(|a| a.name.as_str()),
            value
        );
        Ok(ParseResult { command, aspect, value })
    }

    /// Resolve a `Cmd` token to its registered command. A miss here means
    /// the pattern and registry disagree, which the construction rules are
    /// supposed to make impossible.
    fn lookup_command(&self, token: &Token) -> Result<&'r Command, ParseError> {
        self.commands
            .get(&token.text)
            .ok_or_else(|| ParseError::UnknownCommand(token.text.clone()))
    }

    fn lookup_aspect(&self, token: &Token) -> Result<&'r Aspect, ParseError> {
        self.aspects
            .get(&token.text)
            .ok_or_else(|| ParseError::UnknownAspect(token.text.clone()))
    }
}
