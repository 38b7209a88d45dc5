//! Command module
//!
//! Describes the actions a query can invoke. Handlers are tagged variants
//! rather than stored callables, so the argument shape each one requires is
//! known when a `Command` is constructed instead of discovered at dispatch.

/// The parse-result shape an action requires from the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// No aspect or value (e.g. `help`).
    None,
    /// An aspect but no value (e.g. `current gold`).
    Aspect,
    /// Both an aspect and a numeric value (e.g. `add gold 50`).
    AspectAndValue,
}

/// Built-in bot actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Greet,
    Help,
    Add,
    Current,
}

impl Action {
    /// The argument shape this action expects from a parsed query.
    pub fn arg_shape(self) -> ArgShape {
        match self {
            Action::Greet | Action::Help => ArgShape::None,
            Action::Current => ArgShape::Aspect,
            Action::Add => ArgShape::AspectAndValue,
        }
    }
}

/// A named, invokable action. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub help_info: String,
    pub action: Action,
}

impl Command {
    pub fn new(name: impl Into<String>, help_info: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            help_info: help_info.into(),
            action,
        }
    }

    /// Render this command's line in the `help` listing.
    pub fn help_line(&self) -> String {
        format!("`{}`: {}.", self.name, self.help_info)
    }

    pub fn requires_aspect(&self) -> bool {
        self.action.arg_shape() != ArgShape::None
    }
}
