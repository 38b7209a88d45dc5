//! Registries for commands and aspects.
//!
//! Both registries are built once at process start and never mutated after.
//! Every entry name becomes a literal alternative in the tokenizer's master
//! pattern, so names are validated here, at registration, before any query is
//! ever parsed. A bad entry keeps the process from starting.

use thiserror::Error;

use crate::aspect::Aspect;
use crate::command::Command;

/// A registry entry that cannot be accepted. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate registry entry '{0}'")]
    DuplicateName(String),
    #[error("'{0}' is not a bare identifier (ASCII letter, then letters, digits, or '_')")]
    InvalidName(String),
}

/// Entry names must be safe to embed as `\b`-delimited literals in the
/// master pattern: a letter followed by word characters, no whitespace.
fn validate_name(name: &str) -> Result<(), RegistryError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}

/// Ordered collection of registered commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, rejecting unsafe or colliding names.
    ///
    /// # Errors
    /// - [`RegistryError::InvalidName`] if the name is not a bare identifier.
    /// - [`RegistryError::DuplicateName`] if the name is already registered.
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        validate_name(&command.name)?;
        if self.get(&command.name).is_some() {
            return Err(RegistryError::DuplicateName(command.name));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.name == name)
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Ordered collection of registered aspects.
#[derive(Debug, Default)]
pub struct AspectRegistry {
    aspects: Vec<Aspect>,
}

impl AspectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an aspect, rejecting unsafe or colliding names.
    ///
    /// # Errors
    /// - [`RegistryError::InvalidName`] if the name is not a bare identifier.
    /// - [`RegistryError::DuplicateName`] if the name is already registered.
    pub fn register(&mut self, aspect: Aspect) -> Result<(), RegistryError> {
        validate_name(&aspect.name)?;
        if self.get(&aspect.name).is_some() {
            return Err(RegistryError::DuplicateName(aspect.name));
        }
        self.aspects.push(aspect);
        Ok(())
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&Aspect> {
        self.aspects.iter().find(|aspect| aspect.name == name)
    }

    /// Aspects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Aspect> {
        self.aspects.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.aspects.iter().map(|aspect| aspect.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::ValueKind;
    use crate::command::Action;

    #[test]
    fn command_registration_preserves_order() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("help", "", Action::Help)).unwrap();
        registry.register(Command::new("add", "", Action::Add)).unwrap();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["help", "add"]);
    }

    #[test]
    fn duplicate_command_name_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("add", "", Action::Add)).unwrap();

        let err = registry.register(Command::new("add", "", Action::Current)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("add".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_with_whitespace_are_rejected() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(Command::new("add gold", "", Action::Add)).unwrap_err();
        assert_eq!(err, RegistryError::InvalidName("add gold".to_string()));
    }

    #[test]
    fn names_must_start_with_a_letter() {
        let mut registry = AspectRegistry::new();
        let err = registry
            .register(Aspect::new("9lives", "", ValueKind::Integer, Vec::new()))
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidName("9lives".to_string()));
    }

    #[test]
    fn aspect_lookup_is_exact() {
        let mut registry = AspectRegistry::new();
        registry
            .register(Aspect::new("gold", "party gold", ValueKind::Integer, Vec::new()))
            .unwrap();

        assert!(registry.get("gold").is_some());
        assert!(registry.get("Gold").is_none());
        assert!(registry.get("gol").is_none());
    }

    #[test]
    fn underscored_names_are_accepted() {
        let mut registry = AspectRegistry::new();
        assert!(registry.register(Aspect::new("loot_count", "", ValueKind::Integer, Vec::new())).is_ok());
    }
}
