//! Command handlers and the built-in registries.
//!
//! Handlers are invoked by the transport layer after a successful parse; the
//! evaluator itself never reaches the store. Each handler is a function of
//! the query metadata plus whatever its action's [`ArgShape`] declares, and
//! returns a [`Response`] for the transport to deliver.

use log::{info, warn};
use thiserror::Error;

use tally_core::{
    Action, Aspect, AspectRegistry, Command, CommandRegistry, ParseResult, QueryMetadata, RegistryError, Response,
    ValueKind,
};

use crate::config::BotConfig;
use crate::store::{CampaignStore, StoreError};

pub const GREETING: &str =
    "I am Tally. I keep track of party gold, XP, and loot. Type `help` to see what I can do.";
pub const DENIAL: &str = "Nice try...";

/// Failures between a successful parse and a delivered response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The matched command requires an aspect the query did not supply.
    #[error("command '{0}' requires an aspect")]
    MissingAspect(String),
    /// The matched command requires a numeric value the query did not supply.
    #[error("command '{0}' requires a numeric value")]
    MissingValue(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The bot's command set, in the order `help` lists them.
///
/// # Errors
/// Returns a [`RegistryError`] if the built-in set is misconfigured.
pub fn built_in_commands() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    registry.register(Command::new("default", "", Action::Greet))?;
    registry.register(Command::new("help", "retrieves help info", Action::Help))?;
    registry.register(Command::new("add", "adds a given value to a given aspect", Action::Add))?;
    registry.register(Command::new(
        "current",
        "shows the current value of a given aspect",
        Action::Current,
    ))?;
    Ok(registry)
}

/// The trackable campaign aspects, each writable only by the game master.
///
/// # Errors
/// Returns a [`RegistryError`] if the built-in set is misconfigured.
pub fn built_in_aspects(config: &BotConfig) -> Result<AspectRegistry, RegistryError> {
    let gm = vec![config.game_master.clone()];
    let mut registry = AspectRegistry::new();
    registry.register(Aspect::new(
        "gold",
        "the party's shared gold total",
        ValueKind::Integer,
        gm.clone(),
    ))?;
    registry.register(Aspect::new(
        "xp",
        "experience points earned by the party",
        ValueKind::Integer,
        gm.clone(),
    ))?;
    registry.register(Aspect::new(
        "loot",
        "count of unassigned loot items",
        ValueKind::Integer,
        gm,
    ))?;
    Ok(registry)
}

/// Route a parsed query to its command's handler.
///
/// The `ArgShape` check happens here, before any handler body runs, so a
/// handler never sees a parse result missing the arguments its action
/// declared.
///
/// # Errors
/// See [`DispatchError`].
pub fn dispatch(
    parsed: &ParseResult<'_>,
    metadata: &QueryMetadata,
    commands: &CommandRegistry,
    store: &dyn CampaignStore,
) -> Result<Response, DispatchError> {
    match parsed.command.action {
        Action::Greet => Ok(greet_handler(metadata)),
        Action::Help => Ok(help_handler(metadata, commands)),
        Action::Add => {
            let aspect = require_aspect(parsed)?;
            let value = require_value(parsed)?;
            add_handler(metadata, aspect, value, store)
        },
        Action::Current => {
            let aspect = require_aspect(parsed)?;
            current_handler(metadata, aspect, store)
        },
    }
}

fn require_aspect<'r>(parsed: &ParseResult<'r>) -> Result<&'r Aspect, DispatchError> {
    parsed
        .aspect
        .ok_or_else(|| DispatchError::MissingAspect(parsed.command.name.clone()))
}

fn require_value(parsed: &ParseResult<'_>) -> Result<i64, DispatchError> {
    parsed
        .value
        .ok_or_else(|| DispatchError::MissingValue(parsed.command.name.clone()))
}

fn greet_handler(metadata: &QueryMetadata) -> Response {
    info!("default response triggered by user {}", metadata.user_id);
    Response::ephemeral(GREETING)
}

/// Auto-generates the help message from each registered command's help line.
/// The `default` greeting is deliberately left out of the listing.
fn help_handler(metadata: &QueryMetadata, commands: &CommandRegistry) -> Response {
    info!("'help' invoked by user {}", metadata.user_id);
    let mut text = String::new();
    for command in commands.iter().filter(|command| command.action != Action::Greet) {
        text.push_str(&command.help_line());
        text.push('\n');
    }
    Response::ephemeral(text)
}

/// Add `value` to `aspect` in the shared record.
///
/// Authorization is checked before the store is touched at all; a denied
/// request produces no read and no write. The read-modify-write itself is
/// unguarded against concurrent writers (see the store module).
fn add_handler(
    metadata: &QueryMetadata,
    aspect: &Aspect,
    value: i64,
    store: &dyn CampaignStore,
) -> Result<Response, DispatchError> {
    info!("'add' invoked on {} by {}", aspect.name, metadata.user_id);
    if !aspect.allows(&metadata.user_id) {
        warn!(
            "unauthorized user {} attempted to add to aspect {}",
            metadata.user_id, aspect.name
        );
        return Ok(Response::ephemeral(DENIAL));
    }

    let mut record = store.fetch_campaign_record()?;
    let new_value = record.get(&aspect.name).saturating_add(value);
    record.set(aspect.name.clone(), new_value);
    store.put_campaign_record(&record)?;

    info!("updated {} to {new_value}", aspect.name);
    Ok(Response::channel(format!("Updated {} to {new_value}", aspect.name)))
}

/// Report the current value of `aspect` to the invoking user only.
fn current_handler(
    metadata: &QueryMetadata,
    aspect: &Aspect,
    store: &dyn CampaignStore,
) -> Result<Response, DispatchError> {
    info!("'current' invoked on {} by {}", aspect.name, metadata.user_id);
    let record = store.fetch_campaign_record()?;
    let value = record.get(&aspect.name);
    Ok(Response::ephemeral(format!("{} is currently {value}", aspect.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CampaignRecord, MemoryStore};
    use std::path::PathBuf;
    use tally_core::ResponseType;

    fn test_config() -> BotConfig {
        BotConfig {
            game_master: "gm".to_string(),
            user_id: "gm".to_string(),
            data_dir: PathBuf::from("."),
        }
    }

    fn seeded_store(gold: i64) -> MemoryStore {
        let mut record = CampaignRecord::new();
        record.set("gold", gold);
        MemoryStore::with_record(record)
    }

    fn parsed<'r>(
        commands: &'r CommandRegistry,
        aspects: &'r AspectRegistry,
        command: &str,
        aspect: Option<&str>,
        value: Option<i64>,
    ) -> ParseResult<'r> {
        ParseResult {
            command: commands.get(command).unwrap(),
            aspect: aspect.map(|name| aspects.get(name).unwrap()),
            value,
        }
    }

    #[test]
    fn greet_returns_static_ephemeral_message() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = MemoryStore::empty();

        let query = parsed(&commands, &aspects, "default", None, None);
        let response = dispatch(&query, &QueryMetadata::new("anyone"), &commands, &store).unwrap();
        assert_eq!(response, Response::ephemeral(GREETING));
    }

    #[test]
    fn help_lists_one_line_per_command_except_default() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = MemoryStore::empty();

        let query = parsed(&commands, &aspects, "help", None, None);
        let response = dispatch(&query, &QueryMetadata::new("anyone"), &commands, &store).unwrap();

        assert_eq!(response.response_type, ResponseType::Ephemeral);
        let lines: Vec<&str> = response.text.lines().collect();
        assert_eq!(lines.len(), commands.len() - 1);
        assert!(lines[0].starts_with("`help`"));
        assert!(lines[1].starts_with("`add`"));
        assert!(lines[2].starts_with("`current`"));
    }

    #[test]
    fn add_updates_the_record_for_an_authorized_user() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(10);

        let query = parsed(&commands, &aspects, "add", Some("gold"), Some(5));
        let response = dispatch(&query, &QueryMetadata::new("gm"), &commands, &store).unwrap();

        assert_eq!(response.response_type, ResponseType::Channel);
        assert!(response.text.contains("15"));
        assert_eq!(store.fetch_campaign_record().unwrap().get("gold"), 15);
    }

    #[test]
    fn add_denies_unauthorized_users_without_touching_the_store() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(10);

        for delta in [5, -500, i64::MAX] {
            let query = parsed(&commands, &aspects, "add", Some("gold"), Some(delta));
            let response = dispatch(&query, &QueryMetadata::new("rogue"), &commands, &store).unwrap();
            assert_eq!(response, Response::ephemeral(DENIAL));
        }
        assert_eq!(store.fetch_campaign_record().unwrap().get("gold"), 10);
    }

    #[test]
    fn add_accepts_negative_deltas_from_the_game_master() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(10);

        let query = parsed(&commands, &aspects, "add", Some("gold"), Some(-4));
        let response = dispatch(&query, &QueryMetadata::new("gm"), &commands, &store).unwrap();
        assert!(response.text.contains('6'));
        assert_eq!(store.fetch_campaign_record().unwrap().get("gold"), 6);
    }

    #[test]
    fn add_without_aspect_is_a_shape_error() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(10);

        let query = parsed(&commands, &aspects, "add", None, Some(5));
        let err = dispatch(&query, &QueryMetadata::new("gm"), &commands, &store).unwrap_err();
        assert!(matches!(err, DispatchError::MissingAspect(name) if name == "add"));
    }

    #[test]
    fn add_without_value_is_a_shape_error() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(10);

        let query = parsed(&commands, &aspects, "add", Some("gold"), None);
        let err = dispatch(&query, &QueryMetadata::new("gm"), &commands, &store).unwrap_err();
        assert!(matches!(err, DispatchError::MissingValue(name) if name == "add"));
    }

    #[test]
    fn add_surfaces_store_invariant_violations() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = MemoryStore::empty();

        let query = parsed(&commands, &aspects, "add", Some("gold"), Some(5));
        let err = dispatch(&query, &QueryMetadata::new("gm"), &commands, &store).unwrap_err();
        assert!(matches!(err, DispatchError::Store(StoreError::RecordNotFound)));
    }

    #[test]
    fn current_reports_the_value_ephemerally() {
        let commands = built_in_commands().unwrap();
        let aspects = built_in_aspects(&test_config()).unwrap();
        let store = seeded_store(42);

        let query = parsed(&commands, &aspects, "current", Some("gold"), None);
        let response = dispatch(&query, &QueryMetadata::new("rogue"), &commands, &store).unwrap();
        assert_eq!(response, Response::ephemeral("gold is currently 42"));
    }

    #[test]
    fn built_in_registries_construct_cleanly() {
        assert_eq!(built_in_commands().unwrap().len(), 4);
        assert_eq!(built_in_aspects(&test_config()).unwrap().len(), 3);
    }
}
