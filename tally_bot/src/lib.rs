#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TALLY_BOT_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod config;
pub mod handlers;
pub mod repl;
pub mod store;

// Re-exports for convenience
pub use config::BotConfig;
pub use handlers::{DispatchError, built_in_aspects, built_in_commands, dispatch};
pub use repl::{answer_query, run_repl};
pub use store::{CampaignRecord, CampaignStore, JsonFileStore, MemoryStore, StoreError};
