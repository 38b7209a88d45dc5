//! Environment-sourced configuration for the bot process.
//!
//! Read once at startup and handed to the registries and transport; the
//! parsing core never sees it.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const RECORD_FILE: &str = "campaign.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Privileged identity allowed to mutate campaign aspects.
    pub game_master: String,
    /// Identity attached to queries from this session.
    pub user_id: String,
    /// Directory holding the campaign record file.
    pub data_dir: PathBuf,
}

impl BotConfig {
    /// Build configuration from the environment.
    ///
    /// `GAME_MASTER` is required; without it every aspect would be
    /// unwritable, so startup fails instead. `TALLY_USER` identifies the
    /// invoking user (falls back to `USER`), and `TALLY_DATA_DIR` overrides
    /// the default record location.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingVar`] if `GAME_MASTER` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let game_master = env::var("GAME_MASTER").map_err(|_| ConfigError::MissingVar("GAME_MASTER"))?;
        let user_id = env::var("TALLY_USER")
            .or_else(|_| env::var("USER"))
            .unwrap_or_else(|_| "anonymous".to_string());
        let data_dir = env::var_os("TALLY_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);
        Ok(Self {
            game_master,
            user_id,
            data_dir,
        })
    }

    /// Full path of the campaign record file.
    pub fn record_path(&self) -> PathBuf {
        self.data_dir.join(RECORD_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::data_local_dir)
        .map_or_else(|| PathBuf::from("."), |base| base.join("tally_bot"))
}
