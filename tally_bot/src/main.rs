#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Tally **
//! Chat-command bot for tracking shared tabletop campaign aspects.

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use tally_bot::config::BotConfig;
use tally_bot::handlers::{built_in_aspects, built_in_commands};
use tally_bot::repl::run_repl;
use tally_bot::store::{CampaignRecord, CampaignStore, JsonFileStore};
use tally_core::QueryMetadata;

fn main() -> Result<()> {
    env_logger::init();
    let config = BotConfig::from_env().context("while reading bot configuration")?;
    info!("configuration loaded; game master is {}", config.game_master);

    // registries are fixed at startup; a bad entry stops the process here
    let commands = built_in_commands().context("while registering commands")?;
    let aspects = built_in_aspects(&config).context("while registering aspects")?;

    let store = JsonFileStore::new(config.record_path());
    let mut seed = CampaignRecord::new();
    for aspect in aspects.iter() {
        seed.set(aspect.name.clone(), 0);
    }
    store.ensure_record(&seed).context("while preparing the campaign record")?;
    let record = store.fetch_campaign_record().context("while loading the campaign record")?;

    println!("{}", "TALLY: THE PARTY LEDGER".bright_yellow().underline());
    for (name, value) in record.iter() {
        println!("  {name}: {value}");
    }
    println!();

    let metadata = QueryMetadata::new(config.user_id.clone());
    info!("starting REPL for user {}", metadata.user_id);
    run_repl(&commands, &aspects, &store, &metadata)
}
