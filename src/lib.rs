pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod rating;
pub mod services;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::domain::ReplayScope;
use crate::services::ledger::RatingLedger;
use crate::services::server::ServerService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_recalculate(group: Option<i64>) -> Result<()> {
    let ledger = open_ledger()?;
    let summary = ledger.recalculate(ReplayScope::from_group(group))?;
    info!(
        "Replayed {} matches, reset {} players",
        summary.matches_replayed, summary.players_reset
    );
    Ok(())
}

pub fn handle_player(id: i64) -> Result<()> {
    let ledger = open_ledger()?;
    let player = ledger.player(id)?;
    println!("{}", serde_json::to_string_pretty(&player)?);
    Ok(())
}

pub fn handle_matches(player_id: i64) -> Result<()> {
    let ledger = open_ledger()?;
    let records = ledger.player_matches(player_id)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn open_ledger() -> Result<RatingLedger> {
    let config = AppConfig::new();
    let pool = database::create_pool(&config.server.database_path)?;
    Ok(RatingLedger::open(pool, config.rating)?)
}
