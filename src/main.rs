use anyhow::Result;

use tournament_rating::cli::Command;
use tournament_rating::{
    handle_matches, handle_player, handle_recalculate, handle_serve, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Recalculate { group } => handle_recalculate(*group),
        Command::Player { id } => handle_player(*id),
        Command::Matches { player } => handle_matches(*player),
    }
}
