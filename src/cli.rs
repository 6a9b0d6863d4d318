use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "tournament rating ledger")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the rating server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Replay every match from the baseline and rewrite all ratings
    Recalculate {
        /// Only replay matches of this group
        #[arg(short, long)]
        group: Option<i64>,
    },
    /// Show the current state of one player
    Player {
        /// Player id
        id: i64,
    },
    /// List a player's matches in chronological order
    Matches {
        /// Player id
        #[arg(short, long)]
        player: i64,
    },
}
