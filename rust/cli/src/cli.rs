//! Command-line argument definitions.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "memora",
    version,
    about = "Memora memory-matching game CLI",
    disable_help_subcommand = true
)]
pub struct MemoraCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a hot-seat round in the terminal
    Play {
        /// Number of players; unusable counts fall back to 2
        #[arg(long)]
        players: Option<String>,
        /// easy, medium or hard; anything else plays medium
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        /// Player name, repeat once per seat
        #[arg(long = "name")]
        names: Vec<String>,
    },
    /// Print a face-up board for inspection
    Deal {
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        /// Emit JSON instead of a grid
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved configuration and where each value came from
    Cfg,
}
