//! # Memora CLI Library
//!
//! Command-line frontend for the memora memory-matching engine.
//!
//! ## Main Entry Point
//!
//! [`run`] parses arguments, resolves configuration and dispatches to the
//! subcommand handler. [`run_with_input`] does the same with an injected stdin,
//! which is how the interactive `play` command is driven from tests.
//!
//! ## Example Usage
//!
//! ```
//! use std::io;
//! let args = vec!["memora", "deal", "--difficulty", "easy", "--seed", "42"];
//! let code = memora_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `play`: Hot-seat round in the terminal
//! - `deal`: Print a face-up board for a seed
//! - `cfg`: Display current configuration settings

use clap::Parser;
use std::io::{BufRead, Write};
pub mod cli;
mod commands;
mod config;
mod error;
pub mod exit_code;
pub mod formatters;
pub mod io_utils;
pub mod ui;
pub mod validation;

use cli::{Commands, MemoraCli};
use commands::{PlayOptions, handle_cfg_command, handle_deal_command, handle_play_command};
use memora_engine::rules::{Difficulty, parse_player_count};

pub use error::CliError;

/// Main entry point for the CLI application, reading interactive input from
/// the process stdin.
///
/// # Returns
///
/// Exit code: `0` for success, `2` for errors, `130` for interruptions
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stdin = std::io::stdin();
    let mut stdin_lock = stdin.lock();
    run_with_input(args, &mut stdin_lock, out, err)
}

/// Like [`run`], with `stdin` supplying interactive input.
///
/// ```
/// use std::io::Cursor;
/// let mut input = Cursor::new("ann\nben\nq\n");
/// let mut out = Vec::new();
/// let mut err = Vec::new();
/// let code = memora_cli::run_with_input(
///     ["memora", "play", "--difficulty", "easy", "--seed", "1"],
///     &mut input,
///     &mut out,
///     &mut err,
/// );
/// assert_eq!(code, 0);
/// assert!(String::from_utf8(out).unwrap().contains("Ann's turn"));
/// ```
pub fn run_with_input<I, S>(
    args: I,
    stdin: &mut dyn BufRead,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const COMMANDS: &[&str] = &["play", "deal", "cfg"];
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match MemoraCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;

            // Help and version go to stdout with a success code
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    let _ = writeln!(err, "{}", e);
                    let _ = writeln!(err, "Memora CLI");
                    let _ = writeln!(err, "Usage: memora <command> [options]\n");
                    let _ = writeln!(err, "Commands:");
                    for c in COMMANDS {
                        let _ = writeln!(err, "  {}", c);
                    }
                    let _ = writeln!(err, "\nFor full help, run: memora --help");
                    exit_code::ERROR
                }
            };
        }
    };

    let result = match cli.cmd {
        Commands::Cfg => handle_cfg_command(config::load_with_sources(), out),
        Commands::Play {
            players,
            difficulty,
            seed,
            names,
        } => match config::load_with_sources() {
            Ok(resolved) => {
                let cfg = resolved.config;
                let opts = PlayOptions {
                    players: players
                        .as_deref()
                        .map(parse_player_count)
                        .unwrap_or(cfg.players),
                    difficulty: difficulty
                        .as_deref()
                        .map(Difficulty::parse_or_default)
                        .unwrap_or(cfg.difficulty),
                    seed: seed.or(cfg.seed).unwrap_or_else(rand::random),
                    names: if names.is_empty() { cfg.names } else { names },
                };
                handle_play_command(opts, out, err, stdin)
            }
            Err(e) => Err(CliError::Config(e.to_string())),
        },
        Commands::Deal {
            difficulty,
            seed,
            json,
        } => match config::load_with_sources() {
            Ok(resolved) => {
                let cfg = resolved.config;
                handle_deal_command(
                    difficulty
                        .as_deref()
                        .map(Difficulty::parse_or_default)
                        .unwrap_or(cfg.difficulty),
                    seed.or(cfg.seed),
                    json,
                    out,
                )
            }
            Err(e) => Err(CliError::Config(e.to_string())),
        },
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(CliError::Interrupted(_)) => exit_code::INTERRUPTED,
        Err(e) => {
            let _ = ui::write_error(err, &e.to_string());
            exit_code::ERROR
        }
    }
}
