//! Command handler modules for the memora CLI.
//!
//! Each subcommand lives in its own file and exposes a
//! `handle_COMMAND_command(...) -> Result<(), CliError>` function. Output
//! streams (and stdin for `play`) are passed in so handlers can be driven
//! from tests with in-memory buffers.

mod cfg;
mod deal;
mod play;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use play::{PlayOptions, handle_play_command};
