//! Configuration command handler.
//!
//! Prints the resolved configuration with the source of each value
//! (default, file or environment).
//!
//! # Example Output
//!
//! ```json
//! {
//!   "players": {
//!     "value": 2,
//!     "source": "default"
//!   },
//!   "difficulty": {
//!     "value": "medium",
//!     "source": "env"
//!   },
//!   ...
//! }
//! ```

use crate::config::{self, ConfigResolved};
use crate::error::CliError;
use std::io::Write;

pub fn handle_cfg_command(
    resolved: Result<ConfigResolved, config::ConfigError>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let resolved =
        resolved.map_err(|e| CliError::Config(format!("Invalid configuration: {}", e)))?;

    let ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "players": {
            "value": config.players,
            "source": sources.players,
        },
        "difficulty": {
            "value": config.difficulty,
            "source": sources.difficulty,
        },
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "names": {
            "value": config.names,
            "source": sources.names,
        }
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&display)?)?;
    Ok(())
}
