//! Deal command handler: prints one freshly dealt board face up.

use crate::error::CliError;
use crate::formatters::format_face_up;
use memora_engine::deck::Deck;
use memora_engine::rules::Difficulty;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct DealtCard {
    position: usize,
    symbol: &'static str,
}

#[derive(Serialize)]
struct DealReport {
    seed: u64,
    difficulty: Difficulty,
    columns: usize,
    rows: usize,
    cards: Vec<DealtCard>,
}

/// Deals a board for `difficulty` and writes it to `out`, as a grid or as JSON.
///
/// The same seed always prints the same board.
pub fn handle_deal_command(
    difficulty: Difficulty,
    seed: Option<u64>,
    json: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let seed = seed.unwrap_or_else(rand::random);
    let cards = Deck::new_with_seed(seed).deal(difficulty);
    let (columns, rows) = difficulty.grid();

    if json {
        let report = DealReport {
            seed,
            difficulty,
            columns,
            rows,
            cards: cards
                .iter()
                .map(|c| DealtCard {
                    position: c.position,
                    symbol: c.value.glyph(),
                })
                .collect(),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(
        out,
        "deal: difficulty={} seed={} grid={}x{} pairs={}",
        difficulty,
        seed,
        columns,
        rows,
        difficulty.pair_count()
    )?;
    writeln!(out, "{}", format_face_up(&cards, difficulty))?;
    Ok(())
}
