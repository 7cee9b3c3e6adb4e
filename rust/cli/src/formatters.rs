//! Board, scoreboard and outcome formatters for terminal display.
//!
//! Every formatter is a pure function returning text, so `play` and `deal`
//! share one rendering of the grid. Cells are four columns wide: a hidden
//! card shows its 1-based position (`[ 3]`), a face-up card its symbol
//! (`[🍎]`) and a vacant slot is blank.
//!
//! ```rust
//! use memora_engine::deck::Deck;
//! use memora_engine::rules::Difficulty;
//! use memora_cli::formatters::format_board;
//!
//! let cards = Deck::new_with_seed(1).deal(Difficulty::Easy);
//! let board = format_board(&cards, Difficulty::Easy);
//! assert_eq!(board.lines().count(), 4);
//! assert!(board.starts_with("[ 1] [ 2]"));
//! ```

use memora_engine::cards::{Card, CardState};
use memora_engine::outcome::Outcome;
use memora_engine::rules::Difficulty;
use memora_engine::scoreboard::Scoreboard;

fn cell(card: &Card) -> String {
    match card.state {
        CardState::Hidden => format!("[{:>2}]", card.position + 1),
        CardState::Flipped | CardState::MatchedPending => format!("[{}]", card.value.glyph()),
        CardState::Vacant => "    ".to_string(),
    }
}

fn grid<F>(cards: &[Card], difficulty: Difficulty, render: F) -> String
where
    F: Fn(&Card) -> String,
{
    let (cols, _) = difficulty.grid();
    cards
        .chunks(cols.max(1))
        .map(|row| {
            row.iter()
                .map(&render)
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The board as a player sees it.
pub fn format_board(cards: &[Card], difficulty: Difficulty) -> String {
    grid(cards, difficulty, cell)
}

/// Every card face up regardless of state.
pub fn format_face_up(cards: &[Card], difficulty: Difficulty) -> String {
    grid(cards, difficulty, |card| format!("[{}]", card.value.glyph()))
}

/// One line per player; the active player is marked with `>`.
///
/// ```rust
/// # use memora_cli::formatters::format_scoreboard;
/// use memora_engine::scoreboard::Scoreboard;
///
/// assert!(format_scoreboard(&Scoreboard::new()).is_empty());
/// ```
pub fn format_scoreboard(board: &Scoreboard) -> Vec<String> {
    board
        .entries()
        .iter()
        .map(|e| {
            let marker = if e.active { '>' } else { ' ' };
            format!("{} {:<2} {:<16} {}", marker, e.initials, e.name, e.caption())
        })
        .collect()
}

pub fn format_outcome(outcome: &Outcome) -> Vec<String> {
    let mut lines = vec![outcome.headline()];
    lines.extend(outcome.details().into_iter().map(|d| format!("  {}", d)));
    lines
}
