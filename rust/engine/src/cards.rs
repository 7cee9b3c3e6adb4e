use serde::{Deserialize, Serialize};
use std::fmt;

/// Face glyphs available for card faces. A board of `n` pairs draws `n`
/// distinct entries from this alphabet.
pub const ALPHABET: [&str; 42] = [
    "🍎", "🍌", "🍓", "🍇", "🍉", "🍒", "🍋", "🥝", "🍑", "🍍", "🥥", "🍐", "🍊", "🥭", "🍈", "🍠",
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🐔",
    "🦄", "🐝", "🐙", "🐬", "🦖", "🦋", "🦅", "🦉", "🌵", "🍄",
];

/// A face value, stored as an index into [`ALPHABET`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Symbol(u8);

impl Symbol {
    /// Returns `None` when `index` is outside the alphabet.
    pub fn new(index: usize) -> Option<Symbol> {
        if index < ALPHABET.len() {
            Some(Symbol(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn glyph(self) -> &'static str {
        ALPHABET[self.index()]
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Every symbol of the alphabet in declaration order.
pub fn all_symbols() -> Vec<Symbol> {
    (0..ALPHABET.len()).map(|i| Symbol(i as u8)).collect()
}

/// Visibility state of a card on the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    /// Face down and selectable
    Hidden,
    /// Face up, part of the current selection or awaiting a mismatch flip-back
    Flipped,
    /// Confirmed match playing its removal animation
    MatchedPending,
    /// Removed from play for the rest of the round
    Vacant,
}

/// A single card on the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Face value shared with exactly one other card
    pub value: Symbol,
    /// Index on the board, stable for the round
    pub position: usize,
    pub state: CardState,
}

impl Card {
    pub fn new(value: Symbol, position: usize) -> Self {
        Self {
            value,
            position,
            state: CardState::Hidden,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.state == CardState::Hidden
    }
}
