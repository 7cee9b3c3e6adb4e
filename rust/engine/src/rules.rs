use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Player count used when the requested count is missing or unusable.
pub const DEFAULT_PLAYERS: usize = 2;

/// Largest seat count accepted; one seat per pair on the hard board.
pub const MAX_PLAYERS: usize = 24;

/// How long a matched pair stays face up before its removal animation starts.
pub const MATCH_REVEAL_DELAY: Duration = Duration::from_millis(600);

/// Length of the removal animation before a matched pair becomes vacant.
pub const MATCH_CLEAR_DELAY: Duration = Duration::from_millis(350);

/// How long a mismatched pair stays face up before flipping back.
pub const MISMATCH_HIDE_DELAY: Duration = Duration::from_millis(800);

/// Board size selector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 4x4 grid, 8 pairs
    Easy,
    /// 6x5 grid, 15 pairs
    #[default]
    Medium,
    /// 8x6 grid, 24 pairs
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Grid dimensions as `(columns, rows)`.
    pub fn grid(self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (4, 4),
            Difficulty::Medium => (6, 5),
            Difficulty::Hard => (8, 6),
        }
    }

    pub fn pair_count(self) -> usize {
        let (cols, rows) = self.grid();
        cols * rows / 2
    }

    pub fn card_count(self) -> usize {
        self.pair_count() * 2
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parses a difficulty name, falling back to [`Difficulty::Medium`] for
    /// anything unrecognized.
    ///
    /// ```
    /// use memora_engine::rules::Difficulty;
    ///
    /// assert_eq!(Difficulty::parse_or_default("Hard"), Difficulty::Hard);
    /// assert_eq!(Difficulty::parse_or_default("nightmare"), Difficulty::Medium);
    /// ```
    pub fn parse_or_default(input: &str) -> Difficulty {
        match input.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::default(),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a player count the way a number input field is read: the leading
/// integer is taken, and anything that does not yield a count in
/// `1..=MAX_PLAYERS` falls back to [`DEFAULT_PLAYERS`].
///
/// ```
/// use memora_engine::rules::parse_player_count;
///
/// assert_eq!(parse_player_count("3"), 3);
/// assert_eq!(parse_player_count("4 players"), 4);
/// assert_eq!(parse_player_count("0"), 2);
/// assert_eq!(parse_player_count("many"), 2);
/// assert_eq!(parse_player_count("1000000"), 2);
/// ```
pub fn parse_player_count(input: &str) -> usize {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<usize>()
        .map(normalize_player_count)
        .unwrap_or(DEFAULT_PLAYERS)
}

/// Maps a count outside `1..=MAX_PLAYERS` to [`DEFAULT_PLAYERS`].
pub fn normalize_player_count(players: usize) -> usize {
    if (1..=MAX_PLAYERS).contains(&players) {
        players
    } else {
        DEFAULT_PLAYERS
    }
}

/// Settings for one round, already normalized.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundSetup {
    pub players: usize,
    pub difficulty: Difficulty,
}

impl RoundSetup {
    pub fn new(players: usize, difficulty: Difficulty) -> Self {
        Self {
            players: normalize_player_count(players),
            difficulty,
        }
    }

    /// Builds a setup from raw form values, defaulting anything missing or malformed.
    pub fn from_raw(players: Option<&str>, difficulty: Option<&str>) -> Self {
        Self {
            players: players.map(parse_player_count).unwrap_or(DEFAULT_PLAYERS),
            difficulty: difficulty
                .map(Difficulty::parse_or_default)
                .unwrap_or_default(),
        }
    }
}

impl Default for RoundSetup {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYERS, Difficulty::default())
    }
}
