use serde::{Deserialize, Serialize};

use crate::errors::GameError;

/// Avatar backgrounds handed out to players. Colors are unique within a roster
/// as long as it has no more players than the palette has entries.
pub const PALETTE: [&str; 10] = [
    "linear-gradient(135deg,#6ea8ff,#a17bff)",
    "linear-gradient(135deg,#FFD36B,#FF7AB6)",
    "linear-gradient(135deg,#7EE787,#66D3FF)",
    "linear-gradient(135deg,#FFB86B,#FF6B9E)",
    "linear-gradient(135deg,#C6A0FF,#8FE3FF)",
    "linear-gradient(135deg,#F78DA7,#FFD36B)",
    "linear-gradient(135deg,#90EE90,#32CDFF)",
    "linear-gradient(135deg,#FF9F9F,#FFCF6B)",
    "linear-gradient(135deg,#A0E7FF,#B38DFF)",
    "linear-gradient(135deg,#FFD2E0,#CFE9FF)",
];

/// A seat in the current round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Display name in Title Case
    pub name: String,
    /// Entry from [`PALETTE`]
    pub color: String,
    /// Pairs matched this round
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            score: 0,
        }
    }

    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

/// Validated names and colors for a fixed number of players.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Collects one name per seat.
    ///
    /// Entries beyond `raw_names` or left blank become `"Player N"`. Names must be
    /// unique ignoring case; on success they are converted to Title Case and each
    /// player receives a palette color derived from the name as typed.
    ///
    /// # Errors
    ///
    /// [`GameError::DuplicateNames`] when two names collide ignoring case.
    ///
    /// # Examples
    ///
    /// ```
    /// use memora_engine::player::Roster;
    /// use memora_engine::errors::GameError;
    ///
    /// let roster = Roster::collect(2, &["ada lovelace", ""]).unwrap();
    /// assert_eq!(roster.names(), vec!["Ada Lovelace", "Player 2"]);
    ///
    /// let err = Roster::collect(2, &["Alice", "alice"]).unwrap_err();
    /// assert_eq!(err, GameError::DuplicateNames { names: vec!["alice".into()] });
    /// ```
    pub fn collect<S: AsRef<str>>(count: usize, raw_names: &[S]) -> Result<Roster, GameError> {
        let names: Vec<String> = (0..count)
            .map(|i| {
                let raw = raw_names.get(i).map(|s| s.as_ref().trim()).unwrap_or("");
                if raw.is_empty() {
                    default_name(i)
                } else {
                    raw.to_string()
                }
            })
            .collect();

        let duplicates = duplicate_names(&names);
        if !duplicates.is_empty() {
            return Err(GameError::DuplicateNames { names: duplicates });
        }

        let colors = assign_colors(&names);
        let players = names
            .iter()
            .zip(colors)
            .map(|(name, color)| Player::new(title_case(name), color))
            .collect();
        Ok(Roster { players })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }
}

pub fn default_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

/// Lowercases, collapses whitespace and capitalises the first letter of each word.
///
/// ```
/// use memora_engine::player::title_case;
///
/// assert_eq!(title_case("  mARY   jane "), "Mary Jane");
/// ```
pub fn title_case(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Up to two leading letters of the display name, `"?"` when there are none.
pub fn initials(name: &str) -> String {
    let letters: String = title_case(name)
        .split(' ')
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// 32-bit string hash over UTF-16 code units (`h = h * 31 + unit`, wrapping),
/// folded to its absolute value.
pub fn hash_name(name: &str) -> u32 {
    let h = name
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    h.unsigned_abs()
}

/// Picks a palette color for each name by linear probing from `hash_name(name)`.
/// When every slot is taken, seat `i` falls back to `PALETTE[i % len]`.
pub fn assign_colors<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut used = [false; PALETTE.len()];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let base = hash_name(name.as_ref()) as usize % PALETTE.len();
            let pick = (0..PALETTE.len())
                .map(|offset| (base + offset) % PALETTE.len())
                .find(|&slot| !used[slot]);
            match pick {
                Some(slot) => {
                    used[slot] = true;
                    PALETTE[slot].to_string()
                }
                None => PALETTE[i % PALETTE.len()].to_string(),
            }
        })
        .collect()
}

fn duplicate_names(names: &[String]) -> Vec<String> {
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let mut dupes: Vec<String> = Vec::new();
    for (i, name) in lower.iter().enumerate() {
        let first = lower.iter().position(|other| other == name);
        if first != Some(i) && !dupes.contains(name) {
            dupes.push(name.clone());
        }
    }
    dupes
}
