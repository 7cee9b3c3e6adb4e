use serde::{Deserialize, Serialize};

use crate::game::Session;
use crate::player::{initials, Player};

/// One row of the scoreboard.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub initials: String,
    pub color: String,
    pub score: u32,
    pub active: bool,
}

impl ScoreEntry {
    fn from_player(player: &Player, active: bool) -> Self {
        Self {
            name: player.name.clone(),
            initials: initials(&player.name),
            color: player.color.clone(),
            score: player.score,
            active,
        }
    }

    /// `"N pairs"` caption shown under the name.
    pub fn caption(&self) -> String {
        format!("{} pairs", self.score)
    }
}

/// Short-lived "whose turn" banner.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TurnAnnouncement {
    pub player: usize,
    pub name: String,
    pub initials: String,
    pub color: String,
}

impl TurnAnnouncement {
    pub fn for_player(session: &Session, player: usize) -> Option<Self> {
        session.players().get(player).map(|p| Self {
            player,
            name: p.name.clone(),
            initials: initials(&p.name),
            color: p.color.clone(),
        })
    }

    pub fn text(&self) -> String {
        format!("{}'s turn", self.name)
    }
}

/// Retained scoreboard model. [`Scoreboard::sync`] rewrites rows in place, so
/// syncing the same session twice leaves an identical board.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry>,
    turn_indicator: Option<String>,
    active: Option<usize>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn turn_indicator(&self) -> Option<&str> {
        self.turn_indicator.as_deref()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Reflects `session` and reports whether the active player changed since
    /// the previous sync.
    pub fn sync(&mut self, session: &Session) -> bool {
        let current = session.current_player();
        let players = session.players();

        self.entries.truncate(players.len());
        for (i, player) in players.iter().enumerate() {
            let fresh = ScoreEntry::from_player(player, i == current);
            match self.entries.get_mut(i) {
                Some(entry) => *entry = fresh,
                None => self.entries.push(fresh),
            }
        }

        self.turn_indicator = players.get(current).map(|p| format!("{}'s turn", p.name));
        let changed = self.active != Some(current);
        self.active = Some(current);
        changed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.turn_indicator = None;
        self.active = None;
    }

    /// CSS-style theme hook for the active seat, `player-1` for the first player.
    pub fn theme_class(&self) -> Option<String> {
        self.active.map(|i| format!("player-{}", i + 1))
    }
}
