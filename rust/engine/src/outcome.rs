use serde::{Deserialize, Serialize};

use crate::player::{default_name, Player};

/// Final line for one player.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player: usize,
    pub name: String,
    pub score: u32,
}

/// Result of a finished round. Every player sharing the top score is a winner;
/// there is no tie-break.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub standings: Vec<Standing>,
    pub winners: Vec<usize>,
}

impl Outcome {
    pub fn from_players(players: &[Player]) -> Self {
        let standings = players
            .iter()
            .enumerate()
            .map(|(player, p)| Standing {
                player,
                name: p.name.clone(),
                score: p.score,
            })
            .collect();
        Self::from_standings(standings)
    }

    /// Outcome for bare scores, naming seats `"Player N"`.
    ///
    /// ```
    /// use memora_engine::outcome::Outcome;
    ///
    /// let tie = Outcome::from_scores(&[3, 1, 3]);
    /// assert_eq!(tie.winners, vec![0, 2]);
    /// assert!(tie.is_tie());
    ///
    /// let solo = Outcome::from_scores(&[5, 2, 1]);
    /// assert_eq!(solo.winners, vec![0]);
    /// ```
    pub fn from_scores(scores: &[u32]) -> Self {
        let standings = scores
            .iter()
            .enumerate()
            .map(|(player, &score)| Standing {
                player,
                name: default_name(player),
                score,
            })
            .collect();
        Self::from_standings(standings)
    }

    fn from_standings(standings: Vec<Standing>) -> Self {
        let winners = match standings.iter().map(|s| s.score).max() {
            Some(top) => standings
                .iter()
                .filter(|s| s.score == top)
                .map(|s| s.player)
                .collect(),
            None => Vec::new(),
        };
        Self { standings, winners }
    }

    pub fn is_tie(&self) -> bool {
        self.winners.len() > 1
    }

    pub fn top_score(&self) -> Option<u32> {
        self.winners
            .first()
            .and_then(|&w| self.standings.get(w))
            .map(|s| s.score)
    }

    pub fn headline(&self) -> String {
        let names: Vec<&str> = self
            .winners
            .iter()
            .filter_map(|&w| self.standings.get(w))
            .map(|s| s.name.as_str())
            .collect();
        match names.as_slice() {
            [] => "No winner".to_string(),
            [solo] => format!("{solo} wins!"),
            many => format!("It's a tie between {}!", many.join(" & ")),
        }
    }

    /// One `"Name: N pairs"` line per player, in seat order.
    pub fn details(&self) -> Vec<String> {
        self.standings
            .iter()
            .map(|s| format!("{}: {} pairs", s.name, s.score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_way_tie_reports_all_leaders() {
        let outcome = Outcome::from_scores(&[2, 2, 2]);
        assert_eq!(outcome.winners, vec![0, 1, 2]);
        assert_eq!(
            outcome.headline(),
            "It's a tie between Player 1 & Player 2 & Player 3!"
        );
    }

    #[test]
    fn headline_names_sole_winner() {
        let mut alice = Player::new("Alice", "c1");
        alice.score = 5;
        let bob = Player::new("Bob", "c2");
        let outcome = Outcome::from_players(&[alice, bob]);
        assert_eq!(outcome.headline(), "Alice wins!");
        assert_eq!(outcome.details(), vec!["Alice: 5 pairs", "Bob: 0 pairs"]);
        assert_eq!(outcome.top_score(), Some(5));
    }

    #[test]
    fn empty_table_has_no_winner() {
        let outcome = Outcome::from_scores(&[]);
        assert!(outcome.winners.is_empty());
        assert!(!outcome.is_tie());
        assert_eq!(outcome.headline(), "No winner");
    }
}
