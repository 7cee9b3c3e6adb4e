//! Turn and match state machine.
//!
//! [`Session`] holds one round; [`Controller`] owns the session together with
//! the roster and the generation counter, and is the single entry point for
//! clicks, timer expirations and the start/reset triggers. Transitions never
//! sleep: anything that must happen later is returned as [`Effect::Schedule`]
//! and comes back in as [`Event::Timer`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cards::{Card, CardState, Symbol};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::outcome::Outcome;
use crate::player::{Player, Roster};
use crate::rules::{
    Difficulty, RoundSetup, MATCH_CLEAR_DELAY, MATCH_REVEAL_DELAY, MISMATCH_HIDE_DELAY,
};

/// Delayed transition requested by the state machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timer {
    /// Matched pair starts its removal animation
    RevealMatch { first: usize, second: usize },
    /// Removal animation finished; pair becomes vacant
    ClearMatch { first: usize, second: usize },
    /// Mismatched pair flips back and the turn passes
    HideMismatch { first: usize, second: usize },
}

impl Timer {
    pub fn delay(self) -> Duration {
        match self {
            Timer::RevealMatch { .. } => MATCH_REVEAL_DELAY,
            Timer::ClearMatch { .. } => MATCH_CLEAR_DELAY,
            Timer::HideMismatch { .. } => MISMATCH_HIDE_DELAY,
        }
    }
}

/// A timer tagged with the generation of the round that scheduled it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ScheduledTimer {
    pub generation: u64,
    pub timer: Timer,
}

/// Inputs accepted by [`Controller::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(RoundSetup),
    SubmitNames(Vec<String>),
    Click(usize),
    Timer(ScheduledTimer),
    Reset,
}

/// Outputs for the presentation layer, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Names must be collected for `count` players before the board is dealt
    NamesRequired { count: usize },
    /// Name submission blocked; `names` are the colliding names
    NamesRejected { names: Vec<String>, message: String },
    RoundStarted {
        generation: u64,
        difficulty: Difficulty,
        card_count: usize,
        players: Vec<Player>,
    },
    CardFlipped { position: usize, value: Symbol },
    ScoreChanged { player: usize, score: u32 },
    CardsMatched { first: usize, second: usize },
    CardsVacated { first: usize, second: usize },
    CardsHidden { first: usize, second: usize },
    TurnChanged { player: usize },
    TurnAnnounced { player: usize },
    RoundComplete { outcome: Outcome },
    BoardCleared,
    Schedule { after: Duration, timer: ScheduledTimer },
}

/// Coarse state of the selection sub-machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No card selected
    Idle,
    /// One card selected
    Pending,
    /// Two cards selected and awaiting resolution
    Resolving,
    /// Every pair found; only a reset or new start leaves this state
    Complete,
}

/// Face-up, unresolved cards. Never holds more than two positions.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    first: Option<usize>,
    second: Option<usize>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.first.is_some() as usize + self.second.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == 2
    }

    pub fn positions(&self) -> Vec<usize> {
        self.first.iter().chain(self.second.iter()).copied().collect()
    }

    /// Adds a position; returns `false` when already full.
    fn push(&mut self, position: usize) -> bool {
        if self.first.is_none() {
            self.first = Some(position);
            true
        } else if self.second.is_none() {
            self.second = Some(position);
            true
        } else {
            false
        }
    }

    fn pair(&self) -> Option<(usize, usize)> {
        match (self.first, self.second) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    fn clear(&mut self) {
        *self = Selection::default();
    }
}

/// One round: board, scores, turn and selection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    generation: u64,
    difficulty: Difficulty,
    players: Vec<Player>,
    cards: Vec<Card>,
    current_player: usize,
    selection: Selection,
    matched_pairs: usize,
    complete: bool,
}

impl Session {
    /// Builds a fresh round with every score at zero and player 0 to move.
    pub fn new(generation: u64, difficulty: Difficulty, roster: &Roster, cards: Vec<Card>) -> Self {
        let players = roster
            .players()
            .iter()
            .map(|p| Player::new(p.name.clone(), p.color.clone()))
            .collect();
        Self {
            generation,
            difficulty,
            players,
            cards,
            current_player: 0,
            selection: Selection::default(),
            matched_pairs: 0,
            complete: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn phase(&self) -> Phase {
        if self.complete {
            return Phase::Complete;
        }
        match self.selection.len() {
            0 => Phase::Idle,
            1 => Phase::Pending,
            _ => Phase::Resolving,
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_players(&self.players)
    }

    /// Flips the card at `position` if the click is legal. Illegal clicks
    /// (unknown position, card not hidden, pair already up, round over) change
    /// nothing and return no effects.
    pub fn click(&mut self, position: usize) -> Vec<Effect> {
        if self.complete || self.selection.is_full() {
            return Vec::new();
        }
        let value = match self.cards.get(position) {
            Some(card) if card.is_hidden() => card.value,
            _ => return Vec::new(),
        };

        self.cards[position].state = CardState::Flipped;
        self.selection.push(position);
        tracing::trace!(generation = self.generation, position, "card flipped");

        let mut effects = vec![Effect::CardFlipped { position, value }];
        if let Some((first, second)) = self.selection.pair() {
            effects.extend(self.resolve(first, second));
        }
        effects
    }

    fn resolve(&mut self, first: usize, second: usize) -> Vec<Effect> {
        if self.cards[first].value == self.cards[second].value {
            let player = self.current_player;
            self.players[player].score += 1;
            self.matched_pairs += 1;
            self.selection.clear();
            tracing::debug!(
                generation = self.generation,
                player,
                matched = self.matched_pairs,
                "pair matched"
            );
            vec![
                Effect::ScoreChanged {
                    player,
                    score: self.players[player].score,
                },
                self.schedule(Timer::RevealMatch { first, second }),
            ]
        } else {
            tracing::debug!(generation = self.generation, first, second, "pair missed");
            vec![self.schedule(Timer::HideMismatch { first, second })]
        }
    }

    fn schedule(&self, timer: Timer) -> Effect {
        Effect::Schedule {
            after: timer.delay(),
            timer: ScheduledTimer {
                generation: self.generation,
                timer,
            },
        }
    }

    /// Applies an expired timer. Timers from another generation are ignored.
    pub fn fire(&mut self, scheduled: ScheduledTimer) -> Vec<Effect> {
        if scheduled.generation != self.generation {
            tracing::debug!(
                generation = self.generation,
                stale = scheduled.generation,
                "ignoring timer from an earlier round"
            );
            return Vec::new();
        }

        match scheduled.timer {
            Timer::RevealMatch { first, second } => {
                self.set_state(&[first, second], CardState::MatchedPending);
                vec![
                    Effect::CardsMatched { first, second },
                    self.schedule(Timer::ClearMatch { first, second }),
                ]
            }
            Timer::ClearMatch { first, second } => {
                self.set_state(&[first, second], CardState::Vacant);
                let mut effects = vec![Effect::CardsVacated { first, second }];
                if !self.complete && self.matched_pairs == self.pair_count() {
                    self.complete = true;
                    let outcome = self.outcome();
                    tracing::debug!(
                        generation = self.generation,
                        winners = ?outcome.winners,
                        "round complete"
                    );
                    effects.push(Effect::RoundComplete { outcome });
                }
                effects
            }
            Timer::HideMismatch { first, second } => {
                self.set_state(&[first, second], CardState::Hidden);
                self.selection.clear();
                self.current_player = (self.current_player + 1) % self.players.len().max(1);
                vec![
                    Effect::CardsHidden { first, second },
                    Effect::TurnChanged {
                        player: self.current_player,
                    },
                    Effect::TurnAnnounced {
                        player: self.current_player,
                    },
                ]
            }
        }
    }

    fn set_state(&mut self, positions: &[usize], state: CardState) {
        for &p in positions {
            if let Some(card) = self.cards.get_mut(p) {
                card.state = state;
            }
        }
    }
}

/// Owns everything one page of play needs across rounds: the board generator,
/// the collected roster, the live round and the generation counter.
#[derive(Debug, Clone)]
pub struct Controller {
    deck: Deck,
    roster: Option<Roster>,
    pending: Option<RoundSetup>,
    session: Option<Session>,
    generation: u64,
}

impl Controller {
    pub fn new(seed: u64) -> Self {
        Self {
            deck: Deck::new_with_seed(seed),
            roster: None,
            pending: None,
            session: None,
            generation: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.deck.seed()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// Setup waiting on name collection, if any.
    pub fn pending_setup(&self) -> Option<RoundSetup> {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Start(setup) => self.start(setup),
            Event::SubmitNames(names) => match self.submit_names(&names) {
                Ok(effects) => effects,
                Err(err) => {
                    let message = err.to_string();
                    let GameError::DuplicateNames { names } = err;
                    vec![Effect::NamesRejected { names, message }]
                }
            },
            Event::Click(position) => self.click(position),
            Event::Timer(timer) => self.fire(timer),
            Event::Reset => self.reset(),
        }
    }

    /// Deals a new round, or asks for names when none have been collected for
    /// this player count.
    pub fn start(&mut self, setup: RoundSetup) -> Vec<Effect> {
        let setup = RoundSetup::new(setup.players, setup.difficulty);
        let roster = match &self.roster {
            Some(roster) if roster.len() == setup.players => roster.clone(),
            _ => {
                tracing::debug!(players = setup.players, "names required before dealing");
                self.pending = Some(setup);
                return vec![Effect::NamesRequired {
                    count: setup.players,
                }];
            }
        };

        self.pending = None;
        self.generation += 1;
        let cards = self.deck.deal(setup.difficulty);
        let session = Session::new(self.generation, setup.difficulty, &roster, cards);
        tracing::debug!(
            generation = self.generation,
            difficulty = %setup.difficulty,
            players = setup.players,
            "round started"
        );

        let effects = vec![
            Effect::RoundStarted {
                generation: self.generation,
                difficulty: setup.difficulty,
                card_count: session.cards().len(),
                players: session.players().to_vec(),
            },
            Effect::TurnAnnounced {
                player: session.current_player(),
            },
        ];
        self.session = Some(session);
        effects
    }

    /// Validates names for the pending setup and, on success, starts it.
    ///
    /// # Errors
    ///
    /// [`GameError::DuplicateNames`]; nothing is stored and no round starts.
    pub fn submit_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<Effect>, GameError> {
        let setup = self
            .pending
            .unwrap_or_else(|| RoundSetup::new(names.len(), Difficulty::default()));
        let roster = Roster::collect(setup.players, names)?;
        self.roster = Some(roster);
        Ok(self.start(setup))
    }

    pub fn click(&mut self, position: usize) -> Vec<Effect> {
        match self.session.as_mut() {
            Some(session) => session.click(position),
            None => Vec::new(),
        }
    }

    pub fn fire(&mut self, timer: ScheduledTimer) -> Vec<Effect> {
        match self.session.as_mut() {
            Some(session) => session.fire(timer),
            None => {
                tracing::debug!(stale = timer.generation, "timer fired after reset");
                Vec::new()
            }
        }
    }

    /// Drops the round and the collected names. Timers still in flight become
    /// stale because the generation moves on.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.session = None;
        self.roster = None;
        self.pending = None;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "controller reset");
        vec![Effect::BoardCleared]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_positions(session: &Session) -> (usize, usize) {
        let cards = session.cards();
        for (i, a) in cards.iter().enumerate() {
            if let Some(j) = cards.iter().skip(i + 1).position(|b| b.value == a.value) {
                return (i, i + 1 + j);
            }
        }
        unreachable!("every board holds pairs")
    }

    fn started() -> Controller {
        let mut controller = Controller::new(5);
        controller.start(RoundSetup::new(2, Difficulty::Easy));
        controller.submit_names(&["Ann", "Ben"]).unwrap();
        controller
    }

    #[test]
    fn selection_caps_at_two() {
        let mut selection = Selection::default();
        assert!(selection.push(1));
        assert!(selection.push(2));
        assert!(!selection.push(3));
        assert_eq!(selection.positions(), vec![1, 2]);
    }

    #[test]
    fn clicking_same_card_twice_is_a_no_op() {
        let mut controller = started();
        assert_eq!(controller.click(0).len(), 1);
        assert!(controller.click(0).is_empty());
        assert_eq!(controller.session().unwrap().phase(), Phase::Pending);
    }

    #[test]
    fn match_clears_selection_before_animation() {
        let mut controller = started();
        let (a, b) = pair_positions(controller.session().unwrap());
        controller.click(a);
        let effects = controller.click(b);
        assert!(matches!(effects[1], Effect::ScoreChanged { player: 0, score: 1 }));
        let session = controller.session().unwrap();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.cards()[a].state, CardState::Flipped);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut controller = started();
        let generation = controller.generation();
        let (a, b) = pair_positions(controller.session().unwrap());
        let before = controller.session().unwrap().clone();
        let effects = controller.fire(ScheduledTimer {
            generation: generation - 1,
            timer: Timer::ClearMatch {
                first: a,
                second: b,
            },
        });
        assert!(effects.is_empty());
        assert_eq!(controller.session().unwrap(), &before);
    }

    #[test]
    fn submit_without_pending_setup_uses_name_count() {
        let mut controller = Controller::new(1);
        let effects = controller.submit_names(&["a", "b", "c"]).unwrap();
        assert!(matches!(effects[0], Effect::RoundStarted { card_count: 30, .. }));
        assert_eq!(controller.session().unwrap().players().len(), 3);
    }
}
