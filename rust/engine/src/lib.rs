//! # memora-engine: Memory-Matching Game Core
//!
//! A deterministic, clock-free engine for turn-taking concentration games.
//! Players take turns flipping two cards; a matching pair scores and keeps the
//! turn, a miss flips the cards back and passes the turn on.
//!
//! ## Core Modules
//!
//! - [`cards`] - Symbols, cards and card states
//! - [`deck`] - Seeded board generation with Fisher–Yates shuffling
//! - [`rules`] - Difficulty levels, timing constants and input normalization
//! - [`player`] - Players, name collection and color assignment
//! - [`game`] - The turn/match state machine and its controller
//! - [`timeline`] - Virtual clock for scheduled transitions
//! - [`scoreboard`] - Scoreboard and turn-indicator models
//! - [`outcome`] - Win and tie detection
//! - [`errors`] - Error types
//!
//! ## Quick Start
//!
//! ```rust
//! use memora_engine::game::{Controller, Effect, Event};
//! use memora_engine::rules::{Difficulty, RoundSetup};
//!
//! let mut controller = Controller::new(7);
//!
//! // Names are collected before the first board is dealt
//! let effects = controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
//! assert_eq!(effects, vec![Effect::NamesRequired { count: 2 }]);
//!
//! controller.dispatch(Event::SubmitNames(vec!["alice".into(), "bob".into()]));
//! let session = controller.session().expect("round started");
//! assert_eq!(session.cards().len(), 16);
//! assert_eq!(session.players()[0].name, "Alice");
//! ```
//!
//! ## Deterministic Boards
//!
//! ```rust
//! use memora_engine::deck::Deck;
//! use memora_engine::rules::Difficulty;
//!
//! let a = Deck::new_with_seed(42).deal(Difficulty::Hard);
//! let b = Deck::new_with_seed(42).deal(Difficulty::Hard);
//! assert_eq!(a, b);
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod game;
pub mod outcome;
pub mod player;
pub mod rules;
pub mod scoreboard;
pub mod timeline;
