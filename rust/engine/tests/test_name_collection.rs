use std::collections::HashSet;

use memora_engine::errors::GameError;
use memora_engine::game::{Controller, Effect, Event};
use memora_engine::player::{assign_colors, Roster, PALETTE};
use memora_engine::rules::{Difficulty, RoundSetup};

#[test]
fn case_insensitive_duplicates_are_rejected() {
    let err = Roster::collect(2, &["Alice", "alice"]).unwrap_err();
    assert_eq!(
        err,
        GameError::DuplicateNames {
            names: vec!["alice".to_string()]
        }
    );
    assert_eq!(
        err.to_string(),
        "Please enter unique player names. Duplicate: alice"
    );
}

#[test]
fn unique_names_get_distinct_colors() {
    let roster = Roster::collect(2, &["Alice", "Bob"]).unwrap();
    let players = roster.players();
    assert_ne!(players[0].color, players[1].color);
    assert!(players.iter().all(|p| PALETTE.contains(&p.color.as_str())));
    assert!(players.iter().all(|p| p.score == 0));
}

#[test]
fn blank_names_default_by_seat() {
    let roster = Roster::collect(3, &["  ", "zoe"]).unwrap();
    assert_eq!(roster.names(), vec!["Player 1", "Zoe", "Player 3"]);
}

#[test]
fn default_names_collide_with_typed_ones() {
    let err = Roster::collect(2, &["", "player 1"]).unwrap_err();
    assert!(matches!(err, GameError::DuplicateNames { .. }));
}

#[test]
fn colors_are_stable_for_the_same_names() {
    let a = assign_colors(&["Alice", "Bob", "Cy"]);
    let b = assign_colors(&["Alice", "Bob", "Cy"]);
    assert_eq!(a, b);
}

#[test]
fn up_to_ten_players_never_share_a_color() {
    let names: Vec<String> = (0..10).map(|i| format!("Name {i}")).collect();
    let colors: HashSet<String> = assign_colors(&names).into_iter().collect();
    assert_eq!(colors.len(), 10);
}

#[test]
fn rejected_submission_keeps_waiting_for_names() {
    let mut controller = Controller::new(3);
    controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
    let effects = controller.dispatch(Event::SubmitNames(vec!["Bob".into(), "BOB".into()]));
    match &effects[..] {
        [Effect::NamesRejected { names, message }] => {
            assert_eq!(names, &vec!["bob".to_string()]);
            assert!(message.contains("Duplicate: bob"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
    assert!(controller.session().is_none());
    assert!(controller.roster().is_none());
    assert_eq!(
        controller.pending_setup(),
        Some(RoundSetup::new(2, Difficulty::Easy))
    );

    let effects = controller.dispatch(Event::SubmitNames(vec!["Bob".into(), "Rob".into()]));
    assert!(matches!(effects[0], Effect::RoundStarted { card_count: 16, .. }));
    assert!(controller.pending_setup().is_none());
}

#[test]
fn reset_forgets_names() {
    let mut controller = Controller::new(3);
    controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
    controller.dispatch(Event::SubmitNames(vec!["Ann".into(), "Ben".into()]));
    controller.dispatch(Event::Reset);
    let effects = controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
    assert_eq!(effects, vec![Effect::NamesRequired { count: 2 }]);
}

#[test]
fn restart_reuses_names_and_zeroes_scores() {
    let mut controller = Controller::new(3);
    controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Easy)));
    controller.dispatch(Event::SubmitNames(vec!["ann".into(), "ben".into()]));
    let effects = controller.dispatch(Event::Start(RoundSetup::new(2, Difficulty::Medium)));
    match &effects[0] {
        Effect::RoundStarted {
            players,
            card_count,
            ..
        } => {
            assert_eq!(*card_count, 30);
            let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Ann", "Ben"]);
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(effects[1], Effect::TurnAnnounced { player: 0 });
}
