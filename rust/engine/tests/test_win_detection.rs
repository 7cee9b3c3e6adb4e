use memora_engine::outcome::Outcome;
use memora_engine::player::Player;

#[test]
fn shared_top_score_is_a_tie() {
    let outcome = Outcome::from_scores(&[3, 1, 3]);
    assert_eq!(outcome.winners, vec![0, 2]);
    assert!(outcome.is_tie());
    assert_eq!(outcome.top_score(), Some(3));
}

#[test]
fn single_leader_wins_outright() {
    let outcome = Outcome::from_scores(&[5, 2, 1]);
    assert_eq!(outcome.winners, vec![0]);
    assert!(!outcome.is_tie());
    assert_eq!(outcome.headline(), "Player 1 wins!");
}

#[test]
fn tie_headline_lists_names_in_seat_order() {
    let players: Vec<Player> = ["Ann", "Ben", "Cy"]
        .iter()
        .zip([4, 4, 0])
        .map(|(name, score)| {
            let mut p = Player::new(*name, "c");
            p.score = score;
            p
        })
        .collect();
    let outcome = Outcome::from_players(&players);
    assert_eq!(outcome.headline(), "It's a tie between Ann & Ben!");
    assert_eq!(
        outcome.details(),
        vec!["Ann: 4 pairs", "Ben: 4 pairs", "Cy: 0 pairs"]
    );
}

#[test]
fn all_zero_scores_tie_everyone() {
    let outcome = Outcome::from_scores(&[0, 0]);
    assert_eq!(outcome.winners, vec![0, 1]);
}
