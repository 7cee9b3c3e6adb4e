use std::collections::{HashMap, HashSet};

use memora_engine::cards::{CardState, Symbol};
use memora_engine::deck::{fisher_yates, Deck};
use memora_engine::rules::Difficulty;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn value_counts(cards: &[memora_engine::cards::Card]) -> HashMap<Symbol, usize> {
    let mut counts = HashMap::new();
    for card in cards {
        *counts.entry(card.value).or_insert(0) += 1;
    }
    counts
}

#[test]
fn card_counts_follow_difficulty() {
    let mut deck = Deck::new_with_seed(9);
    assert_eq!(deck.deal(Difficulty::Easy).len(), 16);
    assert_eq!(deck.deal(Difficulty::Medium).len(), 30);
    assert_eq!(deck.deal(Difficulty::Hard).len(), 48);
}

#[test]
fn every_value_appears_exactly_twice() {
    for difficulty in Difficulty::ALL {
        let cards = Deck::new_with_seed(2024).deal(difficulty);
        let counts = value_counts(&cards);
        assert_eq!(counts.len(), difficulty.pair_count(), "{difficulty}");
        assert!(counts.values().all(|&n| n == 2), "{difficulty}: {counts:?}");
    }
}

#[test]
fn dealt_cards_start_hidden_with_sequential_positions() {
    let cards = Deck::new_with_seed(5).deal(Difficulty::Medium);
    for (i, card) in cards.iter().enumerate() {
        assert_eq!(card.position, i);
        assert_eq!(card.state, CardState::Hidden);
    }
}

#[test]
fn same_seed_same_board() {
    let a = Deck::new_with_seed(12345).deal(Difficulty::Hard);
    let b = Deck::new_with_seed(12345).deal(Difficulty::Hard);
    assert_eq!(a, b, "same seed must yield identical boards");
}

#[test]
fn different_seeds_differ() {
    let a = Deck::new_with_seed(1).deal(Difficulty::Hard);
    let b = Deck::new_with_seed(2).deal(Difficulty::Hard);
    assert_ne!(a, b, "different seeds should produce different boards");
}

#[test]
fn consecutive_deals_from_one_deck_differ() {
    let mut deck = Deck::new_with_seed(77);
    let first = deck.deal(Difficulty::Easy);
    let second = deck.deal(Difficulty::Easy);
    assert_ne!(first, second);
}

#[test]
fn fisher_yates_first_slot_is_roughly_uniform() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let mut hits = [0usize; 4];
    let trials = 8_000;
    for _ in 0..trials {
        let mut items = [0, 1, 2, 3];
        fisher_yates(&mut items, &mut rng);
        hits[items[0]] += 1;
    }
    let expected = trials / 4;
    for (value, &n) in hits.iter().enumerate() {
        let diff = n.abs_diff(expected);
        assert!(diff < expected / 10, "value {value} landed first {n} times");
    }
}

proptest! {
    #[test]
    fn fisher_yates_is_a_permutation(mut items in proptest::collection::vec(any::<u16>(), 0..64), seed in any::<u64>()) {
        let mut expected = items.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        fisher_yates(&mut items, &mut rng);
        expected.sort_unstable();
        items.sort_unstable();
        prop_assert_eq!(items, expected);
    }

    #[test]
    fn any_seed_deals_distinct_pairs(seed in any::<u64>(), level in 0usize..3) {
        let difficulty = Difficulty::ALL[level];
        let cards = Deck::new_with_seed(seed).deal(difficulty);
        prop_assert_eq!(cards.len(), difficulty.card_count());
        let values: HashSet<Symbol> = cards.iter().map(|c| c.value).collect();
        prop_assert_eq!(values.len(), difficulty.pair_count());
    }
}
