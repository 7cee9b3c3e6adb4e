use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::cards::{all_symbols, Card, Symbol};
use crate::rules::Difficulty;

/// Board generator backed by a seedable ChaCha20 stream.
///
/// Successive calls to [`Deck::deal`] keep drawing from the same stream, so a
/// seed fixes the whole sequence of boards dealt from one deck.
#[derive(Debug, Clone)]
pub struct Deck {
    seed: u64,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Picks `difficulty.pair_count()` distinct symbols, duplicates each one and
    /// lays the result out in a uniformly random order.
    pub fn deal(&mut self, difficulty: Difficulty) -> Vec<Card> {
        let mut symbols = all_symbols();
        symbols.shuffle(&mut self.rng);
        symbols.truncate(difficulty.pair_count());

        let mut values: Vec<Symbol> = Vec::with_capacity(symbols.len() * 2);
        values.extend_from_slice(&symbols);
        values.extend_from_slice(&symbols);
        fisher_yates(&mut values, &mut self.rng);

        values
            .into_iter()
            .enumerate()
            .map(|(position, value)| Card::new(value, position))
            .collect()
    }
}

/// In-place Fisher–Yates: walk from the last index down to 1 and swap each slot
/// with a uniformly chosen index in `[0, i]`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fisher_yates_handles_tiny_slices() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut empty: [u8; 0] = [];
        fisher_yates(&mut empty, &mut rng);
        let mut one = [9u8];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, [9]);
    }

    #[test]
    fn consecutive_deals_continue_the_stream() {
        let mut deck = Deck::new_with_seed(99);
        let first = deck.deal(Difficulty::Easy);
        let second = deck.deal(Difficulty::Easy);
        assert_ne!(first, second, "second board should differ (high probability)");
    }

    #[test]
    fn positions_match_indices() {
        let mut deck = Deck::new_with_seed(1);
        for (i, card) in deck.deal(Difficulty::Medium).iter().enumerate() {
            assert_eq!(card.position, i);
        }
    }
}
