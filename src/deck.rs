//! Deals a fresh, uniformly shuffled board.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::state::{Card, Symbol};

/// Shuffled copy of `items`; the input slice is left untouched.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Every symbol of `alphabet` twice, in alphabet order.
pub fn pairs_of(alphabet: &[Symbol]) -> Vec<Symbol> {
    let mut values = Vec::with_capacity(alphabet.len() * 2);
    values.extend_from_slice(alphabet);
    values.extend_from_slice(alphabet);
    values
}

pub fn deal<R: Rng + ?Sized>(alphabet: &[Symbol], rng: &mut R) -> Vec<Card> {
    shuffled(&pairs_of(alphabet), rng)
        .into_iter()
        .enumerate()
        .map(|(position, symbol)| Card::new(symbol, position))
        .collect()
}

/// A 16-card board built from the eight fixed symbols.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    deal(&Symbol::ALL, rng)
}
