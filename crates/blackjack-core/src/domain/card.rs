//! Cards, hands, and the card supply.
//!
//! A card is a `(rank, suit)` pair: rank 1–13 where 1 is the Ace and
//! 11/12/13 are the face cards, suit 0–3. Blackjack values are fixed:
//! Ace = 11, face cards and tens = 10, everything else = its rank.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::domain::round::BUST_LIMIT;

/// Errors produced when constructing a [`Card`] from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    /// Rank outside 1..=13.
    #[error("invalid card rank: {0} (expected 1..=13)")]
    InvalidRank(u16),

    /// Suit outside 0..=3.
    #[error("invalid card suit: {0} (expected 0..=3)")]
    InvalidSuit(u8),
}

/// A single immutable playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    /// Rank in 1..=13; 1 = Ace, 11 = Jack, 12 = Queen, 13 = King.
    pub rank: u8,
    /// Suit in 0..=3.
    pub suit: u8,
}

impl Card {
    /// Validates and constructs a card.
    ///
    /// The rank parameter is `u16` because that is the width the wire
    /// format uses for ranks.
    ///
    /// # Errors
    ///
    /// Returns [`CardError`] when either field is out of range.
    pub fn new(rank: u16, suit: u8) -> Result<Self, CardError> {
        if !(1..=13).contains(&rank) {
            return Err(CardError::InvalidRank(rank));
        }
        if suit > 3 {
            return Err(CardError::InvalidSuit(suit));
        }
        Ok(Self {
            rank: rank as u8,
            suit,
        })
    }

    /// Blackjack value of this card: Ace = 11, rank >= 10 = 10, else rank.
    pub fn value(&self) -> u32 {
        match self.rank {
            1 => 11,
            r if r >= 10 => 10,
            r => u32::from(r),
        }
    }
}

/// One party's accumulated cards within a round.
///
/// A hand only ever grows; cards are never removed or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    /// Creates an empty hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly dealt card.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Sum of the blackjack values of all cards in the hand.
    ///
    /// Monotonically non-decreasing as cards are appended.
    pub fn total(&self) -> u32 {
        self.cards.iter().map(Card::value).sum()
    }

    /// Whether this hand has exceeded the bust limit of 21.
    pub fn is_bust(&self) -> bool {
        self.total() > BUST_LIMIT
    }

    /// The cards dealt so far, in deal order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards in the hand.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// `true` when no cards have been dealt yet.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Supply of cards for a session.
///
/// Each draw is independent and uniform over the 52 `(rank, suit)` pairs;
/// there is no depleting deck, matching the protocol's card model. The
/// trait exists so the session engine can be exercised with a
/// [`ScriptedDeck`] in tests.
pub trait CardSource {
    /// Produces the next card.
    fn draw(&mut self) -> Card;
}

/// RNG-backed card source used by the real dealer.
pub struct RandomDeck {
    rng: StdRng,
}

impl RandomDeck {
    /// Creates a deck seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl CardSource for RandomDeck {
    fn draw(&mut self) -> Card {
        Card {
            rank: self.rng.gen_range(1..=13),
            suit: self.rng.gen_range(0..=3),
        }
    }
}

/// Deterministic card source for tests: yields a fixed sequence of cards.
///
/// Panics when drawn past the end of the script; a test that under-supplies
/// cards is a broken test.
pub struct ScriptedDeck {
    cards: VecDeque<Card>,
}

impl ScriptedDeck {
    /// Creates a deck that deals `cards` in order.
    pub fn new(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    /// Convenience constructor from `(rank, suit)` pairs.
    ///
    /// # Panics
    ///
    /// Panics on out-of-range pairs.
    pub fn from_pairs(pairs: &[(u16, u8)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(rank, suit)| Card::new(rank, suit).expect("valid scripted card")),
        )
    }

    /// Cards remaining in the script.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl CardSource for ScriptedDeck {
    fn draw(&mut self) -> Card {
        self.cards.pop_front().expect("scripted deck exhausted")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_value_exhaustive_over_all_ranks() {
        // Ace = 11, 2..=9 face value, 10..=13 all worth 10.
        let expected = [11, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];
        for rank in 1..=13u16 {
            let card = Card::new(rank, 0).unwrap();
            assert_eq!(
                card.value(),
                expected[(rank - 1) as usize],
                "wrong value for rank {rank}"
            );
        }
    }

    #[test]
    fn test_card_new_rejects_rank_zero() {
        assert_eq!(Card::new(0, 0), Err(CardError::InvalidRank(0)));
    }

    #[test]
    fn test_card_new_rejects_rank_fourteen() {
        assert_eq!(Card::new(14, 0), Err(CardError::InvalidRank(14)));
    }

    #[test]
    fn test_card_new_rejects_suit_four() {
        assert_eq!(Card::new(1, 4), Err(CardError::InvalidSuit(4)));
    }

    #[test]
    fn test_card_new_accepts_boundary_values() {
        assert!(Card::new(1, 0).is_ok());
        assert!(Card::new(13, 3).is_ok());
    }

    #[test]
    fn test_hand_total_is_sum_of_card_values() {
        let mut hand = Hand::new();
        hand.push(Card::new(10, 0).unwrap()); // 10
        hand.push(Card::new(1, 1).unwrap()); // 11
        hand.push(Card::new(5, 2).unwrap()); // 5
        assert_eq!(hand.total(), 26);
    }

    #[test]
    fn test_hand_total_is_monotonically_non_decreasing() {
        let mut hand = Hand::new();
        let mut last = hand.total();
        for rank in 1..=13u16 {
            hand.push(Card::new(rank, 0).unwrap());
            let total = hand.total();
            assert!(total >= last, "total decreased after appending rank {rank}");
            last = total;
        }
    }

    #[test]
    fn test_empty_hand_has_total_zero_and_is_not_bust() {
        let hand = Hand::new();
        assert_eq!(hand.total(), 0);
        assert!(!hand.is_bust());
        assert!(hand.is_empty());
    }

    #[test]
    fn test_hand_is_bust_strictly_above_limit() {
        let mut hand = Hand::new();
        hand.push(Card::new(10, 0).unwrap());
        hand.push(Card::new(1, 0).unwrap());
        // 21 exactly is not a bust.
        assert_eq!(hand.total(), 21);
        assert!(!hand.is_bust());

        hand.push(Card::new(2, 0).unwrap());
        assert!(hand.is_bust());
    }

    #[test]
    fn test_random_deck_draws_in_range() {
        let mut deck = RandomDeck::new();
        for _ in 0..500 {
            let card = deck.draw();
            assert!((1..=13).contains(&card.rank), "rank out of range");
            assert!(card.suit <= 3, "suit out of range");
        }
    }

    #[test]
    fn test_scripted_deck_deals_in_order() {
        let mut deck = ScriptedDeck::from_pairs(&[(10, 0), (9, 1), (8, 2)]);
        assert_eq!(deck.remaining(), 3);
        assert_eq!(deck.draw(), Card { rank: 10, suit: 0 });
        assert_eq!(deck.draw(), Card { rank: 9, suit: 1 });
        assert_eq!(deck.draw(), Card { rank: 8, suit: 2 });
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "scripted deck exhausted")]
    fn test_scripted_deck_panics_when_exhausted() {
        let mut deck = ScriptedDeck::from_pairs(&[]);
        deck.draw();
    }
}
