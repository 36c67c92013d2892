use super::rank::Rank;
use super::suit::Suit;

/// An immutable playing card, `(rank, suit)`.
///
/// Bijective with `0..52` via `rank * 4 + suit`, so the 52 values of `Card`
/// uniquely identify one physical card.
///
/// Parsing accepts `"As"`, `"10h"`, `"AS"`, and unicode suit glyphs (`"A♠"`).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Card(Rank, Suit);

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self(rank, suit)
    }
    pub fn rank(&self) -> Rank {
        self.0
    }
    pub fn suit(&self) -> Suit {
        self.1
    }
}

impl From<(Rank, Suit)> for Card {
    fn from((r, s): (Rank, Suit)) -> Self {
        Self(r, s)
    }
}

/// `0..52` isomorphism: `rank * 4 + suit`.
impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        u8::from(c.0) * 4 + u8::from(c.1)
    }
}
impl From<u8> for Card {
    fn from(n: u8) -> Self {
        Self(Rank::from(n / 4), Suit::from(n % 4))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// Accepts two- or three-character notations: rank (1-2 chars) + suit (1 char).
impl TryFrom<&str> for Card {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let s = s.trim();
        let (rank_str, suit_str) = s.split_at(s.chars().count().saturating_sub(1));
        if rank_str.is_empty() || suit_str.is_empty() {
            return Err(format!("invalid card: {s:?}"));
        }
        let rank = Rank::try_from(rank_str)?;
        let suit = Suit::try_from(suit_str)?;
        Ok(Card(rank, suit))
    }
}

impl Card {
    /// Every one of the 52 distinct cards, in `(rank, suit)` order.
    pub fn deck() -> Vec<Card> {
        Rank::all()
            .into_iter()
            .flat_map(|r| Suit::all().into_iter().map(move |s| Card(r, s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u8_for_all_52() {
        for card in Card::deck() {
            assert_eq!(card, Card::from(u8::from(card)));
        }
    }

    #[test]
    fn deck_has_52_unique_cards() {
        let deck = Card::deck();
        assert_eq!(deck.len(), 52);
        let unique: std::collections::HashSet<_> = deck.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn parses_two_and_three_char_notations() {
        assert_eq!(Card::try_from("As").unwrap(), Card::new(Rank::Ace, Suit::S));
        assert_eq!(Card::try_from("10h").unwrap(), Card::new(Rank::Ten, Suit::H));
        assert_eq!(Card::try_from("AS").unwrap(), Card::new(Rank::Ace, Suit::S));
        assert_eq!(Card::try_from("A♠").unwrap(), Card::new(Rank::Ace, Suit::S));
    }

    #[test]
    fn round_trip_format_then_parse() {
        for card in Card::deck() {
            assert_eq!(Card::try_from(card.to_string().as_str()).unwrap(), card);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(Card::try_from("").is_err());
        assert!(Card::try_from("Zz").is_err());
    }
}
