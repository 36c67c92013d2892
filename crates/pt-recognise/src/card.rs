use pt_core::Card;
use pt_detect::Resolution;

/// Minimum ensemble confidence required to emit a card; below this the
/// dispatcher keeps whatever value it already had.
pub const CARD_EMIT_THRESHOLD: f32 = 0.85;

/// Resolves a card slot, refusing to emit below the trust threshold so the
/// dispatcher can fall back to its last known value instead of flickering.
pub fn recognise_card(resolution: &Resolution) -> Option<Card> {
    if resolution.confidence.value() < CARD_EMIT_THRESHOLD || resolution.low_trust {
        return None;
    }
    resolution.value.as_card()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::{Rank, Suit};
    use pt_detect::{ResolutionMethod, SlotValue};

    fn resolution(confidence: f32, low_trust: bool, value: SlotValue) -> Resolution {
        Resolution {
            value,
            confidence: pt_core::Confidence::new(confidence),
            method: ResolutionMethod::WeightedVote,
            contributors: vec![],
            disagreement: 0.0,
            low_trust,
        }
    }

    #[test]
    fn emits_above_threshold() {
        let card = Card::new(Rank::Ace, Suit::S);
        let r = resolution(0.9, false, SlotValue::Card(card));
        assert_eq!(recognise_card(&r), Some(card));
    }

    #[test]
    fn withholds_below_threshold() {
        let card = Card::new(Rank::Ace, Suit::S);
        let r = resolution(0.5, false, SlotValue::Card(card));
        assert_eq!(recognise_card(&r), None);
    }

    #[test]
    fn withholds_low_trust_even_if_confident() {
        let card = Card::new(Rank::Ace, Suit::S);
        let r = resolution(0.95, true, SlotValue::Card(card));
        assert_eq!(recognise_card(&r), None);
    }
}
