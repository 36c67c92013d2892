/// A semantic element of the table a strategy can produce a claim about
/// (GLOSSARY "Slot").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Slot {
    Pot,
    BoardCard(u8),
    HeroCard(u8),
    Seat(u8),
    DealerButton,
}

/// Typed payload for an [`Observation`](crate::Observation); kept loose
/// because strategies disagree on representation before the voter resolves
/// a slot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SlotValue {
    Card(pt_core::Card),
    Amount(f64),
    Text(String),
    Flag(bool),
}

impl SlotValue {
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            SlotValue::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_card(&self) -> Option<pt_core::Card> {
        match self {
            SlotValue::Card(c) => Some(*c),
            _ => None,
        }
    }
}
