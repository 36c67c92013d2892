use pt_core::{Card, Stage};
use pt_dispatch::Seat;

/// One append-only snapshot taken during a recorded hand.
#[derive(Debug, Clone)]
pub struct HandSnapshot {
    pub t: u64,
    pub stage: Stage,
    pub pot_size: f64,
    pub board_cards: Vec<Card>,
    pub active_players: u8,
    pub hero_cards: Vec<Card>,
    pub hero_seat: Option<u8>,
    pub seats: Vec<Seat>,
}

impl HandSnapshot {
    pub fn seat(&self, seat_number: u8) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == seat_number)
    }
}
