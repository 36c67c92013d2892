use pt_core::{Card, Confidence, Stage};

use crate::seat::Seat;

/// Where a served `TableState` actually came from this tick.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataSource {
    Live,
    LiveCached,
    Cached { reason: String },
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live => write!(f, "live"),
            DataSource::LiveCached => write!(f, "live_cached"),
            DataSource::Cached { reason } => write!(f, "cached ({reason})"),
        }
    }
}

/// Authoritative snapshot of one table at time t.
///
/// Exclusively owned and mutated by [`crate::StateDispatcher`]; every other
/// consumer sees only immutable copies from [`crate::StateDispatcher::get_state`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TableState {
    pub site: String,
    pub table_id: String,
    pub stage: Stage,
    pub board_cards: Vec<Card>,
    pub hero_cards: Vec<Card>,
    pub hero_seat: Option<u8>,
    pub pot_size: f64,
    pub side_pots: Vec<f64>,
    pub small_blind: f64,
    pub big_blind: f64,
    pub ante: f64,
    pub dealer_seat: Option<u8>,
    pub active_turn_seat: Option<u8>,
    pub seats: Vec<Seat>,
    pub active_players: u8,
    pub detection_confidence: Confidence,
    pub tournament_name: Option<String>,
    pub extraction_method: String,
    pub extraction_time_ms: u32,
    pub data_source: DataSource,
    pub data_age_seconds: f64,
}

impl TableState {
    pub fn new(site: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            table_id: table_id.into(),
            stage: Stage::Preflop,
            board_cards: Vec::new(),
            hero_cards: Vec::new(),
            hero_seat: None,
            pot_size: 0.0,
            side_pots: Vec::new(),
            small_blind: 0.0,
            big_blind: 0.0,
            ante: 0.0,
            dealer_seat: None,
            active_turn_seat: None,
            seats: Vec::new(),
            active_players: 0,
            detection_confidence: Confidence::MIN,
            tournament_name: None,
            extraction_method: String::new(),
            extraction_time_ms: 0,
            data_source: DataSource::Live,
            data_age_seconds: 0.0,
        }
    }

    pub fn seat_mut(&mut self, seat_number: u8) -> &mut Seat {
        if let Some(idx) = self.seats.iter().position(|s| s.seat_number == seat_number) {
            &mut self.seats[idx]
        } else {
            self.seats.push(Seat::new(seat_number));
            self.seats.last_mut().expect("just pushed")
        }
    }

    pub fn seat(&self, seat_number: u8) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == seat_number)
    }
}
