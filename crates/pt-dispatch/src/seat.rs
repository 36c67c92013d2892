use pt_core::Card;

/// One seat at the table. Seat numbers are stable within a session;
/// `player_name` may transition as players sit down or stand up.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Seat {
    pub seat_number: u8,
    pub player_name: Option<String>,
    pub stack: f64,
    pub current_bet: f64,
    pub position: Option<String>,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub is_hero: bool,
    pub is_active: bool,
    pub is_active_turn: bool,
    pub hole_cards: Vec<Card>,
    pub status_text: Option<String>,
    pub vpip: Option<f32>,
    pub af: Option<f32>,
    pub time_bank: Option<f32>,
}

impl Seat {
    pub fn new(seat_number: u8) -> Self {
        Self {
            seat_number,
            player_name: None,
            stack: 0.0,
            current_bet: 0.0,
            position: None,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            is_hero: false,
            is_active: false,
            is_active_turn: false,
            hole_cards: Vec::new(),
            status_text: None,
            vpip: None,
            af: None,
            time_bank: None,
        }
    }
}

/// Fields a single observation frame may update on a seat; `None` leaves the
/// existing value untouched.
#[derive(Debug, Clone, Default)]
pub struct SeatUpdate {
    pub stack: Option<f64>,
    pub current_bet: Option<f64>,
    pub player_name: Option<Option<String>>,
    pub position: Option<Option<String>>,
    pub is_dealer: Option<bool>,
    pub is_small_blind: Option<bool>,
    pub is_big_blind: Option<bool>,
    pub is_hero: Option<bool>,
    pub is_active: Option<bool>,
    pub is_active_turn: Option<bool>,
    pub hole_cards: Option<Vec<Card>>,
    pub status_text: Option<Option<String>>,
}
